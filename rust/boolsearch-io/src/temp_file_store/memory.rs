use std::{
    io::{self, Cursor, Read, Write},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::temp_file_store::{TemporaryFileStore, TemporaryWritable};

/// Byte budget shared by all buffers allocated from one in-memory store.
struct Budget {
    capacity: u64,
    used: AtomicU64,
}

impl Budget {
    fn allocate(&self, amount: u64) -> io::Result<()> {
        let mut current = self.used.load(Ordering::Relaxed);
        loop {
            let next = current.saturating_add(amount);
            if next > self.capacity {
                return Err(io::Error::new(
                    io::ErrorKind::OutOfMemory,
                    format!(
                        "temporary store budget exceeded: {next} > {}",
                        self.capacity
                    ),
                ));
            }
            match self.used.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self, amount: u64) {
        self.used.fetch_sub(amount, Ordering::AcqRel);
    }
}

/// Keeps temporary streams in process memory, bounded by a fixed capacity.
/// Mostly useful for tests and for small builds.
pub struct InMemoryTempFileStore {
    budget: Arc<Budget>,
}

impl InMemoryTempFileStore {
    pub fn new(capacity: u64) -> InMemoryTempFileStore {
        InMemoryTempFileStore {
            budget: Arc::new(Budget {
                capacity,
                used: AtomicU64::new(0),
            }),
        }
    }

    pub fn available_space(&self) -> u64 {
        self.budget.capacity - self.budget.used.load(Ordering::Relaxed)
    }
}

impl TemporaryFileStore for InMemoryTempFileStore {
    fn allocate_writable(
        &self,
        size_hint: Option<usize>,
    ) -> io::Result<Box<dyn TemporaryWritable>> {
        Ok(Box::new(MemoryTempBuffer {
            budget: self.budget.clone(),
            data: Vec::with_capacity(size_hint.unwrap_or(0)),
        }))
    }
}

struct MemoryTempBuffer {
    budget: Arc<Budget>,
    data: Vec<u8>,
}

impl Write for MemoryTempBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.budget.allocate(buf.len() as u64)?;
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TemporaryWritable for MemoryTempBuffer {
    fn current_size(&self) -> u64 {
        self.data.len() as u64
    }

    fn into_reader(mut self: Box<Self>) -> io::Result<Box<dyn Read + Send>> {
        let data = std::mem::take(&mut self.data);
        Ok(Box::new(MemoryTempReader {
            budget: self.budget.clone(),
            size: data.len() as u64,
            cursor: Cursor::new(data),
        }))
    }
}

impl Drop for MemoryTempBuffer {
    fn drop(&mut self) {
        self.budget.release(self.data.len() as u64);
    }
}

struct MemoryTempReader {
    budget: Arc<Budget>,
    size: u64,
    cursor: Cursor<Vec<u8>>,
}

impl Read for MemoryTempReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Drop for MemoryTempReader {
    fn drop(&mut self) {
        self.budget.release(self.size);
    }
}

//! Scratch storage for intermediate build artifacts.
//!
//! The external sort stage spills each sorted run into a temporary writable
//! obtained from a `TemporaryFileStore`, and later converts it into a
//! sequential reader for the merge. The storage is released when the reader
//! is dropped.

use std::path::Path;
use std::sync::Arc;

pub mod file_based;
pub mod memory;

/// The `TemporaryFileStore` trait provides temporary file-like objects
/// to consumers while managing the overall temporary storage budget.
pub trait TemporaryFileStore: Send + Sync + 'static {
    /// Allocates a temporary write-only stream that can be appended to
    /// and later converted into a reader.
    ///
    /// # Arguments
    ///
    /// * `size_hint` - An optional hint for the expected size of the stream.
    fn allocate_writable(
        &self,
        size_hint: Option<usize>,
    ) -> std::io::Result<Box<dyn TemporaryWritable>>;
}

/// A temporary write-only stream that can be appended to and converted into a reader.
pub trait TemporaryWritable: std::io::Write + Send + Sync + 'static {
    /// Returns the current size (i.e., the end position) of the stream.
    fn current_size(&self) -> u64;

    /// Converts the stream into `std::io::Read` positioned at the start.
    /// The allocated storage will be released when this reader is dropped.
    fn into_reader(self: Box<Self>) -> std::io::Result<Box<dyn std::io::Read + Send>>;
}

pub fn create_in_memory(capacity: u64) -> std::io::Result<Arc<dyn TemporaryFileStore>> {
    Ok(Arc::new(memory::InMemoryTempFileStore::new(capacity)))
}

pub fn create_file_based(
    parent_path: Option<&Path>,
) -> std::io::Result<Arc<dyn TemporaryFileStore>> {
    Ok(Arc::new(file_based::LocalTempFileStore::new(parent_path)?))
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    fn write_and_read_back(store: &dyn TemporaryFileStore) {
        let mut payloads = Vec::new();
        let mut writers = Vec::new();
        for i in 0..4 {
            let len = fastrand::usize(1..20_000);
            let payload: Vec<u8> = (0..len).map(|_| fastrand::u8(..)).collect();
            let mut writer = store.allocate_writable(Some(len)).unwrap();
            for chunk in payload.chunks(1000 + i) {
                writer.write_all(chunk).unwrap();
            }
            assert_eq!(writer.current_size(), len as u64);
            payloads.push(payload);
            writers.push(writer);
        }

        for (writer, payload) in writers.into_iter().zip(payloads) {
            let mut reader = writer.into_reader().unwrap();
            let mut contents = Vec::new();
            reader.read_to_end(&mut contents).unwrap();
            assert_eq!(contents, payload);
        }
    }

    #[test]
    fn test_file_based_store() {
        let parent = tempfile::tempdir().unwrap();
        let store = create_file_based(Some(parent.path())).unwrap();
        write_and_read_back(store.as_ref());
    }

    #[test]
    fn test_in_memory_store() {
        let store = create_in_memory(1024 * 1024).unwrap();
        write_and_read_back(store.as_ref());
    }

    #[test]
    fn test_in_memory_store_capacity() {
        let store = create_in_memory(100).unwrap();
        let mut writer = store.allocate_writable(None).unwrap();
        writer.write_all(&[0u8; 60]).unwrap();
        let mut other = store.allocate_writable(None).unwrap();
        assert!(other.write_all(&[0u8; 60]).is_err());

        // Dropping the reader returns its bytes to the budget.
        drop(writer.into_reader().unwrap());
        other.write_all(&[0u8; 60]).unwrap();
    }
}

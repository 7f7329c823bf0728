use std::{
    fs::File,
    io::{self, BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
    sync::Arc,
};

use crate::temp_file_store::{TemporaryFileStore, TemporaryWritable};

/// Owns the scratch directory; every temporary file keeps a reference so the
/// directory outlives all readers handed out by the store.
pub struct LocalTempContainer {
    container: tempfile::TempDir,
}

impl LocalTempContainer {
    pub fn new(parent_path: Option<&Path>) -> io::Result<LocalTempContainer> {
        let container = if let Some(parent) = parent_path {
            tempfile::tempdir_in(parent)?
        } else {
            tempfile::tempdir()?
        };
        Ok(LocalTempContainer { container })
    }

    pub fn path(&self) -> &Path {
        self.container.path()
    }
}

#[derive(Clone)]
pub struct LocalTempFileStore(Arc<LocalTempContainer>);

impl LocalTempFileStore {
    pub fn new(parent_path: Option<&Path>) -> io::Result<LocalTempFileStore> {
        let container = LocalTempContainer::new(parent_path)?;
        Ok(LocalTempFileStore(Arc::new(container)))
    }

    pub fn path(&self) -> &Path {
        self.0.path()
    }
}

impl TemporaryFileStore for LocalTempFileStore {
    fn allocate_writable(
        &self,
        size_hint: Option<usize>,
    ) -> io::Result<Box<dyn TemporaryWritable>> {
        // Unnamed file: removed by the OS as soon as the last handle closes.
        let file = tempfile::tempfile_in(self.path())?;
        let capacity = size_hint.unwrap_or(0).clamp(8 * 1024, 1024 * 1024);
        Ok(Box::new(LocalTempFileWriter {
            _container: self.0.clone(),
            writer: BufWriter::with_capacity(capacity, file),
            size: 0,
        }))
    }
}

struct LocalTempFileWriter {
    _container: Arc<LocalTempContainer>,
    writer: BufWriter<File>,
    size: u64,
}

impl Write for LocalTempFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl TemporaryWritable for LocalTempFileWriter {
    fn current_size(&self) -> u64 {
        self.size
    }

    fn into_reader(self: Box<Self>) -> io::Result<Box<dyn Read + Send>> {
        let LocalTempFileWriter {
            _container, writer, ..
        } = *self;
        let mut file = writer.into_inner().map_err(|e| e.into_error())?;
        file.seek(SeekFrom::Start(0))?;
        Ok(Box::new(LocalTempFileReader {
            _container,
            file,
        }))
    }
}

struct LocalTempFileReader {
    _container: Arc<LocalTempContainer>,
    file: File,
}

impl Read for LocalTempFileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

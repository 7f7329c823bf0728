use std::{
    fs::File,
    ops::Range,
    path::Path,
    sync::{Arc, OnceLock},
};

use crate::ReadAt;

/// Positional reader over a local file.
///
/// The file size is fetched lazily and cached: the files served by this
/// reader (postings blobs, spilled runs) are immutable once written.
pub struct FileReader {
    file: Arc<File>,
    size: OnceLock<u64>,
}

impl FileReader {
    pub fn new(file: impl Into<Arc<File>>) -> FileReader {
        FileReader {
            file: file.into(),
            size: Default::default(),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<FileReader> {
        Ok(FileReader::new(File::open(path)?))
    }
}

impl FileReader {
    fn get_size(&self) -> std::io::Result<u64> {
        if let Some(&size) = self.size.get() {
            Ok(size)
        } else {
            let size = self.file.metadata()?.len();
            let _ = self.size.set(size);
            Ok(size)
        }
    }

    fn adjust_read_range(&self, range: Range<u64>) -> std::io::Result<Range<u64>> {
        let size = self.get_size()?;
        if range.start >= size || range.start == range.end {
            return Ok(0..0);
        }
        let range = range.start..std::cmp::min(range.end, size);
        Ok(range)
    }
}

impl ReadAt for FileReader {
    fn size(&self) -> std::io::Result<u64> {
        self.get_size()
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        crate::utils::verify_range(&range)?;
        let range = self.adjust_read_range(range)?;
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; (range.end - range.start) as usize];
        file_read_at_exact(&self.file, range.start, &mut buf)?;
        Ok(buf)
    }
}

#[cfg(unix)]
pub fn file_read_at_exact(file: &File, pos: u64, buf: &mut [u8]) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;

    file.read_exact_at(buf, pos)?;
    Ok(())
}

#[cfg(windows)]
pub fn file_read_at_exact(file: &File, mut pos: u64, mut buf: &mut [u8]) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        match file.seek_read(buf, pos) {
            Ok(0) => break,
            Ok(n) => {
                buf = &mut buf[n..];
                pos += n as u64;
            }
            Err(e) => return Err(e),
        }
    }
    if !buf.is_empty() {
        return Err(std::io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::{ReadAt, file::FileReader};

    #[test]
    fn test_file_reader_ranges() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("postings.bin");
        let mut file = std::fs::File::create(&path).expect("create file");
        for _ in 0..10 {
            file.write_all(b"abcdefgh").expect("write_all");
        }
        drop(file);

        let reader = FileReader::open(&path).expect("open file");
        assert_eq!(reader.size().unwrap(), 80);
        for pos in (0..80).step_by(8) {
            let buf = reader.read_at(pos..pos + 4).expect("read_at");
            assert_eq!(buf.as_slice(), b"abcd");
        }

        // Reads past the end are clipped rather than failing.
        assert_eq!(reader.read_at(76..90).unwrap().as_slice(), b"efgh");
        assert!(reader.read_at(100..120).unwrap().is_empty());
        assert!(reader.read_at(10..10).unwrap().is_empty());
    }
}

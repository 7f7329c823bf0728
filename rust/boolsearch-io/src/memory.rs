use std::ops::Range;

use crate::ReadAt;

impl<T> ReadAt for T
where
    T: details::SliceBytes + Send + Sync + 'static,
{
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        crate::utils::verify_range(&range)?;
        let pos = range.start as usize;
        let len = (range.end - range.start) as usize;
        let content_len = self.len();
        if pos > content_len {
            return Ok(Vec::new());
        }
        let len = std::cmp::min(len, content_len - pos);
        Ok(self.bytes()[pos..pos + len].to_vec())
    }
}

mod details {
    use std::sync::Arc;

    pub trait SliceBytes {
        fn len(&self) -> usize;
        fn bytes(&self) -> &[u8];
    }

    impl SliceBytes for Vec<u8> {
        fn len(&self) -> usize {
            Vec::len(self)
        }

        fn bytes(&self) -> &[u8] {
            self.as_slice()
        }
    }

    impl SliceBytes for Arc<[u8]> {
        fn len(&self) -> usize {
            <[u8]>::len(self)
        }

        fn bytes(&self) -> &[u8] {
            self
        }
    }
}

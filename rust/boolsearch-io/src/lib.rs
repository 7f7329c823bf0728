//! I/O abstractions shared by the index builder and the query path:
//! - `ReadAt`: positional reader fetching a byte range from a file or buffer,
//!   safe to share between concurrent queries.
//! - `TemporaryFileStore`: scratch storage for the sorted runs spilled by the
//!   external sort stage.
//!
//! Provides a couple of simple implementations: memory-based and file-based.

use std::ops::Range;

pub mod file;
pub mod memory;
pub mod temp_file_store;
pub mod utils;

pub use file::FileReader;
pub use temp_file_store::{TemporaryFileStore, TemporaryWritable};

/// A trait representing a conceptual file or buffer that supports reading from arbitrary
/// positions.
///
/// Reads never move a shared cursor, so a single reader may serve any number of
/// threads at once.
pub trait ReadAt: Send + Sync + 'static {
    /// Returns the size of the underlying object.
    fn size(&self) -> std::io::Result<u64>;

    /// Reads a specified range of bytes from the object.
    ///
    /// **NOTE**: `read_at` should not return with a short read, unless end-of-file
    /// is encountered. Callers that require the full range must compare the
    /// returned length against the request.
    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>>;
}

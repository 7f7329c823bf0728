//! Posting list encodings.
//!
//! A posting list is a strictly increasing sequence of document ids. The
//! canonical encoding stores the first id followed by the gaps between
//! consecutive ids, each as a little-endian base-128 varint (seven payload
//! bits per byte, low group first, high bit set when another byte follows).
//! The alternative `fixed-u32` encoding stores every id as four
//! little-endian bytes.
//!
//! Decoding validates everything it reads: truncated or oversized varints,
//! non-increasing ids, ids outside the document universe and a count that
//! disagrees with the dictionary are all reported as index corruption.

use std::fmt;

use boolsearch_common::{Result, error::Error, try_or_ret_some_err, verify_data};
use serde::{Deserialize, Serialize};

/// Maximum encoded length of a `u32` varint.
pub const MAX_VARINT_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostingsEncoding {
    #[default]
    DeltaVarint,
    FixedU32,
}

impl PostingsEncoding {
    pub const fn name(&self) -> &'static str {
        match self {
            PostingsEncoding::DeltaVarint => "delta-varint",
            PostingsEncoding::FixedU32 => "fixed-u32",
        }
    }
}

impl fmt::Display for PostingsEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<&str> for PostingsEncoding {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        match name {
            "delta-varint" => Ok(PostingsEncoding::DeltaVarint),
            "fixed-u32" => Ok(PostingsEncoding::FixedU32),
            _ => Err(Error::invalid_arg(
                "encoding",
                format!("Unrecognized postings encoding: {name}"),
            )),
        }
    }
}

/// Appends the varint encoding of `value` to `out`.
pub fn encode_varint(mut value: u32, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Decodes one varint starting at `*pos` and advances `*pos` past it.
pub fn decode_varint(bytes: &[u8], pos: &mut usize) -> Result<u32> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        let Some(&byte) = bytes.get(*pos + i) else {
            return Err(Error::index_corruption(
                "postings",
                format!("truncated varint at byte {}", *pos + i),
            ));
        };
        value |= ((byte & 0x7f) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            if value > u32::MAX as u64 {
                return Err(Error::index_corruption(
                    "postings",
                    format!("varint at byte {} overflows u32", *pos),
                ));
            }
            *pos += i + 1;
            return Ok(value as u32);
        }
    }
    Err(Error::index_corruption(
        "postings",
        format!("varint at byte {} is longer than {MAX_VARINT_LEN} bytes", *pos),
    ))
}

/// Appends the encoding of a strictly increasing id list to `out`.
pub fn encode_postings(encoding: PostingsEncoding, ids: &[u32], out: &mut Vec<u8>) {
    debug_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    match encoding {
        PostingsEncoding::DeltaVarint => {
            let mut prev = 0;
            for (i, &id) in ids.iter().enumerate() {
                let gap = if i == 0 { id } else { id - prev };
                encode_varint(gap, out);
                prev = id;
            }
        }
        PostingsEncoding::FixedU32 => {
            out.reserve(ids.len() * 4);
            for &id in ids {
                out.extend_from_slice(&id.to_le_bytes());
            }
        }
    }
}

/// Streaming decoder over one encoded posting list.
///
/// Yields `Err` once on the first inconsistency and then stops.
pub struct PostingIter<'a> {
    encoding: PostingsEncoding,
    bytes: &'a [u8],
    pos: usize,
    remaining: usize,
    prev: Option<u32>,
    n_docs: u32,
    failed: bool,
}

impl<'a> PostingIter<'a> {
    /// Creates a decoder expecting exactly `count` ids, each below `n_docs`.
    pub fn new(
        encoding: PostingsEncoding,
        bytes: &'a [u8],
        count: usize,
        n_docs: u32,
    ) -> PostingIter<'a> {
        PostingIter {
            encoding,
            bytes,
            pos: 0,
            remaining: count,
            prev: None,
            n_docs,
            failed: false,
        }
    }

    fn read_id(&mut self) -> Result<u32> {
        match self.encoding {
            PostingsEncoding::DeltaVarint => {
                let gap = decode_varint(self.bytes, &mut self.pos)?;
                match self.prev {
                    None => Ok(gap),
                    Some(_) if gap == 0 => Err(Error::index_corruption(
                        "postings",
                        "repeated document id in posting list",
                    )),
                    Some(prev) => prev.checked_add(gap).ok_or_else(|| {
                        Error::index_corruption("postings", "document id overflows u32")
                    }),
                }
            }
            PostingsEncoding::FixedU32 => {
                let end = self.pos + 4;
                let chunk = self.bytes.get(self.pos..end).ok_or_else(|| {
                    Error::index_corruption(
                        "postings",
                        format!("truncated fixed-width id at byte {}", self.pos),
                    )
                })?;
                self.pos = end;
                let id = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                match self.prev {
                    Some(prev) if id <= prev => Err(Error::index_corruption(
                        "postings",
                        format!("document ids not increasing: {id} after {prev}"),
                    )),
                    _ => Ok(id),
                }
            }
        }
    }

    fn check_exhausted(&self) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(Error::index_corruption(
                "postings",
                format!(
                    "posting list holds more data than its document frequency \
                     ({} of {} bytes consumed)",
                    self.pos,
                    self.bytes.len()
                ),
            ));
        }
        Ok(())
    }
}

impl Iterator for PostingIter<'_> {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.remaining == 0 {
            self.failed = true;
            try_or_ret_some_err!(self.check_exhausted());
            return None;
        }
        self.failed = true;
        let id = try_or_ret_some_err!(self.read_id());
        if id >= self.n_docs {
            return Some(Err(Error::index_corruption(
                "postings",
                format!("document id {id} outside of [0, {})", self.n_docs),
            )));
        }
        self.failed = false;
        self.prev = Some(id);
        self.remaining -= 1;
        Some(Ok(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining + 1))
    }
}

/// Decodes a complete posting list, validating it against the dictionary's
/// document frequency and the size of the document universe.
pub fn decode_postings(
    encoding: PostingsEncoding,
    bytes: &[u8],
    expected_count: usize,
    n_docs: u32,
) -> Result<Vec<u32>> {
    let max_ids = match encoding {
        PostingsEncoding::DeltaVarint => bytes.len(),
        PostingsEncoding::FixedU32 => bytes.len() / 4,
    };
    if expected_count > max_ids {
        return Err(Error::index_corruption(
            "postings",
            format!(
                "document frequency {expected_count} does not fit a {}-byte posting list",
                bytes.len()
            ),
        ));
    }
    verify_data!(postings, expected_count <= n_docs as usize);

    let mut ids = Vec::with_capacity(expected_count);
    for id in PostingIter::new(encoding, bytes, expected_count, n_docs) {
        ids.push(id?);
    }
    if ids.len() != expected_count {
        return Err(Error::index_corruption(
            "postings",
            format!(
                "decoded {} ids, dictionary says {expected_count}",
                ids.len()
            ),
        ));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use boolsearch_common::error::ErrorKind;

    use super::*;

    fn is_corruption(result: Result<Vec<u32>>) -> bool {
        matches!(
            result.map_err(|e| e.into_kind()),
            Err(ErrorKind::IndexCorruption { .. })
        )
    }

    #[test]
    fn test_varint_layout() {
        let mut buf = Vec::new();
        encode_varint(0, &mut buf);
        encode_varint(127, &mut buf);
        encode_varint(300, &mut buf);
        encode_varint(u32::MAX, &mut buf);
        assert_eq!(
            buf,
            vec![0x00, 0x7f, 0xac, 0x02, 0xff, 0xff, 0xff, 0xff, 0x0f]
        );

        let mut pos = 0;
        assert_eq!(decode_varint(&buf, &mut pos).unwrap(), 0);
        assert_eq!(decode_varint(&buf, &mut pos).unwrap(), 127);
        assert_eq!(decode_varint(&buf, &mut pos).unwrap(), 300);
        assert_eq!(decode_varint(&buf, &mut pos).unwrap(), u32::MAX);
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn test_delta_postings() {
        let mut buf = Vec::new();
        encode_postings(PostingsEncoding::DeltaVarint, &[3, 5, 305], &mut buf);
        assert_eq!(buf, vec![0x03, 0x02, 0xac, 0x02]);
        assert_eq!(
            decode_postings(PostingsEncoding::DeltaVarint, &buf, 3, 1000).unwrap(),
            vec![3, 5, 305]
        );

        let mut single = Vec::new();
        encode_postings(PostingsEncoding::DeltaVarint, &[42], &mut single);
        assert_eq!(
            decode_postings(PostingsEncoding::DeltaVarint, &single, 1, 43).unwrap(),
            vec![42]
        );
    }

    #[test]
    fn test_fixed_postings() {
        let mut buf = Vec::new();
        encode_postings(PostingsEncoding::FixedU32, &[1, 256], &mut buf);
        assert_eq!(buf, vec![1, 0, 0, 0, 0, 1, 0, 0]);
        assert_eq!(
            decode_postings(PostingsEncoding::FixedU32, &buf, 2, 300).unwrap(),
            vec![1, 256]
        );
    }

    #[test]
    fn test_random_lists() {
        for _ in 0..200 {
            let n_docs = fastrand::u32(1..5000);
            let mut ids: Vec<u32> = (0..fastrand::usize(1..200))
                .map(|_| fastrand::u32(0..n_docs))
                .collect();
            ids.sort_unstable();
            ids.dedup();
            for encoding in [PostingsEncoding::DeltaVarint, PostingsEncoding::FixedU32] {
                let mut buf = Vec::new();
                encode_postings(encoding, &ids, &mut buf);
                let decoded = decode_postings(encoding, &buf, ids.len(), n_docs).unwrap();
                assert_eq!(decoded, ids);
            }
        }
    }

    #[test]
    fn test_corrupt_postings() {
        let enc = PostingsEncoding::DeltaVarint;
        // Truncated varint.
        assert!(is_corruption(decode_postings(enc, &[0x80], 1, 10)));
        // Six continuation bytes.
        assert!(is_corruption(decode_postings(
            enc,
            &[0x81, 0x81, 0x81, 0x81, 0x81, 0x01],
            1,
            u32::MAX
        )));
        // Fewer ids than the document frequency.
        assert!(is_corruption(decode_postings(enc, &[1, 1], 3, 10)));
        // Trailing bytes beyond the document frequency.
        assert!(is_corruption(decode_postings(enc, &[1, 1, 1], 2, 10)));
        // Zero gap after the first id.
        assert!(is_corruption(decode_postings(enc, &[1, 0], 2, 10)));
        // Id outside the universe.
        assert!(is_corruption(decode_postings(enc, &[1, 9], 2, 10)));

        let fixed = PostingsEncoding::FixedU32;
        assert!(is_corruption(decode_postings(fixed, &[1, 0, 0], 1, 10)));
        assert!(is_corruption(decode_postings(
            fixed,
            &[2, 0, 0, 0, 2, 0, 0, 0],
            2,
            10
        )));
    }

    #[test]
    fn test_oversized_document_frequency() {
        let mut buf = Vec::new();
        encode_postings(PostingsEncoding::DeltaVarint, &[0, 4], &mut buf);
        let huge = u32::MAX as usize;
        assert!(is_corruption(decode_postings(
            PostingsEncoding::DeltaVarint,
            &buf,
            huge,
            u32::MAX
        )));
        // More ids than the document universe holds.
        assert!(is_corruption(decode_postings(
            PostingsEncoding::DeltaVarint,
            &[0, 1, 1, 1],
            4,
            3
        )));

        let mut fixed = Vec::new();
        encode_postings(PostingsEncoding::FixedU32, &[0, 4], &mut fixed);
        assert!(is_corruption(decode_postings(
            PostingsEncoding::FixedU32,
            &fixed,
            3,
            10
        )));
        assert!(is_corruption(decode_postings(
            PostingsEncoding::FixedU32,
            &fixed,
            huge,
            u32::MAX
        )));
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!(
            PostingsEncoding::try_from("fixed-u32").unwrap(),
            PostingsEncoding::FixedU32
        );
        assert_eq!(PostingsEncoding::default().name(), "delta-varint");
        assert!(PostingsEncoding::try_from("gamma").is_err());
        assert_eq!(
            serde_json::to_string(&PostingsEncoding::FixedU32).unwrap(),
            "\"fixed-u32\""
        );
    }
}

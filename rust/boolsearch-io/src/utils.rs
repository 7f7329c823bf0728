use std::ops::Range;

/// Rejects a read range whose end precedes its start.
pub fn verify_range(range: &Range<u64>) -> std::io::Result<()> {
    if range.end >= range.start {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid read range {}..{}", range.start, range.end),
        ))
    }
}

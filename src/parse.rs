//! Byte-level parsing of `key;value` lines.

use memchr::memchr;

use crate::error::{Result, SolveError};
use crate::record::RecordTable;

pub const FIELD_SEPARATOR: u8 = b';';
pub const LINE_TERMINATOR: u8 = b'\n';

/// Parse every line of `chunk` into `table`.
///
/// `chunk` must start at a record boundary. Its last line may lack a
/// terminator; that only happens for the final record of the file.
/// `base_offset` is the chunk's position in the file and is only used to
/// locate errors.
pub fn parse_chunk(chunk: &[u8], base_offset: u64, table: &mut RecordTable) -> Result<()> {
    let mut start = 0;
    while start < chunk.len() {
        let end = match memchr(LINE_TERMINATOR, &chunk[start..]) {
            Some(pos) => start + pos,
            None => chunk.len(),
        };
        let line = &chunk[start..end];
        let (key, value) = parse_line(line, base_offset + start as u64)?;
        table.process(key, value);
        start = end + 1;
    }
    Ok(())
}

/// Split one line (without terminator) into its key and value.
pub fn parse_line(line: &[u8], offset: u64) -> Result<(&[u8], f64)> {
    let malformed = |reason| SolveError::MalformedRecord {
        offset,
        line: String::from_utf8_lossy(line).into_owned(),
        reason,
    };
    let separator = memchr(FIELD_SEPARATOR, line).ok_or_else(|| malformed("missing separator"))?;
    let key = &line[..separator];
    let value = parse_value(&line[separator + 1..]).ok_or_else(|| malformed("invalid value"))?;
    Ok((key, value))
}

/// Parse a finite decimal number, e.g. `12.3`, `-0.5` or `7`.
pub fn parse_value(bytes: &[u8]) -> Option<f64> {
    // lexical accepts spellings of NaN and infinity; those are not measurements.
    match lexical_core::parse::<f64>(bytes) {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}

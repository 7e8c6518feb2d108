//! Bounds-checked little-endian reads over the raw byte stream.
//!
//! Every value the scanner looks at (length fields, identifiers, auxiliary
//! values) is a 4-byte little-endian unsigned integer. Records are two of
//! them back to back, identifier first.

use crate::error::{Error, Result};
use bytes::Buf;

/// Width of a single little-endian field in bytes
pub const FIELD_SIZE: usize = 4;

/// Width of a record (identifier + auxiliary) in bytes
pub const RECORD_SIZE: usize = 2 * FIELD_SIZE;

/// One `(identifier, auxiliary)` pair read from the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record {
    /// Identifier validated against the domain
    pub identifier: u32,
    /// Value stored next to the identifier (a color id for brick graphs)
    pub auxiliary: u32,
}

impl Record {
    /// Creates a new record
    pub fn new(identifier: u32, auxiliary: u32) -> Self {
        Self {
            identifier,
            auxiliary,
        }
    }

    /// Returns the record as an `(identifier, auxiliary)` tuple
    pub fn as_pair(&self) -> (u32, u32) {
        (self.identifier, self.auxiliary)
    }
}

impl From<(u32, u32)> for Record {
    fn from((identifier, auxiliary): (u32, u32)) -> Self {
        Self::new(identifier, auxiliary)
    }
}

/// Read a little-endian `u32` starting at `start`.
///
/// Fails with [`Error::OutOfBounds`] when fewer than four bytes remain.
pub fn read_u32_le(data: &[u8], start: usize) -> Result<u32> {
    let mut field = start
        .checked_add(FIELD_SIZE)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| Error::out_of_bounds(start, FIELD_SIZE, data.len()))?;

    Ok(field.get_u32_le())
}

/// Read a full record starting at `start`.
pub fn read_record(data: &[u8], start: usize) -> Result<Record> {
    let identifier = read_u32_le(data, start)?;
    let auxiliary = read_u32_le(data, start + FIELD_SIZE)?;
    Ok(Record::new(identifier, auxiliary))
}

//! Error and Result types for merge operators.

use sample::{Direction, FormatError};
use std::io;
use thiserror::Error;

/// A convenience `Result` type for operator calls.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Hard failures of an operator. Exhaustion is not an error; it is reported
/// through [`Status::NoData`](crate::Status::NoData).
#[derive(Debug, Error)]
pub enum MergeError {
    /// The storage behind an input failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be encoded or decoded.
    #[error("record format error: {0}")]
    Format(#[from] FormatError),

    /// An input delivered a record whose declared size does not match the
    /// bytes it delivered.
    #[error("malformed record at offset {offset}: declares {declared} bytes, {available} available")]
    MalformedRecord {
        /// Byte offset of the record inside the refill.
        offset: usize,
        /// Size the record header declares.
        declared: usize,
        /// Bytes left in the refill from `offset`.
        available: usize,
    },

    /// Inputs of one merge disagree on scan direction.
    #[error("input {index} scans {found}, merge scans {expected}")]
    DirectionMismatch {
        /// Position of the offending input.
        index: usize,
        /// Direction of the first input.
        expected: Direction,
        /// Direction of the offending input.
        found: Direction,
    },

    /// An input reported more items than the buffer it was handed.
    #[error("input returned {returned} items for a buffer of {capacity}")]
    Overfill {
        /// Count the input reported.
        returned: usize,
        /// Size of the buffer it was given.
        capacity: usize,
    },

    /// The next record of an input is larger than the buffer it was handed,
    /// so it can never be delivered.
    #[error("record of {len} bytes does not fit a {capacity}-byte buffer")]
    RecordTooLarge {
        /// Length of the stuck record.
        len: usize,
        /// Size of the buffer it was offered.
        capacity: usize,
    },

    /// Any other failure reported by an input.
    #[error("input failed: {0}")]
    Input(String),
}

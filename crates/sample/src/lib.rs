//! # Sample - time-series record format
//!
//! Every operator in a query tree exchanges samples as self-describing binary
//! records. A record is a fixed header followed by a payload whose kind and
//! length the header declares, so a buffer can hold records of different
//! sizes back to back.
//!
//! ## Record layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ HEADER (24 bytes)                                            │
//! │                                                              │
//! │ timestamp (u64) | series_id (u64) | kind (u32) | size (u32)  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ PAYLOAD (size - 24 bytes)                                    │
//! │                                                              │
//! │ kind = FLOAT: value (f64), record is always 32 bytes         │
//! │ any other kind: opaque bytes                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. `size` is the length of the whole record,
//! header included, so a reader can skip a record without understanding its
//! payload.

mod format;

pub use format::{
    append_float, encode_blob, encode_float, records, FormatError, Payload, Records, Sample,
    SampleHeader, FLOAT_SAMPLE_BYTES, HEADER_BYTES, KIND_BLOB, KIND_FLOAT,
};

/// Opaque identifier of one time series.
pub type SeriesId = u64;

/// Point in time; only the ordering matters to the merge layer.
pub type Timestamp = u64;

/// Result alias for record encoding and decoding.
pub type Result<T> = std::result::Result<T, FormatError>;

/// Scan direction of an ordered stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Ascending primary key.
    #[default]
    Forward,
    /// Descending primary key.
    Backward,
}

impl Direction {
    #[must_use]
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Forward)
    }

    /// The opposite scan direction.
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

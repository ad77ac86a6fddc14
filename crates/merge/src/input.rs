//! Pull interfaces of the operators feeding a merge.
//!
//! Storage readers implement one of the two shapes; merge operators consume
//! them and themselves implement [`TupleOperator`], so operator trees nest.

use sample::{Direction, Timestamp};

use crate::Result;

/// Outcome of a successful `read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The call completed; more data may remain.
    Success,
    /// The operator is exhausted. Data returned by the same call is still
    /// valid.
    NoData,
}

/// Produces `(timestamp, value)` pairs of a single series, sorted by
/// timestamp in [`direction`](ScalarOperator::direction).
pub trait ScalarOperator {
    /// Scan direction. Queried once, when a merge is built.
    fn direction(&self) -> Direction;

    /// Fills the front of `timestamps` and `values` (up to the shorter of the
    /// two) and returns how many pairs were written.
    fn read(&mut self, timestamps: &mut [Timestamp], values: &mut [f64]) -> Result<(Status, usize)>;
}

/// Produces packed sample records (see the `sample` crate), sorted in
/// [`direction`](TupleOperator::direction). Several series may interleave.
pub trait TupleOperator {
    /// Scan direction. Queried once, when a merge is built.
    fn direction(&self) -> Direction;

    /// Writes whole records into the front of `dest` and returns how many
    /// bytes were written.
    fn read(&mut self, dest: &mut [u8]) -> Result<(Status, usize)>;
}

impl<T: ScalarOperator + ?Sized> ScalarOperator for Box<T> {
    fn direction(&self) -> Direction {
        (**self).direction()
    }

    fn read(&mut self, timestamps: &mut [Timestamp], values: &mut [f64]) -> Result<(Status, usize)> {
        (**self).read(timestamps, values)
    }
}

impl<T: TupleOperator + ?Sized> TupleOperator for Box<T> {
    fn direction(&self) -> Direction {
        (**self).direction()
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<(Status, usize)> {
        (**self).read(dest)
    }
}

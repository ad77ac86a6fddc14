//! Operators over data that is already materialized in memory.
//!
//! Handy as leaves of an operator tree when the samples were decoded
//! elsewhere, and as stand-ins for storage readers.

use sample::{Direction, Sample, SampleHeader, SeriesId, Timestamp};

use crate::{MergeError, Result, ScalarOperator, Status, TupleOperator};

/// Serves a sorted vector of `(timestamp, value)` pairs.
#[derive(Debug, Clone)]
pub struct MemScalarOperator {
    ts: Vec<Timestamp>,
    xs: Vec<f64>,
    pos: usize,
    direction: Direction,
    batch: usize,
}

impl MemScalarOperator {
    /// `points` must already be sorted by timestamp in `direction`.
    pub fn new<P>(points: P, direction: Direction) -> Self
    where
        P: IntoIterator<Item = (Timestamp, f64)>,
    {
        let (ts, xs): (Vec<_>, Vec<_>) = points.into_iter().unzip();
        debug_assert!(ts.windows(2).all(|w| match direction {
            Direction::Forward => w[0] <= w[1],
            Direction::Backward => w[0] >= w[1],
        }));
        Self {
            ts,
            xs,
            pos: 0,
            direction,
            batch: usize::MAX,
        }
    }

    /// Caps every `read` at `n` pairs (at least one).
    #[must_use]
    pub fn with_batch(mut self, n: usize) -> Self {
        self.batch = n.max(1);
        self
    }

    /// Pairs not yet returned.
    pub fn remaining(&self) -> usize {
        self.ts.len() - self.pos
    }
}

impl ScalarOperator for MemScalarOperator {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn read(&mut self, timestamps: &mut [Timestamp], values: &mut [f64]) -> Result<(Status, usize)> {
        let n = timestamps
            .len()
            .min(values.len())
            .min(self.batch)
            .min(self.remaining());
        let end = self.pos + n;
        timestamps[..n].copy_from_slice(&self.ts[self.pos..end]);
        values[..n].copy_from_slice(&self.xs[self.pos..end]);
        self.pos = end;
        let status = if self.remaining() == 0 {
            Status::NoData
        } else {
            Status::Success
        };
        Ok((status, n))
    }
}

/// Serves a buffer of packed records, never splitting a record across reads.
///
/// A read whose buffer cannot hold the next record fails with
/// [`MergeError::RecordTooLarge`].
#[derive(Debug, Clone)]
pub struct MemTupleOperator {
    bytes: Vec<u8>,
    pos: usize,
    direction: Direction,
}

impl MemTupleOperator {
    /// Wraps `bytes`, which must hold whole records sorted by
    /// `(timestamp, series id)` in `direction`.
    pub fn new(bytes: Vec<u8>, direction: Direction) -> Result<Self> {
        for record in sample::records(&bytes) {
            record?;
        }
        Ok(Self {
            bytes,
            pos: 0,
            direction,
        })
    }

    /// Encodes `samples` in the given order.
    pub fn from_samples<'a, S>(samples: S, direction: Direction) -> Result<Self>
    where
        S: IntoIterator<Item = &'a Sample>,
    {
        let mut bytes = Vec::new();
        for s in samples {
            s.encode(&mut bytes)?;
        }
        Self::new(bytes, direction)
    }

    /// Float records of a single series.
    pub fn from_points<P>(id: SeriesId, points: P, direction: Direction) -> Self
    where
        P: IntoIterator<Item = (Timestamp, f64)>,
    {
        let mut bytes = Vec::new();
        for (ts, value) in points {
            sample::append_float(&mut bytes, ts, id, value);
        }
        Self {
            bytes,
            pos: 0,
            direction,
        }
    }

    /// Bytes not yet returned.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

impl TupleOperator for MemTupleOperator {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<(Status, usize)> {
        let start = self.pos;
        let mut end = start;
        while end < self.bytes.len() {
            let len = SampleHeader::read(&self.bytes[end..]).record_len();
            if end + len - start > dest.len() {
                break;
            }
            end += len;
        }
        if end == start && start < self.bytes.len() {
            return Err(MergeError::RecordTooLarge {
                len: SampleHeader::read(&self.bytes[start..]).record_len(),
                capacity: dest.len(),
            });
        }
        let n = end - start;
        dest[..n].copy_from_slice(&self.bytes[start..end]);
        self.pos = end;
        let status = if self.remaining() == 0 {
            Status::NoData
        } else {
            Status::Success
        };
        Ok((status, n))
    }
}

use crate::*;
use sample::{Sample, FLOAT_SAMPLE_BYTES};
use std::cell::Cell;
use std::io;
use std::rc::Rc;

/// Helper: a forward scalar input over `(timestamp, value)` pairs.
pub fn scalar(points: &[(u64, f64)]) -> MemScalarOperator {
    MemScalarOperator::new(points.iter().copied(), Direction::Forward)
}

/// Helper: a scalar input whose values are `ts as f64`.
pub fn scalar_ts(ts: &[u64], direction: Direction) -> MemScalarOperator {
    MemScalarOperator::new(ts.iter().map(|&t| (t, t as f64)), direction)
}

/// Helper: buffer size holding exactly `n` float records.
pub fn records(n: usize) -> usize {
    n * FLOAT_SAMPLE_BYTES
}

/// Helper: decodes every record in `bytes`.
pub fn decode(bytes: &[u8]) -> Vec<Sample> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (s, len) = Sample::decode(&bytes[pos..]).unwrap();
        out.push(s);
        pos += len;
    }
    out
}

/// Helper: `(timestamp, series id)` of every record in `bytes`.
pub fn keys(bytes: &[u8]) -> Vec<(u64, u64)> {
    decode(bytes)
        .iter()
        .map(|s| (s.timestamp, s.series_id))
        .collect()
}

/// Helper: reads `op` with a `cap`-byte buffer until `NoData`, returning the
/// concatenated output and the per-call results.
pub fn drain<T: TupleOperator>(op: &mut T, cap: usize) -> Result<(Vec<u8>, Vec<(Status, usize)>)> {
    let mut out = Vec::new();
    let mut calls = Vec::new();
    let mut buf = vec![0u8; cap];
    loop {
        let (status, n) = op.read(&mut buf)?;
        out.extend_from_slice(&buf[..n]);
        calls.push((status, n));
        if status == Status::NoData {
            return Ok((out, calls));
        }
        assert!(calls.len() < 100_000, "merge made no progress");
    }
}

/// Counts `read` calls on the wrapped input.
pub struct Counting<I> {
    pub inner: I,
    pub reads: Rc<Cell<usize>>,
}

impl<I> Counting<I> {
    pub fn new(inner: I) -> (Self, Rc<Cell<usize>>) {
        let reads = Rc::new(Cell::new(0));
        (
            Self {
                inner,
                reads: Rc::clone(&reads),
            },
            reads,
        )
    }
}

impl<I: ScalarOperator> ScalarOperator for Counting<I> {
    fn direction(&self) -> Direction {
        self.inner.direction()
    }

    fn read(&mut self, ts: &mut [u64], xs: &mut [f64]) -> Result<(Status, usize)> {
        self.reads.set(self.reads.get() + 1);
        self.inner.read(ts, xs)
    }
}

impl<I: TupleOperator> TupleOperator for Counting<I> {
    fn direction(&self) -> Direction {
        self.inner.direction()
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<(Status, usize)> {
        self.reads.set(self.reads.get() + 1);
        self.inner.read(dest)
    }
}

/// Fails the given (1-based) `read` calls with an I/O error and passes the
/// others through.
pub struct Faulty<I> {
    pub inner: I,
    pub reads: usize,
    pub fail: fn(usize) -> bool,
}

impl<I> Faulty<I> {
    pub fn new(inner: I, fail: fn(usize) -> bool) -> Self {
        Self {
            inner,
            reads: 0,
            fail,
        }
    }

    fn check(&mut self) -> Result<()> {
        self.reads += 1;
        if (self.fail)(self.reads) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk on fire").into());
        }
        Ok(())
    }
}

impl<I: ScalarOperator> ScalarOperator for Faulty<I> {
    fn direction(&self) -> Direction {
        self.inner.direction()
    }

    fn read(&mut self, ts: &mut [u64], xs: &mut [f64]) -> Result<(Status, usize)> {
        self.check()?;
        self.inner.read(ts, xs)
    }
}

impl<I: TupleOperator> TupleOperator for Faulty<I> {
    fn direction(&self) -> Direction {
        self.inner.direction()
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<(Status, usize)> {
        self.check()?;
        self.inner.read(dest)
    }
}

/// Tuple input that hands out fixed byte chunks as-is, valid or not.
pub struct RawChunks {
    pub chunks: Vec<(Status, Vec<u8>)>,
    pub claim_extra: usize,
}

impl TupleOperator for RawChunks {
    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<(Status, usize)> {
        if self.chunks.is_empty() {
            return Ok((Status::NoData, 0));
        }
        let (status, bytes) = self.chunks.remove(0);
        dest[..bytes.len()].copy_from_slice(&bytes);
        Ok((status, bytes.len() + self.claim_extra))
    }
}

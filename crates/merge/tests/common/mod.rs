//! Shared helpers for the merge integration tests.

#![allow(dead_code)]

use merge::{Direction, Status, TupleOperator};
use sample::{Sample, FLOAT_SAMPLE_BYTES};

/// One generated input: a series id and its timestamps, ascending.
#[derive(Debug, Clone)]
pub struct Series {
    pub id: u64,
    pub ts: Vec<u64>,
}

impl Series {
    /// `(timestamp, value)` pairs in scan order. Values encode the position
    /// so equal keys stay distinguishable.
    pub fn points(&self, direction: Direction) -> Vec<(u64, f64)> {
        let mut pts: Vec<(u64, f64)> = self
            .ts
            .iter()
            .enumerate()
            .map(|(i, &t)| (t, (self.id * 1_000_000 + i as u64) as f64))
            .collect();
        if !direction.is_forward() {
            pts.reverse();
        }
        pts
    }
}

pub fn records(n: usize) -> usize {
    n * FLOAT_SAMPLE_BYTES
}

/// Reads `op` with a `cap`-byte buffer until it reports `NoData`.
pub fn drain<T: TupleOperator>(op: &mut T, cap: usize) -> merge::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; cap];
    loop {
        let (status, n) = op.read(&mut buf)?;
        out.extend_from_slice(&buf[..n]);
        if status == Status::NoData {
            return Ok(out);
        }
    }
}

pub fn decode(bytes: &[u8]) -> Vec<Sample> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (s, len) = Sample::decode(&bytes[pos..]).expect("merge emitted a bad record");
        out.push(s);
        pos += len;
    }
    out
}

/// `(timestamp, id, value bits)` of every sample, sorted, for multiset
/// comparison.
pub fn multiset(samples: &[Sample]) -> Vec<(u64, u64, u64)> {
    let mut v: Vec<_> = samples
        .iter()
        .map(|s| (s.timestamp, s.series_id, s.value().map_or(0, f64::to_bits)))
        .collect();
    v.sort_unstable();
    v
}

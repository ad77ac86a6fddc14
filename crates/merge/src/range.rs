//! Lookahead ranges: one refill's worth of records from a single input.
//!
//! A range owns its buffer and a read cursor. `pos <= size` always holds and
//! the range is empty once `pos == size`. When an input reports
//! [`Status::NoData`] the range remembers it and never calls that input
//! again; draining the last partial refill then leaves the range
//! [exhausted](ScalarRange::is_exhausted).
//!
//! A refill whose input call fails leaves the range empty but not exhausted,
//! so the next refill retries the input. A refill that was answered but
//! rejected (overfilled or malformed) still records a `NoData` answer: the
//! bad batch is dropped and that input is not called again.

use log::trace;
use sample::{FormatError, SampleHeader, SeriesId, Timestamp, FLOAT_SAMPLE_BYTES};

use crate::{MergeError, Result, ScalarOperator, Status, TupleOperator};

/// Merge key of the scalar merge: series major, timestamp minor.
pub type ScalarKey = (SeriesId, Timestamp);

/// Merge key of the tuple merge: timestamp major, series minor.
pub type TupleKey = (Timestamp, SeriesId);

/// Lookahead over a [`ScalarOperator`], tagged with the series it belongs to.
#[derive(Debug)]
pub struct ScalarRange {
    id: SeriesId,
    ts: Vec<Timestamp>,
    xs: Vec<f64>,
    size: usize,
    pos: usize,
    last_advance: usize,
    done: bool,
}

impl ScalarRange {
    /// Creates an empty range holding up to `capacity` samples of series
    /// `id`.
    pub fn new(id: SeriesId, capacity: usize) -> Self {
        Self {
            id,
            ts: vec![0; capacity],
            xs: vec![0.0; capacity],
            size: 0,
            pos: 0,
            last_advance: 0,
            done: false,
        }
    }

    /// Replaces the contents with the next batch from `input`.
    ///
    /// Does not call `input` once it has reported [`Status::NoData`]. On
    /// error the range is left empty and the call can be retried.
    pub fn refill<I: ScalarOperator + ?Sized>(&mut self, input: &mut I) -> Result<()> {
        debug_assert!(self.is_empty(), "refill would drop unread samples");
        if self.done {
            self.reset(0);
            return Ok(());
        }
        let (status, n) = input.read(&mut self.ts, &mut self.xs)?;
        self.reset(0);
        self.done = status == Status::NoData;
        let capacity = self.capacity();
        if n > capacity {
            return Err(MergeError::Overfill {
                returned: n,
                capacity,
            });
        }
        self.reset(n);
        trace!("series {} refilled with {} samples (done={})", self.id, n, self.done);
        Ok(())
    }

    fn reset(&mut self, size: usize) {
        self.size = size;
        self.pos = 0;
        self.last_advance = 0;
    }

    /// Series this range belongs to.
    pub fn id(&self) -> SeriesId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.ts.len().min(self.xs.len())
    }

    /// Number of samples delivered by the last refill.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Read cursor.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.size
    }

    /// Empty, and the input has nothing more to give.
    pub fn is_exhausted(&self) -> bool {
        self.done && self.is_empty()
    }

    /// Key of the sample under the cursor. The range must not be empty.
    pub fn top_key(&self) -> ScalarKey {
        (self.id, self.ts[self.pos])
    }

    /// Value of the sample under the cursor. The range must not be empty.
    pub fn top_value(&self) -> f64 {
        self.xs[self.pos]
    }

    pub fn advance(&mut self) {
        debug_assert!(!self.is_empty());
        self.pos += 1;
        self.last_advance = 1;
    }

    /// Undoes the last [`advance`](Self::advance). A second call without an
    /// advance in between does nothing.
    pub fn retreat(&mut self) {
        self.pos -= self.last_advance;
        self.last_advance = 0;
    }
}

/// Lookahead over a [`TupleOperator`]: a byte buffer of packed records.
///
/// Every refill is checked record by record, so the accessors can rely on
/// each header's declared size lying inside the filled extent.
#[derive(Debug)]
pub struct TupleRange {
    buf: Vec<u8>,
    size: usize,
    pos: usize,
    last_advance: usize,
    done: bool,
}

impl TupleRange {
    /// Creates an empty range with room for `records` float samples.
    pub fn new(records: usize) -> Self {
        Self::with_bytes(records * FLOAT_SAMPLE_BYTES)
    }

    /// Creates an empty range with a buffer of exactly `bytes`.
    pub fn with_bytes(bytes: usize) -> Self {
        Self {
            buf: vec![0; bytes],
            size: 0,
            pos: 0,
            last_advance: 0,
            done: false,
        }
    }

    /// Replaces the contents with the next batch from `input`.
    ///
    /// Fails with [`MergeError::MalformedRecord`] if the delivered bytes do
    /// not split into whole records. On error the range is left empty and
    /// the call can be retried.
    pub fn refill<I: TupleOperator + ?Sized>(&mut self, input: &mut I) -> Result<()> {
        debug_assert!(self.is_empty(), "refill would drop unread records");
        if self.done {
            self.reset(0);
            return Ok(());
        }
        let (status, n) = input.read(&mut self.buf)?;
        self.reset(0);
        self.done = status == Status::NoData;
        let capacity = self.capacity();
        if n > capacity {
            return Err(MergeError::Overfill {
                returned: n,
                capacity,
            });
        }
        check_records(&self.buf[..n])?;
        self.reset(n);
        trace!("tuple range refilled with {} bytes (done={})", n, self.done);
        Ok(())
    }

    fn reset(&mut self, size: usize) {
        self.size = size;
        self.pos = 0;
        self.last_advance = 0;
    }

    /// Buffer size in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes delivered by the last refill.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Byte offset of the record under the cursor.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.size
    }

    /// Empty, and the input has nothing more to give.
    pub fn is_exhausted(&self) -> bool {
        self.done && self.is_empty()
    }

    fn header(&self) -> SampleHeader {
        SampleHeader::read(&self.buf[self.pos..self.size])
    }

    /// Key of the record under the cursor. The range must not be empty.
    pub fn top_key(&self) -> TupleKey {
        let h = self.header();
        (h.timestamp, h.series_id)
    }

    /// Raw bytes of the record under the cursor. The range must not be empty.
    pub fn top(&self) -> &[u8] {
        let len = self.header().record_len();
        &self.buf[self.pos..self.pos + len]
    }

    /// Moves past the record under the cursor.
    pub fn advance(&mut self) {
        debug_assert!(!self.is_empty());
        let len = self.header().record_len();
        self.pos += len;
        self.last_advance = len;
    }

    /// Undoes the last [`advance`](Self::advance). A second call without an
    /// advance in between does nothing.
    pub fn retreat(&mut self) {
        self.pos -= self.last_advance;
        self.last_advance = 0;
    }
}

/// Checks that `buf` is a sequence of whole records.
fn check_records(buf: &[u8]) -> Result<()> {
    let mut records = sample::records(buf);
    loop {
        let offset = records.offset();
        match records.next() {
            None => return Ok(()),
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                let declared = match e {
                    FormatError::Truncated { needed, .. } => needed,
                    FormatError::Undersized { declared } | FormatError::Overrun { declared, .. } => {
                        declared
                    }
                    other => return Err(other.into()),
                };
                return Err(MergeError::MalformedRecord {
                    offset,
                    declared,
                    available: buf.len() - offset,
                });
            }
        }
    }
}

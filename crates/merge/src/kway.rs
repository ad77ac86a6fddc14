//! The k-way merge loop shared by the scalar and tuple merges.
//!
//! Each input is paired with its lookahead range in a [`Source`]. On every
//! `read` the engine builds a fresh heap over the non-empty sources, then
//! moves records into the caller's buffer in key order until the buffer is
//! full or every source is exhausted. Nothing but the sources survives
//! between calls, which is what makes a merge resumable.

use config::{MergeConfig, RefillErrorPolicy, MAX_RANGE_SIZE};
use log::{debug, warn};
use sample::Direction;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::marker::PhantomData;

use crate::order::{Backward, Forward, Order};
use crate::{MergeError, Result, Status};

/// One input together with its lookahead range.
pub(crate) trait Source: Sized {
    /// What the merge is constructed from.
    type Input;
    type Key: Ord + Copy;

    /// Pairs `input` with a range of `range_size` records. Called on the
    /// first `read`, so unused merges allocate nothing.
    fn open(input: Self::Input, range_size: usize) -> Self;

    fn refill(&mut self) -> Result<()>;
    fn is_empty(&self) -> bool;
    fn is_exhausted(&self) -> bool;
    fn top_key(&self) -> Self::Key;
    /// Length of the output record for the head.
    fn top_len(&self) -> usize;
    /// Serializes the head into `dest`, which is exactly `top_len()` long.
    fn write_top(&self, dest: &mut [u8]);
    fn advance(&mut self);
}

/// A pending head in the merge heap.
///
/// Only the key and the source index are stored; the record itself stays in
/// the source's range until it reaches the top of the heap.
struct HeapEntry<K, O> {
    key: K,
    /// Index into `sources`.
    source: usize,
    order: PhantomData<fn() -> O>,
}

impl<K, O> HeapEntry<K, O> {
    fn new(key: K, source: usize) -> Self {
        Self {
            key,
            source,
            order: PhantomData,
        }
    }
}

impl<K: Ord, O: Order> PartialEq for HeapEntry<K, O> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Ord, O: Order> Eq for HeapEntry<K, O> {}

impl<K: Ord, O: Order> PartialOrd for HeapEntry<K, O> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, O: Order> Ord for HeapEntry<K, O> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; the entry that comes first under `O`
        // must compare greatest. The source index never breaks ties.
        O::cmp(&other.key, &self.key)
    }
}

/// State of one merge across `read` calls.
pub(crate) struct KwayMerge<S: Source> {
    /// Inputs waiting for their ranges; drained on the first `read`.
    inputs: Vec<S::Input>,
    sources: Vec<S>,
    started: bool,
    finished: bool,
    direction: Direction,
    config: MergeConfig,
}

impl<S: Source> fmt::Debug for KwayMerge<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KwayMerge")
            .field("direction", &self.direction)
            .field("inputs", &self.inputs.len())
            .field("sources", &self.sources.len())
            .field("started", &self.started)
            .field("finished", &self.finished)
            .field("config", &self.config)
            .finish()
    }
}

impl<S: Source> KwayMerge<S> {
    pub(crate) fn new(inputs: Vec<S::Input>, direction: Direction, config: MergeConfig) -> Self {
        Self {
            inputs,
            sources: Vec::new(),
            started: false,
            finished: false,
            direction,
            config,
        }
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fills `dest` with the next records in merge order.
    ///
    /// Returns [`Status::NoData`] together with the final bytes once every
    /// input is exhausted; from then on every call returns `(NoData, 0)`
    /// without touching the inputs.
    pub(crate) fn read(&mut self, dest: &mut [u8]) -> Result<(Status, usize)> {
        match self.direction {
            Direction::Forward => self.merge::<Forward>(dest),
            Direction::Backward => self.merge::<Backward>(dest),
        }
    }

    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let range_size = self.config.range_size.clamp(1, MAX_RANGE_SIZE);
        self.sources = self
            .inputs
            .drain(..)
            .map(|input| S::open(input, range_size))
            .collect();
        debug!(
            "{} merge started with {} inputs, range size {}",
            self.direction,
            self.sources.len(),
            range_size
        );
    }

    /// Refills every source that ran dry (first call, or a refill that failed
    /// or came back empty last time) and drops the exhausted ones.
    fn prepare(&mut self) -> Result<()> {
        for source in self.sources.iter_mut() {
            if source.is_empty() && !source.is_exhausted() {
                source.refill()?;
            }
        }
        let before = self.sources.len();
        self.sources.retain(|s| !s.is_exhausted());
        if self.sources.len() < before {
            debug!("{} inputs exhausted, {} left", before - self.sources.len(), self.sources.len());
        }
        Ok(())
    }

    fn merge<O: Order>(&mut self, dest: &mut [u8]) -> Result<(Status, usize)> {
        if self.finished {
            return Ok((Status::NoData, 0));
        }
        self.start();
        self.prepare()?;
        if self.sources.iter().any(|s| s.is_empty()) {
            // A non-exhausted input answered `Success` with nothing. Its next
            // key is unknown, so nothing can be emitted safely yet.
            return Ok((Status::Success, 0));
        }

        let mut heap: BinaryHeap<HeapEntry<S::Key, O>> = BinaryHeap::with_capacity(self.sources.len());
        for (i, source) in self.sources.iter().enumerate() {
            if !source.is_empty() {
                heap.push(HeapEntry::new(source.top_key(), i));
            }
        }

        let mut outpos = 0;
        while let Some(top) = heap.peek() {
            let index = top.source;
            let source = &mut self.sources[index];
            let len = source.top_len();
            if dest.len() - outpos < len {
                // The head stays in its range for the next call.
                return Ok((Status::Success, outpos));
            }
            source.write_top(&mut dest[outpos..outpos + len]);
            outpos += len;
            heap.pop();
            source.advance();

            if source.is_empty() && !source.is_exhausted() {
                if let Err(e) = source.refill() {
                    return self.refill_failed(e, outpos);
                }
                if source.is_empty() && !source.is_exhausted() {
                    // Empty `Success`: stop before any later key overtakes
                    // this input, and ask it again next call.
                    return Ok((Status::Success, outpos));
                }
            }
            if !source.is_empty() {
                heap.push(HeapEntry::new(source.top_key(), index));
            }
        }

        self.sources.clear();
        self.finished = true;
        debug!("{} merge finished", self.direction);
        Ok((Status::NoData, outpos))
    }

    fn refill_failed(&self, e: MergeError, outpos: usize) -> Result<(Status, usize)> {
        match self.config.refill_error {
            RefillErrorPolicy::Discard => {
                warn!("refill failed, dropping {} bytes of this call's output: {}", outpos, e);
                Err(e)
            }
            RefillErrorPolicy::Defer => {
                warn!("refill failed, returning {} bytes and retrying next call: {}", outpos, e);
                Ok((Status::Success, outpos))
            }
        }
    }
}

/// Direction shared by all `directions`; `Forward` when there are none.
pub(crate) fn common_direction<D>(directions: D) -> Result<Direction>
where
    D: IntoIterator<Item = Direction>,
{
    let mut directions = directions.into_iter();
    let expected = match directions.next() {
        Some(d) => d,
        None => return Ok(Direction::Forward),
    };
    for (i, found) in directions.enumerate() {
        if found != expected {
            return Err(MergeError::DirectionMismatch {
                index: i + 1,
                expected,
                found,
            });
        }
    }
    Ok(expected)
}

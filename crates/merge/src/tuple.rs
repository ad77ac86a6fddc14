//! Merge of packed-record inputs, ordered by `(timestamp, series id)`.
//!
//! Records are copied verbatim; their length comes from their own header.

use config::MergeConfig;
use sample::Direction;
use std::fmt;

use crate::kway::{common_direction, KwayMerge, Source};
use crate::range::{TupleKey, TupleRange};
use crate::{Result, Status, TupleOperator};

/// A tuple input paired with its lookahead range.
pub(crate) struct TupleSource<I> {
    input: I,
    range: TupleRange,
}

impl<I: TupleOperator> Source for TupleSource<I> {
    type Input = I;
    type Key = TupleKey;

    fn open(input: I, range_size: usize) -> Self {
        Self {
            input,
            range: TupleRange::new(range_size),
        }
    }

    fn refill(&mut self) -> Result<()> {
        self.range.refill(&mut self.input)
    }

    fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    fn is_exhausted(&self) -> bool {
        self.range.is_exhausted()
    }

    fn top_key(&self) -> TupleKey {
        self.range.top_key()
    }

    fn top_len(&self) -> usize {
        self.range.top().len()
    }

    fn write_top(&self, dest: &mut [u8]) {
        dest.copy_from_slice(self.range.top());
    }

    fn advance(&mut self) {
        self.range.advance();
    }
}

/// Merges [`TupleOperator`]s into one stream ordered by timestamp, then
/// series id.
pub struct TupleMerge<I: TupleOperator = Box<dyn TupleOperator>> {
    engine: KwayMerge<TupleSource<I>>,
}

impl<I: TupleOperator> TupleMerge<I> {
    /// Builds a merge with the default [`MergeConfig`].
    pub fn new(inputs: Vec<I>) -> Result<Self> {
        Self::with_config(inputs, MergeConfig::default())
    }

    /// Builds a merge with an explicit configuration.
    ///
    /// The scan direction is taken from the inputs, which must all agree.
    pub fn with_config(inputs: Vec<I>, config: MergeConfig) -> Result<Self> {
        let direction = common_direction(inputs.iter().map(|i| i.direction()))?;
        Ok(Self {
            engine: KwayMerge::new(inputs, direction, config),
        })
    }

    /// `true` once the merge has returned its last record.
    pub fn is_exhausted(&self) -> bool {
        self.engine.is_finished()
    }
}

impl<I: TupleOperator> TupleOperator for TupleMerge<I> {
    fn direction(&self) -> Direction {
        self.engine.direction()
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<(Status, usize)> {
        self.engine.read(dest)
    }
}

impl<I: TupleOperator> fmt::Debug for TupleMerge<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleMerge")
            .field("engine", &self.engine)
            .finish()
    }
}

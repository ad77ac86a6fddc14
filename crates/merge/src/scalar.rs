//! Merge of single-series scalar inputs into float sample records.
//!
//! Output is ordered by `(series id, timestamp)`: each series comes out as
//! one contiguous run, and inputs that share an id interleave by timestamp
//! inside that run.

use config::MergeConfig;
use sample::{encode_float, Direction, SeriesId, FLOAT_SAMPLE_BYTES};
use std::fmt;

use crate::kway::{common_direction, KwayMerge, Source};
use crate::range::{ScalarKey, ScalarRange};
use crate::{Result, ScalarOperator, Status, TupleOperator};

/// A scalar input paired with its lookahead range.
pub(crate) struct ScalarSource<I> {
    input: I,
    range: ScalarRange,
}

impl<I: ScalarOperator> Source for ScalarSource<I> {
    type Input = (SeriesId, I);
    type Key = ScalarKey;

    fn open((id, input): Self::Input, range_size: usize) -> Self {
        Self {
            input,
            range: ScalarRange::new(id, range_size),
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

    fn top_key(&self) -> ScalarKey {
        self.range.top_key()
    }

    fn top_len(&self) -> usize {
        FLOAT_SAMPLE_BYTES
    }

    fn write_top(&self, dest: &mut [u8]) {
        let (id, ts) = self.range.top_key();
        encode_float(dest, ts, id, self.range.top_value());
    }

    fn advance(&mut self) {
        self.range.advance();
    }
}

/// Merges [`ScalarOperator`]s, one per series id, into a stream of float
/// sample records.
///
/// The merge is itself a [`TupleOperator`], so it can feed a
/// [`TupleMerge`](crate::TupleMerge).
pub struct ScalarMerge<I: ScalarOperator = Box<dyn ScalarOperator>> {
    engine: KwayMerge<ScalarSource<I>>,
}

impl<I: ScalarOperator> ScalarMerge<I> {
    /// Builds a merge with the default [`MergeConfig`].
    ///
    /// `ids[i]` names the series produced by `inputs[i]`.
    ///
    /// # Panics
    ///
    /// Panics if `ids` and `inputs` differ in length.
    pub fn new(ids: Vec<SeriesId>, inputs: Vec<I>) -> Result<Self> {
        Self::with_config(ids, inputs, MergeConfig::default())
    }

    /// Builds a merge with an explicit configuration.
    ///
    /// Fails with [`MergeError::DirectionMismatch`](crate::MergeError::DirectionMismatch)
    /// if the inputs do not all scan the same way.
    ///
    /// # Panics
    ///
    /// Panics if `ids` and `inputs` differ in length; a correctly built
    /// operator tree never does that.
    pub fn with_config(ids: Vec<SeriesId>, inputs: Vec<I>, config: MergeConfig) -> Result<Self> {
        assert_eq!(
            ids.len(),
            inputs.len(),
            "scalar merge needs one series id per input"
        );
        let direction = common_direction(inputs.iter().map(|i| i.direction()))?;
        let inputs = ids.into_iter().zip(inputs).collect();
        Ok(Self {
            engine: KwayMerge::new(inputs, direction, config),
        })
    }

    /// `true` once the merge has returned its last record.
    pub fn is_exhausted(&self) -> bool {
        self.engine.is_finished()
    }
}

impl<I: ScalarOperator> TupleOperator for ScalarMerge<I> {
    fn direction(&self) -> Direction {
        self.engine.direction()
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<(Status, usize)> {
        self.engine.read(dest)
    }
}

impl<I: ScalarOperator> fmt::Debug for ScalarMerge<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarMerge")
            .field("engine", &self.engine)
            .finish()
    }
}

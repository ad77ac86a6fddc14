//! # Merge - k-way merge operators for time-series reads
//!
//! Storage readers hand out one sorted stream per series (or per block of
//! interleaved series). The operators in this crate merge any number of such
//! streams into a single globally ordered stream of sample records, one
//! caller-supplied buffer at a time.
//!
//! ## Operator tree
//!
//! ```text
//!            caller: read(buf) until (NoData, 0)
//!                          |
//!                          v
//!                   ┌─────────────┐
//!                   │ TupleMerge  │   key (timestamp, id)
//!                   └─────────────┘
//!                    /           \
//!          ┌─────────────┐   ┌──────────────┐
//!          │ ScalarMerge │   │ TupleOperator│  key (id, timestamp)
//!          └─────────────┘   └──────────────┘
//!           /     |     \
//!     ScalarOperator (one per series id)
//! ```
//!
//! ## Read cycle
//!
//! | Step | What happens                                                  |
//! |------|---------------------------------------------------------------|
//! | 1    | first call only: one lookahead range per input, first refill  |
//! | 2    | fresh heap over the head of every non-empty range             |
//! | 3    | pop, serialize into the buffer, advance, refill, push         |
//! | 4    | buffer full: `Success` with the bytes written                 |
//! | 4a   | an input answered `Success` with nothing: stop, `Success`     |
//! | 5    | heap drained: inputs and ranges dropped, `NoData`             |
//!
//! After step 5 the merge is finished for good: further calls return
//! `(NoData, 0)` without touching any input.
//!
//! Scan direction is detected from the inputs when the merge is built and
//! selects a monomorphized comparator ([`Forward`] or [`Backward`]).

mod error;
mod input;
mod kway;
mod mem;
mod order;
mod range;
mod scalar;
mod tuple;

pub use config::{MergeConfig, RefillErrorPolicy};
pub use error::{MergeError, Result};
pub use input::{ScalarOperator, Status, TupleOperator};
pub use mem::{MemScalarOperator, MemTupleOperator};
pub use order::{Backward, Forward, Order};
pub use range::{ScalarKey, ScalarRange, TupleKey, TupleRange};
pub use sample::{Direction, SeriesId, Timestamp};
pub use scalar::ScalarMerge;
pub use tuple::TupleMerge;

#[cfg(test)]
mod tests;

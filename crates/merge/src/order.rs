//! Merge order, fixed at compile time.
//!
//! A merge picks one of these types once, from its inputs' direction, and
//! runs its whole loop monomorphized over it.

use sample::Direction;
use std::cmp::Ordering;

/// Scan order of a merge.
pub trait Order {
    /// The direction this order implements.
    const DIRECTION: Direction;

    /// Compares two merge keys; `Less` means `a` is emitted first.
    fn cmp<K: Ord>(a: &K, b: &K) -> Ordering;
}

/// Ascending keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forward;

impl Order for Forward {
    const DIRECTION: Direction = Direction::Forward;

    #[inline]
    fn cmp<K: Ord>(a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Descending keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Backward;

impl Order for Backward {
    const DIRECTION: Direction = Direction::Backward;

    #[inline]
    fn cmp<K: Ord>(a: &K, b: &K) -> Ordering {
        b.cmp(a)
    }
}

//! # Config - merge layer settings
//!
//! Tunables shared by every merge operator in a query tree. Values come from
//! code (builder helpers) or from the environment:
//!
//! ```text
//! TSMERGE_RANGE_SIZE    records buffered per input      (default: 1024)
//! TSMERGE_REFILL_ERROR  "discard" | "defer"             (default: "discard")
//! ```
//!
//! Unparseable values fall back to the default and log a warning.

use log::warn;
use std::fmt;
use std::str::FromStr;

/// Environment variable holding the per-input lookahead size, in records.
pub const ENV_RANGE_SIZE: &str = "TSMERGE_RANGE_SIZE";

/// Environment variable selecting the [`RefillErrorPolicy`].
pub const ENV_REFILL_ERROR: &str = "TSMERGE_REFILL_ERROR";

/// Default number of records a lookahead range holds.
pub const DEFAULT_RANGE_SIZE: usize = 1024;

/// Largest accepted lookahead, in records. Larger requests are clamped.
pub const MAX_RANGE_SIZE: usize = 1 << 20;

/// What a merge does with output already written in the current call when a
/// refill fails in the middle of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefillErrorPolicy {
    /// Return the error; records serialized earlier in the same call are lost
    /// to the caller. This is the historical behaviour.
    #[default]
    Discard,
    /// Return the records written so far with a success status and report
    /// the error on the next call, when the failed refill is retried.
    Defer,
}

impl FromStr for RefillErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "defer" => Ok(Self::Defer),
            other => Err(format!("unknown refill error policy: {other:?}")),
        }
    }
}

impl fmt::Display for RefillErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discard => f.write_str("discard"),
            Self::Defer => f.write_str("defer"),
        }
    }
}

/// Settings for a merge operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeConfig {
    /// Records per lookahead range. For tuple inputs the range holds this
    /// many fixed-size float records worth of bytes.
    pub range_size: usize,
    pub refill_error: RefillErrorPolicy,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            range_size: DEFAULT_RANGE_SIZE,
            refill_error: RefillErrorPolicy::Discard,
        }
    }
}

impl MergeConfig {
    /// Loads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`, which maps a variable name to its
    /// value. Missing variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(ENV_RANGE_SIZE) {
            match raw.trim().parse::<usize>() {
                Ok(n) => cfg = cfg.with_range_size(n),
                Err(e) => warn!(
                    "{}={:?} is not a valid size ({}), using {}",
                    ENV_RANGE_SIZE, raw, e, cfg.range_size
                ),
            }
        }

        if let Some(raw) = lookup(ENV_REFILL_ERROR) {
            match raw.parse::<RefillErrorPolicy>() {
                Ok(policy) => cfg.refill_error = policy,
                Err(e) => warn!("{}: {}, using {}", ENV_REFILL_ERROR, e, cfg.refill_error),
            }
        }

        cfg
    }

    /// Sets the lookahead size, clamped to `1..=MAX_RANGE_SIZE` records.
    #[must_use]
    pub fn with_range_size(mut self, n: usize) -> Self {
        if n == 0 {
            warn!("range size 0 is not usable, clamping to 1");
        } else if n > MAX_RANGE_SIZE {
            warn!("range size {} is too large, clamping to {}", n, MAX_RANGE_SIZE);
        }
        self.range_size = n.clamp(1, MAX_RANGE_SIZE);
        self
    }

    #[must_use]
    pub fn with_refill_error(mut self, policy: RefillErrorPolicy) -> Self {
        self.refill_error = policy;
        self
    }
}

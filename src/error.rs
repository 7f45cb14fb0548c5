// WHY: error taxonomy for fixture generation.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while configuring, generating or re-reading fixtures.
#[derive(Debug, Error)]
pub enum CookerError {
    /// A `min..=max` range was given with `min > max`.
    #[error("invalid range for {name}: min {min} is greater than max {max}")]
    InvalidRange {
        /// Human-readable name of the range (e.g. "text length").
        name: &'static str,
        min: usize,
        max: usize,
    },

    /// The text cannot hold the longest pattern, so no start offset exists.
    #[error("insufficient text capacity: text length {text_len} is smaller than pattern length {pattern_len}")]
    InsufficientCapacity { text_len: usize, pattern_len: usize },

    /// The placement deadline passed before every requested insertion landed.
    #[error("placement timed out after {elapsed:?} with {placed}/{requested} insertions placed")]
    PlacementTimeout {
        elapsed: Duration,
        placed: usize,
        requested: usize,
    },

    /// Every candidate offset for a pattern overlaps an accepted interval.
    #[error("no free slot left for pattern {pattern_index} after {placed}/{requested} insertions")]
    PlacementExhausted {
        pattern_index: usize,
        placed: usize,
        requested: usize,
    },

    /// A `.in` or `.ref` file does not follow the fixture format.
    #[error("malformed fixture {}: {reason}", .path.display())]
    MalformedFixture { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CookerError {
    /// Whether the batch driver may abandon the current test case and move on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PlacementTimeout { .. } | Self::PlacementExhausted { .. }
        )
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedFixture {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CookerError>;

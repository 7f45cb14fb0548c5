use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CookerError, Result};

/// Inclusive `min..=max` range used for every size knob of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    min: usize,
    max: usize,
}

impl SizeRange {
    /// Build a range, rejecting `min > max`.
    ///
    /// `name` only feeds the error message so the user can tell which flag was wrong.
    pub fn new(name: &'static str, min: usize, max: usize) -> Result<Self> {
        if min > max {
            return Err(CookerError::InvalidRange { name, min, max });
        }
        Ok(Self { min, max })
    }

    /// Degenerate range holding a single value.
    pub fn fixed(value: usize) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn contains(&self, value: usize) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Configuration for one fixture-generation run
#[derive(Debug, Clone)]
pub struct CookerConfig {
    /// Directory receiving `testN.in` / `testN.ref` (created if missing)
    pub output_dir: PathBuf,
    /// Number of test cases to generate
    pub num_tests: usize,
    /// Distinct patterns per test case
    pub patterns_per_test: SizeRange,
    /// Base text length
    pub text_len: SizeRange,
    /// Length of each pattern
    pub pattern_len: SizeRange,
    /// Requested insertions per pattern
    pub insertions: SizeRange,
    /// Wall-clock budget for the placement phase of a single test case
    pub timeout: Duration,
    /// Abort the run on the first abandoned test case instead of continuing
    pub fail_fast: bool,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for CookerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("tests"),
            num_tests: 10,
            patterns_per_test: SizeRange { min: 1, max: 10 },
            text_len: SizeRange {
                min: 1000,
                max: 100_000,
            },
            pattern_len: SizeRange { min: 10, max: 80 },
            insertions: SizeRange { min: 0, max: 10 },
            timeout: Duration::from_secs(10),
            fail_fast: false,
            show_progress: true,
        }
    }
}

impl CookerConfig {
    /// Check the cross-range constraints before any test case is generated.
    ///
    /// The shortest possible text must still hold the longest possible pattern,
    /// otherwise placement would have no valid offset to sample.
    pub fn validate(&self) -> Result<()> {
        if self.text_len.min < self.pattern_len.max {
            return Err(CookerError::InsufficientCapacity {
                text_len: self.text_len.min,
                pattern_len: self.pattern_len.max,
            });
        }
        Ok(())
    }
}

pub mod batch;
pub mod config;
pub mod error;
pub mod fixture;
pub mod oracle;
pub mod placement;
pub mod text_gen;
pub mod verify;

// Re-export main types for convenient access
pub use config::{CookerConfig, SizeRange};
pub use error::CookerError;
pub use fixture::Fixture;
pub use oracle::{scan, OccurrenceRecord};
pub use placement::{Interval, IntervalSet, PlacementEngine, PlacementOutcome};
pub use text_gen::{PlannedPattern, ALPHABET};

// Re-export batch and verification entry points used by the CLI and tests
pub use batch::{run_batch, RunStats, TestCaseStats};
pub use verify::{compare_results, verify_directory, FixtureMismatch, ResultMismatch, VerifyReport};

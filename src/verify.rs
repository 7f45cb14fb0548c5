// WHY: re-checking fixtures on disk and comparing matcher output against references.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fixture::{self, Fixture, INPUT_EXTENSION, REFERENCE_EXTENSION};
use crate::oracle::{build_oracle, OccurrenceRecord};

/// First difference between a candidate result set and the reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultMismatch {
    #[error("different number of patterns: {candidate} (candidate) vs {reference} (reference)")]
    PatternCount { candidate: usize, reference: usize },

    /// Patterns differ at `position` once both sides are sorted by pattern
    #[error("different patterns at sorted position {position}: {candidate:?} (candidate) vs {reference:?} (reference)")]
    Pattern {
        position: usize,
        candidate: String,
        reference: String,
    },

    #[error("different occurrence count for {pattern:?}: {candidate} (candidate) vs {reference} (reference)")]
    OccurrenceCount {
        pattern: String,
        candidate: usize,
        reference: usize,
    },

    /// Sorted offset lists differ at `position`
    #[error("offsets differ at position {position} for {pattern:?}: {candidate} (candidate) vs {reference} (reference)")]
    Offset {
        pattern: String,
        position: usize,
        candidate: usize,
        reference: usize,
    },
}

/// Why a fixture's `.ref` disagrees with a rescan of its own `.in`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixtureMismatch {
    #[error("reference has {written} lines but input declares {declared} patterns")]
    LineCount { written: usize, declared: usize },

    /// `line` is 1-based, matching the `.ref` file
    #[error("reference line {line} for {pattern:?} does not match a rescan of the text ({written} offsets written, {found} found)")]
    Line {
        line: usize,
        pattern: String,
        written: usize,
        found: usize,
    },
}

fn sorted_records(records: &[OccurrenceRecord]) -> Vec<OccurrenceRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| a.pattern.cmp(&b.pattern));
    for record in &mut sorted {
        record.offsets.sort_unstable();
    }
    sorted
}

/// Compare a matcher's results against the reference.
///
/// Neither pattern order nor offset order is significant: both sides are
/// sorted before the first difference is looked for.
pub fn compare_results(
    candidate: &[OccurrenceRecord],
    reference: &[OccurrenceRecord],
) -> std::result::Result<(), ResultMismatch> {
    if candidate.len() != reference.len() {
        return Err(ResultMismatch::PatternCount {
            candidate: candidate.len(),
            reference: reference.len(),
        });
    }

    let candidate = sorted_records(candidate);
    let reference = sorted_records(reference);

    for (position, (ours, theirs)) in candidate.iter().zip(&reference).enumerate() {
        if ours.pattern != theirs.pattern {
            return Err(ResultMismatch::Pattern {
                position,
                candidate: ours.pattern.clone(),
                reference: theirs.pattern.clone(),
            });
        }
        if ours.count() != theirs.count() {
            return Err(ResultMismatch::OccurrenceCount {
                pattern: theirs.pattern.clone(),
                candidate: ours.count(),
                reference: theirs.count(),
            });
        }
        if let Some((offset_position, (a, b))) = ours
            .offsets
            .iter()
            .zip(&theirs.offsets)
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(ResultMismatch::Offset {
                pattern: theirs.pattern.clone(),
                position: offset_position,
                candidate: *a,
                reference: *b,
            });
        }
    }

    Ok(())
}

/// Outcome of re-checking a single fixture.
#[derive(Debug, Clone)]
pub struct FixtureCheck {
    pub input_path: PathBuf,
    /// `None` when the fixture is self-consistent
    pub error: Option<String>,
}

impl FixtureCheck {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub checks: Vec<FixtureCheck>,
}

impl VerifyReport {
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.checks.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Check that a parsed fixture's reference is exactly what the oracle produces
/// for its own text and patterns, in pattern order.
pub fn check_fixture(fixture: &Fixture) -> std::result::Result<(), FixtureMismatch> {
    let expected = build_oracle(&fixture.text, fixture.patterns.iter().map(String::as_str));

    if fixture.occurrences.len() != expected.len() {
        return Err(FixtureMismatch::LineCount {
            written: fixture.occurrences.len(),
            declared: expected.len(),
        });
    }

    for (line, (written, rescanned)) in fixture.occurrences.iter().zip(&expected).enumerate() {
        if written != rescanned {
            return Err(FixtureMismatch::Line {
                line: line + 1,
                pattern: rescanned.pattern.clone(),
                written: written.count(),
                found: rescanned.count(),
            });
        }
    }
    Ok(())
}

/// Discover every `test*.in` file in `dir` and re-check it against its `.ref`.
///
/// Fixtures are visited in numeric index order. Unreadable or malformed
/// fixtures are reported as failures, not errors.
pub async fn verify_directory(dir: &Path) -> Result<VerifyReport> {
    let is_dir = tokio::fs::metadata(dir)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !is_dir {
        anyhow::bail!("Fixture directory does not exist: {}", dir.display());
    }

    let pattern = format!(
        "{}/test*.{INPUT_EXTENSION}",
        glob::Pattern::escape(&dir.display().to_string())
    );
    debug!("Discovering fixtures with pattern: {}", pattern);

    let mut inputs = glob(&pattern)
        .with_context(|| format!("Failed to create glob pattern for {}", dir.display()))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Glob iteration error (continuing): {}", e);
                None
            }
        })
        .collect::<Vec<_>>();
    // test2 before test10; names without a numeric index go last
    inputs.sort_by_key(|path| (fixture::fixture_index(path).unwrap_or(usize::MAX), path.clone()));

    let mut report = VerifyReport::default();
    for input_path in inputs {
        let reference_path = input_path.with_extension(REFERENCE_EXTENSION);
        let error = match fixture::read_fixture_pair(&input_path, &reference_path).await {
            Ok(fixture) => check_fixture(&fixture).err().map(|e| e.to_string()),
            Err(e) => Some(e.to_string()),
        };

        match &error {
            Some(reason) => warn!("Fixture {} failed: {}", input_path.display(), reason),
            None => debug!("Fixture {} passed", input_path.display()),
        }
        report.checks.push(FixtureCheck { input_path, error });
    }

    info!(
        "Verified {} fixtures: {} passed, {} failed",
        report.checks.len(),
        report.passed(),
        report.failed()
    );
    Ok(report)
}

/// Load a matcher's output file and a reference file and compare them.
pub async fn check_result_files(reference_path: &Path, candidate_path: &Path) -> Result<()> {
    let reference = tokio::fs::read_to_string(reference_path)
        .await
        .with_context(|| format!("Failed to read reference {}", reference_path.display()))?;
    let candidate = tokio::fs::read_to_string(candidate_path)
        .await
        .with_context(|| format!("Failed to read candidate {}", candidate_path.display()))?;

    let reference = fixture::parse_reference(reference_path, &reference)?;
    let candidate = fixture::parse_reference(candidate_path, &candidate)?;

    compare_results(&candidate, &reference).with_context(|| {
        format!(
            "{} does not match {}",
            candidate_path.display(),
            reference_path.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pattern: &str, offsets: &[usize]) -> OccurrenceRecord {
        OccurrenceRecord {
            pattern: pattern.to_string(),
            offsets: offsets.to_vec(),
        }
    }

    #[test]
    fn test_compare_ignores_pattern_and_offset_order() {
        let reference = vec![record("bb", &[1, 9]), record("aa", &[4])];
        let candidate = vec![record("aa", &[4]), record("bb", &[9, 1])];
        assert_eq!(compare_results(&candidate, &reference), Ok(()));
    }

    #[test]
    fn test_compare_reports_pattern_count() {
        let reference = vec![record("bb", &[1])];
        let err = compare_results(&[], &reference).unwrap_err();
        assert_eq!(
            err,
            ResultMismatch::PatternCount {
                candidate: 0,
                reference: 1
            }
        );
    }

    #[test]
    fn test_compare_reports_pattern_name() {
        let reference = vec![record("aa", &[]), record("bb", &[])];
        let candidate = vec![record("aa", &[]), record("bc", &[])];
        let err = compare_results(&candidate, &reference).unwrap_err();
        assert_eq!(
            err,
            ResultMismatch::Pattern {
                position: 1,
                candidate: "bc".to_string(),
                reference: "bb".to_string()
            }
        );
    }

    #[test]
    fn test_compare_reports_occurrence_count_then_offset() {
        let reference = vec![record("aa", &[0, 5])];

        let err = compare_results(&[record("aa", &[0])], &reference).unwrap_err();
        assert!(matches!(err, ResultMismatch::OccurrenceCount { candidate: 1, reference: 2, .. }));

        let err = compare_results(&[record("aa", &[0, 6])], &reference).unwrap_err();
        assert_eq!(
            err,
            ResultMismatch::Offset {
                pattern: "aa".to_string(),
                position: 1,
                candidate: 6,
                reference: 5
            }
        );
        assert!(err.to_string().contains("offsets differ at position 1"));
    }

    #[test]
    fn test_check_fixture_detects_tampered_reference() {
        let mut fixture = Fixture {
            patterns: vec!["bb".to_string()],
            text: "aabbaabb".to_string(),
            occurrences: vec![record("bb", &[2, 6])],
        };
        assert!(check_fixture(&fixture).is_ok());

        fixture.occurrences[0].offsets = vec![2];
        let err = check_fixture(&fixture).unwrap_err();
        assert_eq!(
            err,
            FixtureMismatch::Line {
                line: 1,
                pattern: "bb".to_string(),
                written: 1,
                found: 2
            }
        );
        assert!(err.to_string().contains("does not match a rescan"));

        fixture.occurrences.clear();
        assert_eq!(
            check_fixture(&fixture),
            Err(FixtureMismatch::LineCount {
                written: 0,
                declared: 1
            })
        );
    }

    #[tokio::test]
    async fn test_verify_directory_orders_by_index_and_skips_foreign_inputs() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let fixture = Fixture {
            patterns: vec!["bb".to_string()],
            text: "aabbaa".to_string(),
            occurrences: vec![record("bb", &[2])],
        };
        for index in [10, 2, 1] {
            fixture::write_fixture(temp_dir.path(), index, &fixture).await.unwrap();
        }
        std::fs::write(temp_dir.path().join("notes.in"), "not a fixture").unwrap();

        let report = verify_directory(temp_dir.path()).await.unwrap();

        let names: Vec<_> = report
            .checks
            .iter()
            .map(|c| c.input_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["test1.in", "test2.in", "test10.in"]);
        assert!(report.all_passed());
    }

    #[tokio::test]
    async fn test_verify_directory_rejects_missing_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let err = verify_directory(&temp_dir.path().join("absent")).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}

// WHY: batch driver running one independent test case per iteration, with per-test failure isolation

use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::CookerConfig;
use crate::error::CookerError;
use crate::fixture::{self, Fixture};
use crate::oracle::{build_oracle, report_shortfalls};
use crate::placement::PlacementEngine;
use crate::text_gen::{generate_patterns, generate_text, PlannedPattern};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAILED: &str = "failed";

/// Per-test-case statistics
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TestCaseStats {
    /// Index N of the `testN` basename
    pub index: usize,
    /// Length of the base (and final) text
    pub text_len: usize,
    pub pattern_count: usize,
    /// Sum of requested insertions over all patterns
    pub requested_insertions: usize,
    /// Insertions accepted by placement (0 for a failed test case)
    pub placed_insertions: usize,
    /// Occurrences written to the reference, natural ones included
    pub observed_occurrences: usize,
    /// Patterns observed fewer times than requested
    pub shortfall_patterns: usize,
    pub placement_time_ms: u64,
    /// Processing status (success, failed)
    pub status: String,
    /// Error message if the test case was abandoned
    pub error: Option<String>,
}

/// Aggregate statistics for one run
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunStats {
    /// Seconds since the Unix epoch when the run started
    pub run_start: u64,
    pub total_time_ms: u64,
    pub tests_generated: usize,
    pub tests_failed: usize,
    pub total_text_bytes: u64,
    pub total_occurrences: u64,
    pub test_stats: Vec<TestCaseStats>,
}

impl RunStats {
    fn new() -> Self {
        Self {
            run_start: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            total_time_ms: 0,
            tests_generated: 0,
            tests_failed: 0,
            total_text_bytes: 0,
            total_occurrences: 0,
            test_stats: Vec::new(),
        }
    }

    fn record(&mut self, stats: TestCaseStats) {
        if stats.status == STATUS_SUCCESS {
            self.tests_generated += 1;
            self.total_text_bytes += stats.text_len as u64;
            self.total_occurrences += stats.observed_occurrences as u64;
        } else {
            self.tests_failed += 1;
        }
        self.test_stats.push(stats);
    }

    /// Write the statistics as pretty-printed JSON
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
        Ok(())
    }
}

/// A fully generated test case, ready to be written.
#[derive(Debug, Clone)]
pub struct CookedTest {
    pub fixture: Fixture,
    pub stats: TestCaseStats,
}

/// A test case abandoned during placement, with what was known about it.
#[derive(Debug)]
pub struct TestCaseFailure {
    pub error: CookerError,
    pub stats: TestCaseStats,
}

/// Place `patterns` into `text` and scan the result.
///
/// This is the generation pipeline minus the random inputs, so callers can
/// supply hand-made texts and patterns.
pub fn cook_from_parts<R: Rng>(
    engine: &PlacementEngine,
    rng: &mut R,
    index: usize,
    text: String,
    patterns: Vec<PlannedPattern>,
) -> std::result::Result<CookedTest, TestCaseFailure> {
    let mut stats = TestCaseStats {
        index,
        text_len: text.len(),
        pattern_count: patterns.len(),
        requested_insertions: patterns.iter().map(|p| p.requested).sum(),
        placed_insertions: 0,
        observed_occurrences: 0,
        shortfall_patterns: 0,
        placement_time_ms: 0,
        status: STATUS_SUCCESS.to_string(),
        error: None,
    };

    let started = Instant::now();
    let placed = engine.place(rng, text, patterns);
    stats.placement_time_ms = started.elapsed().as_millis() as u64;

    let outcome = match placed {
        Ok(outcome) => outcome,
        Err(error) => {
            stats.status = STATUS_FAILED.to_string();
            stats.error = Some(error.to_string());
            return Err(TestCaseFailure { error, stats });
        }
    };

    let occurrences = build_oracle(&outcome.text, outcome.patterns.iter().map(|p| p.text.as_str()));
    stats.placed_insertions = outcome.accepted.len();
    stats.observed_occurrences = occurrences.iter().map(|r| r.count()).sum();
    stats.shortfall_patterns = report_shortfalls(&occurrences, &outcome.patterns);

    let fixture = Fixture {
        patterns: outcome.patterns.into_iter().map(|p| p.text).collect(),
        text: outcome.text,
        occurrences,
    };
    Ok(CookedTest { fixture, stats })
}

/// Generate one random test case according to `config`.
pub fn cook_test_case<R: Rng>(
    rng: &mut R,
    config: &CookerConfig,
    index: usize,
) -> std::result::Result<CookedTest, TestCaseFailure> {
    let text = generate_text(rng, &config.text_len);
    let patterns = generate_patterns(
        rng,
        &config.patterns_per_test,
        &config.pattern_len,
        &config.insertions,
    );
    let engine = PlacementEngine::new(config.timeout);
    cook_from_parts(&engine, rng, index, text, patterns)
}

fn progress_bar(config: &CookerConfig) -> Result<ProgressBar> {
    if !config.show_progress {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(config.num_tests as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({elapsed})")
            .context("Invalid progress bar template")?
            .progress_chars("=> "),
    );
    bar.set_message("generating tests");
    Ok(bar)
}

/// Generate `config.num_tests` fixtures into `config.output_dir`.
///
/// Configuration and I/O errors abort the run. A test case abandoned during
/// placement is logged and recorded in the returned stats, and the run moves
/// on to the next index unless `config.fail_fast` is set.
pub async fn run_batch(config: &CookerConfig) -> Result<RunStats> {
    config.validate().context("Invalid configuration")?;

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory {}",
                config.output_dir.display()
            )
        })?;

    info!(
        "Generating {} test cases into {}",
        config.num_tests,
        config.output_dir.display()
    );

    let run_started = Instant::now();
    let mut run_stats = RunStats::new();
    let bar = progress_bar(config)?;

    for index in 0..config.num_tests {
        // The thread-local generator is not held across the write below
        let cooked = cook_test_case(&mut rand::rng(), config, index);

        match cooked {
            Ok(CookedTest { fixture, stats }) => {
                fixture::write_fixture(&config.output_dir, index, &fixture)
                    .await
                    .with_context(|| format!("Failed to write fixture test{index}"))?;
                info!(
                    index,
                    text_len = stats.text_len,
                    patterns = stats.pattern_count,
                    placed = stats.placed_insertions,
                    occurrences = stats.observed_occurrences,
                    "Test case generated"
                );
                run_stats.record(stats);
            }
            Err(TestCaseFailure { error, stats }) if error.is_recoverable() => {
                warn!(index, error = %error, "Test case abandoned");
                // A fixture left at this index by an earlier run must not outlive the failure
                fixture::remove_fixture(&config.output_dir, index)
                    .await
                    .with_context(|| format!("Failed to remove stale fixture test{index}"))?;
                run_stats.record(stats);
                if config.fail_fast {
                    bar.abandon();
                    return Err(error).context(format!("Test case {index} failed (fail-fast)"));
                }
            }
            Err(TestCaseFailure { error, .. }) => {
                bar.abandon();
                return Err(error).context(format!("Test case {index} failed"));
            }
        }
        bar.inc(1);
    }
    bar.finish();

    run_stats.total_time_ms = run_started.elapsed().as_millis() as u64;
    info!(
        "Run completed in {}ms: {} generated, {} failed",
        run_stats.total_time_ms, run_stats.tests_generated, run_stats.tests_failed
    );
    Ok(run_stats)
}

// Integration test utilities and common code
// WHY: Centralized utilities avoid duplication across integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cooker::{CookerConfig, SizeRange};
use tempfile::TempDir;

/// Test fixture helper owning a temporary output directory
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_path = temp_dir.path().to_path_buf();

        Self {
            temp_dir,
            root_path,
        }
    }

    /// Small, fast configuration writing into this fixture's directory
    pub fn config(&self, num_tests: usize) -> CookerConfig {
        CookerConfig {
            output_dir: self.root_path.clone(),
            num_tests,
            patterns_per_test: SizeRange::new("patterns per test", 1, 5).unwrap(),
            text_len: SizeRange::new("text length", 500, 2000).unwrap(),
            pattern_len: SizeRange::new("pattern length", 4, 20).unwrap(),
            insertions: SizeRange::new("insertions", 0, 5).unwrap(),
            timeout: Duration::from_secs(5),
            fail_fast: false,
            show_progress: false,
        }
    }

    /// Write a raw file relative to the fixture root
    pub fn create_file<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.root_path.join(relative_path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    pub fn input_path(&self, index: usize) -> PathBuf {
        self.root_path.join(format!("test{index}.in"))
    }

    pub fn reference_path(&self, index: usize) -> PathBuf {
        self.root_path.join(format!("test{index}.ref"))
    }

    pub fn read_input(&self, index: usize) -> String {
        fs::read_to_string(self.input_path(index)).expect("Failed to read .in file")
    }

    pub fn read_reference(&self, index: usize) -> String {
        fs::read_to_string(self.reference_path(index)).expect("Failed to read .ref file")
    }
}

/// Compare two strings line by line, providing detailed diff on mismatch
pub fn assert_golden_file(actual: &str, expected: &str, context: &str) {
    let actual_lines: Vec<&str> = actual.lines().collect();
    let expected_lines: Vec<&str> = expected.lines().collect();

    if actual_lines.len() != expected_lines.len() {
        panic!(
            "{}: Line count mismatch. Expected {} lines, got {} lines",
            context,
            expected_lines.len(),
            actual_lines.len()
        );
    }

    for (i, (actual_line, expected_line)) in actual_lines.iter().zip(expected_lines.iter()).enumerate() {
        if actual_line != expected_line {
            panic!(
                "{}: Line {} mismatch\nExpected: {}\nActual:   {}",
                context,
                i + 1,
                expected_line,
                actual_line
            );
        }
    }
}

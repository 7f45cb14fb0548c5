// WHY: `.in` / `.ref` fixture files need serialization, parsing and async file I/O
//
// testN.in:   <pattern count>\n<pattern>\n...<text>\n
// testN.ref:  <pattern>:[ <offset>]*\n   one line per pattern, in .in order

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::error::{CookerError, Result};
use crate::oracle::OccurrenceRecord;

pub const INPUT_EXTENSION: &str = "in";
pub const REFERENCE_EXTENSION: &str = "ref";

/// One complete test case as written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub patterns: Vec<String>,
    pub text: String,
    pub occurrences: Vec<OccurrenceRecord>,
}

/// Paths of the `.in` / `.ref` pair for test case `index`
pub fn fixture_paths(dir: &Path, index: usize) -> (PathBuf, PathBuf) {
    let basename = format!("test{index}");
    (
        dir.join(format!("{basename}.{INPUT_EXTENSION}")),
        dir.join(format!("{basename}.{REFERENCE_EXTENSION}")),
    )
}

/// Index N of a `testN.in` / `testN.ref` path, if the name has that shape.
pub fn fixture_index(path: &Path) -> Option<usize> {
    path.file_stem()?.to_str()?.strip_prefix("test")?.parse().ok()
}

pub fn format_input<S: AsRef<str>>(patterns: &[S], text: &str) -> String {
    let body: usize = patterns.iter().map(|p| p.as_ref().len() + 1).sum();
    let mut out = String::with_capacity(body + text.len() + 16);
    out.push_str(&patterns.len().to_string());
    out.push('\n');
    for pattern in patterns {
        out.push_str(pattern.as_ref());
        out.push('\n');
    }
    out.push_str(text);
    out.push('\n');
    out
}

/// Render reference lines: `bb: 3 18`, or `bb:` when nothing was found.
pub fn format_reference(records: &[OccurrenceRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.pattern);
        out.push(':');
        for offset in &record.offsets {
            // Writing into a String cannot fail
            let _ = write!(out, " {offset}");
        }
        out.push('\n');
    }
    out
}

/// Parse the contents of a `.in` file into its patterns and text.
///
/// `path` is only used for error messages.
pub fn parse_input(path: &Path, content: &str) -> Result<(Vec<String>, String)> {
    // The text line is the last one; an empty text still ends with its own newline
    let body = content.strip_suffix('\n').unwrap_or(content);
    let mut lines = body.split('\n');

    let count_line = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or_else(|| CookerError::malformed(path, "missing pattern count"))?;
    let count: usize = count_line.trim().parse().map_err(|_| {
        CookerError::malformed(path, format!("invalid pattern count {count_line:?}"))
    })?;

    let mut patterns = Vec::with_capacity(count);
    for i in 0..count {
        let pattern = lines.next().ok_or_else(|| {
            CookerError::malformed(path, format!("expected {count} patterns, found {i}"))
        })?;
        patterns.push(pattern.to_string());
    }

    let text = lines
        .next()
        .ok_or_else(|| CookerError::malformed(path, "missing text line"))?
        .to_string();

    if lines.next().is_some() {
        return Err(CookerError::malformed(path, "unexpected content after text line"));
    }

    Ok((patterns, text))
}

/// Parse the contents of a `.ref` file (or a matcher's output in the same format).
///
/// Patterns never contain `:`, so each line splits on its first colon and
/// the pattern keeps any surrounding spaces.
pub fn parse_reference(path: &Path, content: &str) -> Result<Vec<OccurrenceRecord>> {
    let mut records = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let (pattern, offsets) = line.split_once(':').ok_or_else(|| {
            CookerError::malformed(path, format!("missing ':' on line {}", line_no + 1))
        })?;

        let offsets = offsets
            .split_whitespace()
            .map(|token| {
                token.parse::<usize>().map_err(|_| {
                    CookerError::malformed(
                        path,
                        format!("invalid offset {token:?} on line {}", line_no + 1),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        records.push(OccurrenceRecord {
            pattern: pattern.to_string(),
            offsets,
        });
    }
    Ok(records)
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(content.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Write `testN.in` and `testN.ref` for `fixture` into `dir`.
///
/// Returns the two paths written.
pub async fn write_fixture(dir: &Path, index: usize, fixture: &Fixture) -> Result<(PathBuf, PathBuf)> {
    let (input_path, reference_path) = fixture_paths(dir, index);

    write_file(&input_path, &format_input(&fixture.patterns, &fixture.text)).await?;
    write_file(&reference_path, &format_reference(&fixture.occurrences)).await?;

    debug!(
        "Wrote fixture {} and {}",
        input_path.display(),
        reference_path.display()
    );
    Ok((input_path, reference_path))
}

/// Remove the `.in` / `.ref` pair for test case `index`, if present.
///
/// Returns how many of the two files existed.
pub async fn remove_fixture(dir: &Path, index: usize) -> Result<usize> {
    let (input_path, reference_path) = fixture_paths(dir, index);
    let mut removed = 0;
    for path in [&input_path, &reference_path] {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("Removed stale fixture file {}", path.display());
                removed += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(removed)
}

/// Read and parse the `.in` / `.ref` pair for test case `index` from `dir`.
pub async fn read_fixture(dir: &Path, index: usize) -> Result<Fixture> {
    let (input_path, reference_path) = fixture_paths(dir, index);
    read_fixture_pair(&input_path, &reference_path).await
}

pub async fn read_fixture_pair(input_path: &Path, reference_path: &Path) -> Result<Fixture> {
    let input = tokio::fs::read_to_string(input_path).await?;
    let (patterns, text) = parse_input(input_path, &input)?;

    let reference = tokio::fs::read_to_string(reference_path).await?;
    let occurrences = parse_reference(reference_path, &reference)?;

    Ok(Fixture {
        patterns,
        text,
        occurrences,
    })
}

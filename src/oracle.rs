// WHY: ground-truth occurrence scanning over the final spliced text.

use memchr::memmem;
use tracing::warn;

use crate::text_gen::PlannedPattern;

/// All start offsets of one pattern in one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceRecord {
    pub pattern: String,
    /// Ascending, non-overlapping start offsets
    pub offsets: Vec<usize>,
}

impl OccurrenceRecord {
    pub fn count(&self) -> usize {
        self.offsets.len()
    }
}

/// Every literal occurrence of `pattern` in `text`, left to right.
///
/// Each match consumes its span before the search resumes, so overlapping
/// occurrences of a self-overlapping pattern are reported once
/// (`scan("aaaa", "aa") == [0, 2]`). An empty pattern has no occurrences.
pub fn scan(text: &str, pattern: &str) -> Vec<usize> {
    if pattern.is_empty() {
        return Vec::new();
    }
    memmem::find_iter(text.as_bytes(), pattern.as_bytes()).collect()
}

/// Scan `text` for each pattern, keeping pattern order.
pub fn build_oracle<'a, I>(text: &str, patterns: I) -> Vec<OccurrenceRecord>
where
    I: IntoIterator<Item = &'a str>,
{
    patterns
        .into_iter()
        .map(|pattern| OccurrenceRecord {
            pattern: pattern.to_string(),
            offsets: scan(text, pattern),
        })
        .collect()
}

/// Warn about every pattern observed fewer times than it was requested.
///
/// Returns the number of patterns that fell short. A shortfall usually means
/// a self-overlapping pattern merged with neighbouring filler, and the
/// reference keeps the observed offsets regardless.
pub fn report_shortfalls(records: &[OccurrenceRecord], patterns: &[PlannedPattern]) -> usize {
    let mut shortfalls = 0;
    for (record, planned) in records.iter().zip(patterns) {
        if record.count() < planned.requested {
            warn!(
                pattern = %record.pattern,
                observed = record.count(),
                requested = planned.requested,
                "Fewer occurrences observed than insertions requested"
            );
            shortfalls += 1;
        }
    }
    shortfalls
}

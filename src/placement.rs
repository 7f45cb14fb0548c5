use std::collections::{BTreeMap, HashSet};
use std::ops::Range;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::debug;

use crate::error::{CookerError, Result};
use crate::text_gen::PlannedPattern;

/// Half-open range `[start, end)` of text occupied by one embedded pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// True when both intervals share at least one offset.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Pairwise-disjoint intervals ordered by start offset.
///
/// Since stored intervals never intersect, ordering by start also orders them
/// by end, so a candidate can only collide with the last interval starting
/// before the candidate's end.
#[derive(Debug, Default, Clone)]
pub struct IntervalSet {
    by_start: BTreeMap<usize, usize>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlaps(&self, candidate: &Interval) -> bool {
        if candidate.is_empty() {
            return false;
        }
        self.by_start
            .range(..candidate.end)
            .next_back()
            .is_some_and(|(_, &end)| end > candidate.start)
    }

    /// Add `interval` unless it collides with a stored one. Empty intervals
    /// occupy nothing and are accepted without being stored.
    pub fn insert(&mut self, interval: Interval) -> bool {
        if self.overlaps(&interval) {
            return false;
        }
        if !interval.is_empty() {
            self.by_start.insert(interval.start, interval.end);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Interval> + '_ {
        self.by_start
            .iter()
            .map(|(&start, &end)| Interval { start, end })
    }
}

/// One accepted insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub pattern_index: usize,
    pub interval: Interval,
}

/// Result of a successful placement phase.
#[derive(Debug, Clone)]
pub struct PlacementOutcome {
    /// Final text, same length as the base text
    pub text: String,
    pub patterns: Vec<PlannedPattern>,
    /// Every accepted insertion in acceptance order
    pub accepted: Vec<Placement>,
}

impl PlacementOutcome {
    /// Number of insertions actually accepted for the pattern at `index`.
    pub fn placed_for(&self, index: usize) -> usize {
        self.accepted
            .iter()
            .filter(|p| p.pattern_index == index)
            .count()
    }
}

/// Embeds patterns into a text at random, pairwise-disjoint positions.
///
/// Insertion overwrites `len(pattern)` characters, so the text length and the
/// coordinates of earlier intervals never change. Sampling is random and can
/// spin when the text is nearly full, so every call runs against a deadline
/// checked inside the sampling loop.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    budget: Duration,
}

impl PlacementEngine {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Place every requested insertion of every pattern into `text`.
    ///
    /// Start offsets are drawn uniformly from `[0, len(text) - max_pattern_len]`
    /// for all patterns, so the shortest patterns never reach the tail of the
    /// text. Fails with [`CookerError::InsufficientCapacity`] before sampling
    /// when the text cannot hold the longest pattern, with
    /// [`CookerError::PlacementTimeout`] when the deadline passes and with
    /// [`CookerError::PlacementExhausted`] once every candidate offset for a
    /// pattern has been rejected.
    pub fn place<R: Rng>(
        &self,
        rng: &mut R,
        text: String,
        patterns: Vec<PlannedPattern>,
    ) -> Result<PlacementOutcome> {
        let started = Instant::now();
        // An unrepresentable deadline means the budget is effectively unbounded
        let deadline = started.checked_add(self.budget);
        // Offsets are byte offsets; splicing relies on one byte per character
        debug_assert!(text.is_ascii() && patterns.iter().all(|p| p.text.is_ascii()));

        let max_pattern_len = patterns.iter().map(PlannedPattern::len).max().unwrap_or(0);
        if text.len() < max_pattern_len {
            return Err(CookerError::InsufficientCapacity {
                text_len: text.len(),
                pattern_len: max_pattern_len,
            });
        }

        let last_start = text.len() - max_pattern_len;
        let candidate_count = last_start + 1;
        let requested: usize = patterns.iter().map(|p| p.requested).sum();

        let mut text = text;
        let mut occupied = IntervalSet::new();
        let mut accepted = Vec::with_capacity(requested);

        for (pattern_index, pattern) in patterns.iter().enumerate() {
            // Intervals only accumulate, so an offset rejected for this
            // pattern stays rejected for the rest of its insertions.
            let mut rejected: HashSet<usize> = HashSet::new();

            for _ in 0..pattern.requested {
                let interval = loop {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Err(CookerError::PlacementTimeout {
                            elapsed: started.elapsed(),
                            placed: accepted.len(),
                            requested,
                        });
                    }
                    if rejected.len() == candidate_count {
                        return Err(CookerError::PlacementExhausted {
                            pattern_index,
                            placed: accepted.len(),
                            requested,
                        });
                    }

                    let start = rng.random_range(0..=last_start);
                    if rejected.contains(&start) {
                        continue;
                    }

                    let candidate = Interval::new(start, pattern.len());
                    if occupied.insert(candidate) {
                        break candidate;
                    }
                    rejected.insert(start);
                };

                text.replace_range(interval.range(), &pattern.text);
                debug!(
                    pattern_index,
                    start = interval.start,
                    len = interval.len(),
                    "Placed pattern"
                );
                accepted.push(Placement {
                    pattern_index,
                    interval,
                });
            }
        }

        debug!(
            placed = accepted.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Placement completed"
        );

        Ok(PlacementOutcome {
            text,
            patterns,
            accepted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::config::SizeRange;
    use crate::text_gen::{generate_patterns, generate_text};

    fn engine() -> PlacementEngine {
        PlacementEngine::new(Duration::from_secs(10))
    }

    #[test]
    fn test_interval_overlap_is_half_open() {
        let a = Interval::new(0, 5);
        let b = Interval::new(5, 5);
        let c = Interval::new(4, 2);

        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
        assert_eq!(a.range(), 0..5);
    }

    #[test]
    fn test_interval_set_rejects_collisions() {
        let mut set = IntervalSet::new();
        assert!(set.insert(Interval::new(10, 5)));
        assert!(set.insert(Interval::new(0, 10)));
        assert!(set.insert(Interval::new(15, 3)));

        assert!(!set.insert(Interval::new(12, 1)));
        assert!(!set.insert(Interval::new(9, 2)));
        assert!(!set.insert(Interval::new(17, 10)));
        assert!(!set.insert(Interval::new(11, 1)));
        assert!(set.insert(Interval::new(18, 1)));

        assert_eq!(set.len(), 4);
        let stored: Vec<_> = set.iter().collect();
        assert_eq!(stored[0], Interval::new(0, 10));
        assert_eq!(stored[3], Interval::new(18, 1));
    }

    #[test]
    fn test_interval_set_candidate_covering_stored_interval() {
        let mut set = IntervalSet::new();
        assert!(set.insert(Interval::new(20, 2)));
        assert!(set.overlaps(&Interval::new(10, 30)));
        assert!(!set.overlaps(&Interval::new(10, 10)));
        assert!(!set.overlaps(&Interval::new(22, 10)));
    }

    #[test]
    fn test_empty_interval_occupies_nothing() {
        let mut set = IntervalSet::new();
        assert!(set.insert(Interval::new(0, 10)));
        assert!(set.insert(Interval::new(5, 0)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_single_pattern_into_uniform_text() {
        let mut rng = StdRng::seed_from_u64(5);
        let text = "a".repeat(20);
        let outcome = engine()
            .place(&mut rng, text, vec![PlannedPattern::new("bb", 1)])
            .unwrap();

        assert_eq!(outcome.text.len(), 20);
        assert_eq!(outcome.accepted.len(), 1);
        let start = outcome.accepted[0].interval.start;
        assert!(start <= 18);
        assert_eq!(&outcome.text[start..start + 2], "bb");
        assert_eq!(outcome.text.matches("bb").count(), 1);
        assert_eq!(outcome.text.matches('b').count(), 2);
    }

    #[test]
    fn test_accepted_intervals_are_disjoint_and_hold_their_pattern() {
        // Worst case is 10 patterns x 10 insertions x 80 bytes, well under half the text
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            let text = generate_text(&mut rng, &SizeRange::new("text length", 20_000, 50_000).unwrap());
            let patterns = generate_patterns(
                &mut rng,
                &SizeRange::new("patterns per test", 1, 10).unwrap(),
                &SizeRange::new("pattern length", 10, 80).unwrap(),
                &SizeRange::new("insertions", 0, 10).unwrap(),
            );
            let base_len = text.len();

            let outcome = engine().place(&mut rng, text, patterns).unwrap();
            assert_eq!(outcome.text.len(), base_len);

            for (i, a) in outcome.accepted.iter().enumerate() {
                let pattern = &outcome.patterns[a.pattern_index].text;
                assert_eq!(&outcome.text[a.interval.range()], pattern.as_str());
                for b in &outcome.accepted[i + 1..] {
                    assert!(!a.interval.overlaps(&b.interval), "{a:?} overlaps {b:?}");
                }
            }
            for (index, pattern) in outcome.patterns.iter().enumerate() {
                assert_eq!(outcome.placed_for(index), pattern.requested);
            }
        }
    }

    #[test]
    fn test_text_shorter_than_pattern_fails_fast() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = engine()
            .place(&mut rng, "short".to_string(), vec![PlannedPattern::new("much longer", 1)])
            .unwrap_err();
        assert!(matches!(
            err,
            CookerError::InsufficientCapacity {
                text_len: 5,
                pattern_len: 11
            }
        ));
    }

    #[test]
    fn test_capacity_uses_longest_pattern_even_without_insertions() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = engine()
            .place(
                &mut rng,
                "a".repeat(8),
                vec![PlannedPattern::new("bb", 1), PlannedPattern::new("c".repeat(9), 0)],
            )
            .unwrap_err();
        assert!(matches!(err, CookerError::InsufficientCapacity { .. }));
    }

    #[test]
    fn test_saturated_text_is_exhausted_not_hung() {
        // Any two starts in 0..=4 are closer than the pattern length
        let mut rng = StdRng::seed_from_u64(2);
        let err = engine()
            .place(&mut rng, "a".repeat(10), vec![PlannedPattern::new("bbbbbb", 2)])
            .unwrap_err();
        assert!(matches!(
            err,
            CookerError::PlacementExhausted {
                pattern_index: 0,
                placed: 1,
                requested: 2
            }
        ));
    }

    #[test]
    fn test_zero_budget_times_out() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = PlacementEngine::new(Duration::ZERO)
            .place(&mut rng, "a".repeat(1000), vec![PlannedPattern::new("bb", 5)])
            .unwrap_err();
        assert!(matches!(
            err,
            CookerError::PlacementTimeout {
                placed: 0,
                requested: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_insertions_leave_text_untouched() {
        let mut rng = StdRng::seed_from_u64(4);
        let base = "xyz".repeat(10);
        let outcome = PlacementEngine::new(Duration::ZERO)
            .place(&mut rng, base.clone(), vec![PlannedPattern::new("bb", 0)])
            .unwrap();
        assert_eq!(outcome.text, base);
        assert!(outcome.accepted.is_empty());
    }

    #[test]
    fn test_no_patterns() {
        let mut rng = StdRng::seed_from_u64(4);
        let outcome = engine().place(&mut rng, "abc".to_string(), Vec::new()).unwrap();
        assert_eq!(outcome.text, "abc");
        assert!(outcome.patterns.is_empty());
    }
}

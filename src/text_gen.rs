// WHY: random filler text and needle patterns over a letters-plus-space alphabet.

use rand::Rng;

use crate::config::SizeRange;

/// Symbols used for both texts and patterns: `A-Z`, `a-z` and space.
pub const ALPHABET: &[u8; 53] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz ";

/// A pattern together with how many times placement should try to embed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPattern {
    pub text: String,
    pub requested: usize,
}

impl PlannedPattern {
    pub fn new(text: impl Into<String>, requested: usize) -> Self {
        Self {
            text: text.into(),
            requested,
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Generate a string whose length is uniform in `len` (inclusive) and whose
/// characters are drawn independently and uniformly from [`ALPHABET`].
pub fn generate_text<R: Rng>(rng: &mut R, len: &SizeRange) -> String {
    let length = rng.random_range(len.min()..=len.max());
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Generate the pattern set of one test case.
///
/// The pattern count comes from `count`, each pattern's length from `len` and
/// its requested insertion count from `insertions`.
pub fn generate_patterns<R: Rng>(
    rng: &mut R,
    count: &SizeRange,
    len: &SizeRange,
    insertions: &SizeRange,
) -> Vec<PlannedPattern> {
    let n = rng.random_range(count.min()..=count.max());
    (0..n)
        .map(|_| {
            let text = generate_text(rng, len);
            let requested = rng.random_range(insertions.min()..=insertions.max());
            PlannedPattern { text, requested }
        })
        .collect()
}

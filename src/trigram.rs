//! Trigram string similarity, compatible with PostgreSQL's `pg_trgm`.
//!
//! A string is lowercased and split into words on every non-alphanumeric
//! character. Each word is padded with two spaces in front and one behind,
//! and contributes every three-character window to the string's trigram set.
//! Similarity is the number of shared trigrams divided by the number of
//! distinct trigrams across both strings.

use std::collections::HashSet;

pub type Trigram = [char; 3];

/// Extract the set of trigrams of `text`.
pub fn trigrams(text: &str) -> HashSet<Trigram> {
    let mut set = HashSet::new();

    let lowered = text.to_lowercase();
    for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let padded: Vec<char> = ['\u{20}', '\u{20}']
            .into_iter()
            .chain(word.chars())
            .chain(std::iter::once('\u{20}'))
            .collect();
        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }

    set
}

/// Similarity of two strings in `0.0..=1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = trigrams(a);
    let b = trigrams(b);

    let shared = a.intersection(&b).count();
    let total = a.len() + b.len() - shared;
    if total == 0 {
        return 0.0;
    }

    shared as f64 / total as f64
}

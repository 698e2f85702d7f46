//! Text primitives shared by classification, sentiment and relationship scoring.

use std::collections::BTreeSet;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "into", "over", "under", "about", "there",
    "their", "your", "you", "our", "are", "was", "were", "been", "have", "has", "had", "but", "not",
    "can", "could", "should", "would", "will", "just", "than", "then", "when", "what", "which",
    "while", "why", "how", "any", "all", "its", "it", "also", "use", "using", "used",
];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Lower-case, split on anything that is not `[a-z0-9]`, and keep tokens
/// longer than two characters that are not stop-words.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|t| t.len() > 2 && !is_stopword(t))
        .map(str::to_string)
        .collect()
}

pub fn token_set(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}

/// |A ∩ B| / max(|A|, |B|) over token sets; 0 when either side is empty.
pub fn keyword_overlap(a: &str, b: &str) -> f64 {
    overlap_of_sets(&token_set(a), &token_set(b))
}

/// Same ratio as [`keyword_overlap`] for pre-tokenized sets.
pub fn overlap_of_sets(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f64 / a.len().max(b.len()) as f64
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `needle` occurs in `haystack` delimited by word boundaries.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let first_is_word = needle.chars().next().is_some_and(is_word_char);
    let last_is_word = needle.chars().next_back().is_some_and(is_word_char);
    haystack.match_indices(needle).any(|(start, m)| {
        let before = haystack[..start].chars().next_back().is_some_and(is_word_char);
        let after = haystack[start + m.len()..]
            .chars()
            .next()
            .is_some_and(is_word_char);
        before != first_is_word && after != last_is_word
    })
}

/// Match a configured phrase against already lower-cased text.
///
/// Phrases of three characters or fewer (`os`, `npm`) only match as whole
/// words; longer phrases match as substrings.
pub fn phrase_matches(text: &str, phrase: &str) -> bool {
    let normalized = phrase.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    if normalized.chars().count() <= 3 {
        let lower = text.to_lowercase();
        return contains_word(&lower, &normalized);
    }
    text.contains(&normalized)
}

pub fn has_any_phrase<S: AsRef<str>>(text: &str, phrases: &[S]) -> bool {
    phrases.iter().any(|p| phrase_matches(text, p.as_ref()))
}

/// Collapse every whitespace run to a single space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

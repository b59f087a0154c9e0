//! Fuzzy string similarity scoring on a 0–100 scale.
//!
//! The title consolidator only depends on the [`SimilarityScorer`] trait, so
//! the concrete algorithm can be swapped and tested independently.

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

/// Scores how similar two strings are, from 0 (nothing in common) to 100
/// (equivalent). Implementations must be symmetric and must score a string
/// against itself as 100.
pub trait SimilarityScorer {
    fn score(&self, a: &str, b: &str) -> u8;
}

// ── TokenSetScorer ────────────────────────────────────────────────────────────

/// Token-set ratio scorer: case-insensitive and word-order-insensitive.
///
/// Both inputs are lowercased and split into word tokens. The score is the
/// best normalized edit-distance ratio among the three token-set
/// combinations (shared tokens alone, shared + left-only, shared +
/// right-only), floored by the plain full-string ratio so that near-equal
/// strings with no shared whole tokens still score.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetScorer;

impl SimilarityScorer for TokenSetScorer {
    fn score(&self, a: &str, b: &str) -> u8 {
        let a_norm = normalize(a);
        let b_norm = normalize(b);

        if a_norm.is_empty() && b_norm.is_empty() {
            return 100;
        }
        if a_norm.is_empty() || b_norm.is_empty() {
            return 0;
        }

        let plain = ratio(&a_norm, &b_norm);
        let token_set = token_set_ratio(&a_norm, &b_norm);

        to_scale(plain.max(token_set))
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Lowercase and collapse all non-alphanumeric runs to single spaces.
fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Normalized Levenshtein ratio in `[0, 1]`.
fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

/// The thefuzz-style token-set ratio over two pre-normalized strings.
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let shared: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    let base = shared.join(" ");
    let combined_a = join_nonempty(&base, &only_a.join(" "));
    let combined_b = join_nonempty(&base, &only_b.join(" "));

    let r1 = ratio(&base, &combined_a);
    let r2 = ratio(&base, &combined_b);
    let r3 = ratio(&combined_a, &combined_b);

    r1.max(r2).max(r3)
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}

/// Map a `[0, 1]` ratio onto the 0–100 scale.
fn to_scale(r: f64) -> u8 {
    (r * 100.0).round().clamp(0.0, 100.0) as u8
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn score(a: &str, b: &str) -> u8 {
        TokenSetScorer.score(a, b)
    }

    #[test]
    fn test_identical_strings_score_100() {
        assert_eq!(score("Data Scientist", "Data Scientist"), 100);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(score("data scientist", "DATA SCIENTIST"), 100);
    }

    #[test]
    fn test_word_order_insensitive() {
        assert_eq!(score("Scientist, Data", "Data Scientist"), 100);
    }

    #[test]
    fn test_plural_variant_clears_default_threshold() {
        // One extra character over 15 → well above the 75 default.
        assert!(score("Data Scientists", "Data Scientist") >= 75);
    }

    #[test]
    fn test_superset_title_scores_100_via_token_set() {
        // Shared tokens alone form one of the compared combinations.
        assert_eq!(score("Senior Software Engineer", "Software Engineer"), 100);
    }

    #[test]
    fn test_unrelated_titles_score_low() {
        assert!(score("Accountant", "Data Scientist") < 50);
    }

    #[test]
    fn test_adjacent_titles_stay_below_strict_threshold() {
        // "Software Developer" must not be folded into "Software Engineer"
        // at the 85 threshold.
        assert!(score("Software Developer", "Software Engineer") < 85);
    }

    #[test]
    fn test_symmetry() {
        let ab = score("Machine Learning Engineer", "Software Engineer");
        let ba = score("Software Engineer", "Machine Learning Engineer");
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(score("", ""), 100);
        assert_eq!(score("", "Data Scientist"), 0);
        assert_eq!(score("Data Scientist", ""), 0);
    }

    #[test]
    fn test_punctuation_ignored() {
        assert_eq!(score("Data-Scientist", "Data Scientist"), 100);
    }

    #[test]
    fn test_normalize_collapses_runs() {
        assert_eq!(normalize("  Sr.   Data -- Scientist "), "sr data scientist");
    }
}

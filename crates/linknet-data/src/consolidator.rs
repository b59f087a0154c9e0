//! Fuzzy-match consolidation of free-text column variants.
//!
//! Rewrites every value of a chosen column that scores at or above a
//! similarity threshold against a canonical form to exactly that form.
//! Scoring runs once per distinct value, not once per row.

use std::collections::HashSet;

use linknet_core::error::{InsightError, Result};
use linknet_core::models::{ConnectionRecord, Tabular};
use linknet_core::similarity::SimilarityScorer;
use tracing::debug;

/// Upper bound on the number of distinct values scored per consolidation
/// pass, a cost guard on very large inputs.
pub const MAX_FUZZY_CANDIDATES: usize = 500;

// ── ConsolidationRule ─────────────────────────────────────────────────────────

/// One consolidation pass: fold variants of `canonical` found in `column`.
#[derive(Debug, Clone)]
pub struct ConsolidationRule {
    /// Column the rule rewrites.
    pub column: String,
    /// Target string variants are consolidated into.
    pub canonical: String,
    /// Minimum similarity score (0-100, inclusive) for a rewrite.
    pub min_similarity: u8,
}

/// The standard rules, applied in this fixed order: "Data Scientist" at the
/// generic threshold, then "Software Engineer" at the stricter one.
pub fn standard_rules(ds_threshold: u8, swe_threshold: u8) -> Vec<ConsolidationRule> {
    vec![
        ConsolidationRule {
            column: "position".to_string(),
            canonical: "Data Scientist".to_string(),
            min_similarity: ds_threshold,
        },
        ConsolidationRule {
            column: "position".to_string(),
            canonical: "Software Engineer".to_string(),
            min_similarity: swe_threshold,
        },
    ]
}

// ── Consolidation ─────────────────────────────────────────────────────────────

/// Rewrite every value of `column` scoring `>= min_similarity` against
/// `canonical` to exactly `canonical`, returning a new record set.
///
/// Distinct values are deduplicated before scoring and capped at
/// [`MAX_FUZZY_CANDIDATES`]. Ties at exactly the threshold are included.
/// Empty input is a no-op; an unrecognized column is
/// [`InsightError::UnknownColumn`].
pub fn consolidate(
    records: &[ConnectionRecord],
    column: &str,
    canonical: &str,
    min_similarity: u8,
    scorer: &dyn SimilarityScorer,
) -> Result<Vec<ConnectionRecord>> {
    if !ConnectionRecord::columns().contains(&column) {
        return Err(InsightError::UnknownColumn(column.to_string()));
    }
    if records.is_empty() {
        return Ok(Vec::new());
    }

    // Distinct values in first-seen order, capped.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut candidates: Vec<&str> = Vec::new();
    for record in records {
        if candidates.len() >= MAX_FUZZY_CANDIDATES {
            break;
        }
        if let Some(value) = record.field(column) {
            if seen.insert(value) {
                candidates.push(value);
            }
        }
    }

    let matching: HashSet<String> = candidates
        .iter()
        .filter(|value| scorer.score(value, canonical) >= min_similarity)
        .map(|v| v.to_string())
        .collect();

    debug!(
        "Consolidating {}/{} distinct \"{}\" values into \"{}\" (threshold {})",
        matching.len(),
        candidates.len(),
        column,
        canonical,
        min_similarity
    );

    let rewritten = records
        .iter()
        .cloned()
        .map(|mut record| {
            let hit = record
                .field(column)
                .map(|v| matching.contains(v))
                .unwrap_or(false);
            if hit {
                set_field(&mut record, column, canonical);
            }
            record
        })
        .collect();

    Ok(rewritten)
}

/// Apply `rules` sequentially; later rules never undo earlier rewrites
/// because each pass only moves values toward its own canonical form.
pub fn apply_rules(
    records: Vec<ConnectionRecord>,
    rules: &[ConsolidationRule],
    scorer: &dyn SimilarityScorer,
) -> Result<Vec<ConnectionRecord>> {
    let mut current = records;
    for rule in rules {
        current = consolidate(
            &current,
            &rule.column,
            &rule.canonical,
            rule.min_similarity,
            scorer,
        )?;
    }
    Ok(current)
}

/// Write `value` into the named column. The column is pre-validated by
/// [`consolidate`].
fn set_field(record: &mut ConnectionRecord, column: &str, value: &str) {
    match column {
        "name" => record.name = value.to_string(),
        "company" => record.company = value.to_string(),
        "position" => record.position = value.to_string(),
        "email" => record.email = Some(value.to_string()),
        _ => {}
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

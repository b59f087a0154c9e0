//! Raw-table normalization for linknet.
//!
//! Canonicalizes column names, drops privacy-sensitive or incomplete rows,
//! joins name fields, truncates company names, parses the connection date,
//! and applies the company denylist filter. Every function returns a new
//! value; the input table is never mutated.

use chrono::NaiveDate;
use linknet_core::error::{InsightError, Result};
use linknet_core::models::{truncate_chars, ConnectionRecord, RawTable, COMPANY_MAX_LEN};
use regex::Regex;
use tracing::debug;

/// Expected input format of the `connected_on` column.
pub const DATE_FORMAT: &str = "%d %b %Y";

/// Default company denylist.
///
/// Drops case-insensitive "freelance" and "self-employed" placeholders, plus
/// any company containing a period or hyphen. The last two classes are
/// intentionally broad and known to over-filter legitimate names, which is
/// why the pattern is configurable on [`NormalizerConfig`].
pub const DEFAULT_DENYLIST: &str = r"(?i)freelance|self-employed|[.-]";

/// Columns removed by [`redact`].
const SENSITIVE_COLUMNS: &[&str] = &["first_name", "last_name", "email_address"];

// ── Config ────────────────────────────────────────────────────────────────────

/// Tuning knobs for [`normalize`].
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// When set, name and email fields are dropped before normalization and
    /// the produced records carry an empty name and no email.
    pub privacy: bool,
    /// Maximum company-name length in characters.
    pub company_max_len: usize,
    /// Rows whose company matches this pattern are dropped.
    pub denylist: Regex,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            privacy: false,
            company_max_len: COMPANY_MAX_LEN,
            denylist: Regex::new(DEFAULT_DENYLIST).expect("default denylist pattern is valid"),
        }
    }
}

impl NormalizerConfig {
    /// Build a config with a caller-supplied denylist pattern.
    pub fn with_denylist(privacy: bool, pattern: &str) -> Result<Self> {
        let denylist = Regex::new(pattern)
            .map_err(|e| InsightError::Config(format!("invalid denylist pattern: {e}")))?;
        Ok(Self {
            privacy,
            company_max_len: COMPANY_MAX_LEN,
            denylist,
        })
    }
}

// ── Header canonicalization ───────────────────────────────────────────────────

/// Canonicalize one column name: trim, lowercase, internal spaces to `_`.
pub fn canonicalize_header(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

// ── Redaction ─────────────────────────────────────────────────────────────────

/// Drop the first-name, last-name and email-address columns from `raw`,
/// leaving every other column and row untouched.
///
/// This is the whole of privacy mode's contract; the pipeline composes it
/// with [`normalize`] so downstream aggregation still gets typed records.
pub fn redact(raw: &RawTable) -> RawTable {
    let keep: Vec<usize> = raw
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !SENSITIVE_COLUMNS.contains(&canonicalize_header(h).as_str()))
        .map(|(i, _)| i)
        .collect();

    RawTable {
        headers: keep.iter().map(|&i| raw.headers[i].clone()).collect(),
        rows: raw
            .rows
            .iter()
            .map(|row| {
                keep.iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect(),
    }
}

// ── Normalization ─────────────────────────────────────────────────────────────

/// Clean `raw` into typed [`ConnectionRecord`]s.
///
/// Column names are canonicalized first. Rows missing a company or position
/// are dropped, first and last name are joined with a single space, the
/// company is truncated to `config.company_max_len` characters, and rows
/// whose company matches the denylist are removed. The connection date must
/// parse with [`DATE_FORMAT`]; a single malformed date fails the whole load.
///
/// Errors: [`InsightError::MissingRequiredColumn`] when the company,
/// position or date column is absent (the name columns too, outside privacy
/// mode); [`InsightError::MalformedDate`] on an unparsable date.
pub fn normalize(raw: &RawTable, config: &NormalizerConfig) -> Result<Vec<ConnectionRecord>> {
    let source = if config.privacy { redact(raw) } else { raw.clone() };

    let headers: Vec<String> = source.headers.iter().map(|h| canonicalize_header(h)).collect();

    let require = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| InsightError::MissingRequiredColumn(name.to_string()))
    };

    let company_idx = require("company")?;
    let position_idx = require("position")?;
    let date_idx = require("connected_on")?;

    let name_idx = if config.privacy {
        None
    } else {
        Some((require("first_name")?, require("last_name")?))
    };
    let email_idx = if config.privacy {
        None
    } else {
        headers.iter().position(|h| h == "email_address")
    };

    let mut records = Vec::with_capacity(source.rows.len());
    let mut dropped_incomplete = 0u64;
    let mut dropped_denylisted = 0u64;

    for row in &source.rows {
        let cell = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or("");

        let company_raw = cell(company_idx);
        let position = cell(position_idx);
        if company_raw.is_empty() || position.is_empty() {
            dropped_incomplete += 1;
            continue;
        }

        let company = truncate_chars(company_raw, config.company_max_len);

        let date_str = cell(date_idx);
        let connected_on = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
            .map_err(|_| InsightError::MalformedDate(date_str.to_string()))?;

        if config.denylist.is_match(&company) {
            dropped_denylisted += 1;
            continue;
        }

        let name = match name_idx {
            Some((first_idx, last_idx)) => {
                format!("{} {}", cell(first_idx), cell(last_idx))
                    .trim()
                    .to_string()
            }
            None => String::new(),
        };

        let email = email_idx
            .map(cell)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        records.push(ConnectionRecord {
            name,
            company,
            position: position.to_string(),
            connected_on,
            email,
        });
    }

    debug!(
        "Normalized {} rows into {} records ({} incomplete, {} denylisted)",
        source.rows.len(),
        records.len(),
        dropped_incomplete,
        dropped_denylisted
    );

    Ok(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

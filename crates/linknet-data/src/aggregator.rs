//! Frequency counts and time-bucket series over record sets.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use linknet_core::error::{InsightError, Result};
use linknet_core::models::{
    AggregateRow, AggregateTable, ConnectionRecord, CumulativeBucket, CumulativeSeries,
    MessageRecord, Tabular, TimeBucket, TimeBucketSeries,
};

const WEEKDAY_LABELS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

// ── Frequency aggregation ─────────────────────────────────────────────────────

/// Count occurrences of each distinct value of `column`, sorted by count
/// descending. Ties keep first-seen input order (the sort is stable).
///
/// Returns [`InsightError::UnknownColumn`] for a column the record type does
/// not expose, including on empty input.
pub fn aggregate<T: Tabular>(records: &[T], column: &str) -> Result<AggregateTable> {
    if !T::columns().contains(&column) {
        return Err(InsightError::UnknownColumn(column.to_string()));
    }

    // First-seen order, then a stable sort by count.
    let mut order: Vec<String> = Vec::new();
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        if let Some(value) = record.field(column) {
            if !counts.contains_key(value) {
                order.push(value.to_string());
            }
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<AggregateRow> = order
        .into_iter()
        .map(|value| {
            let count = counts[&value];
            AggregateRow { value, count }
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(AggregateTable {
        column: column.to_string(),
        rows,
    })
}

// ── Time buckets ──────────────────────────────────────────────────────────────

/// Connections per calendar day, chronological, `%Y-%m-%d` keys. Days with
/// no connections are absent.
pub fn by_date(records: &[ConnectionRecord]) -> TimeBucketSeries {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        *counts
            .entry(record.connected_on.format("%Y-%m-%d").to_string())
            .or_insert(0) += 1;
    }
    TimeBucketSeries {
        buckets: counts
            .into_iter()
            .map(|(key, count)| TimeBucket { key, count })
            .collect(),
    }
}

/// Connections per weekday, always seven buckets Monday through Sunday,
/// zero-filled.
pub fn by_weekday(records: &[ConnectionRecord]) -> TimeBucketSeries {
    let mut counts = [0u64; 7];
    for record in records {
        counts[record.connected_on.weekday().num_days_from_monday() as usize] += 1;
    }
    TimeBucketSeries {
        buckets: WEEKDAY_LABELS
            .iter()
            .zip(counts)
            .map(|(label, count)| TimeBucket {
                key: label.to_string(),
                count,
            })
            .collect(),
    }
}

/// Messages per hour of day, always 24 buckets `"00"` through `"23"`,
/// zero-filled.
pub fn by_hour(messages: &[MessageRecord]) -> TimeBucketSeries {
    let mut counts = [0u64; 24];
    for message in messages {
        counts[message.sent_at.hour() as usize] += 1;
    }
    TimeBucketSeries {
        buckets: counts
            .iter()
            .enumerate()
            .map(|(hour, &count)| TimeBucket {
                key: format!("{hour:02}"),
                count,
            })
            .collect(),
    }
}

/// Running total of connections per calendar day, chronological. The last
/// bucket's running total equals the record count.
pub fn cumulative_by_date(records: &[ConnectionRecord]) -> CumulativeSeries {
    let daily = by_date(records);
    let mut running_total = 0u64;
    CumulativeSeries {
        buckets: daily
            .buckets
            .into_iter()
            .map(|bucket| {
                running_total += bucket.count;
                CumulativeBucket {
                    key: bucket.key,
                    count: bucket.count,
                    running_total,
                }
            })
            .collect(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Headline statistics derived from a cleaned record set.

use chrono::Datelike;
use linknet_core::error::{InsightError, Result};
use linknet_core::models::{AggregateTable, ConnectionRecord};
use serde::Serialize;

/// The name-free projection of a single connection used in summaries.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionBrief {
    pub company: String,
    pub position: String,
    pub connected_on: String,
}

impl From<&ConnectionRecord> for ConnectionBrief {
    fn from(record: &ConnectionRecord) -> Self {
        Self {
            company: record.company.clone(),
            position: record.position.clone(),
            connected_on: record.connected_on.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Headline figures shown at the top of a report.
#[derive(Debug, Clone, Serialize)]
pub struct InsightsSummary {
    pub total_connections: u64,
    pub top_company: String,
    pub top_company_count: u64,
    pub second_company: Option<String>,
    pub top_position: String,
    pub top_position_count: u64,
    pub first_connection: ConnectionBrief,
    pub latest_connection: ConnectionBrief,
    pub emails_shared: u64,
    /// Connections made in the calendar month of the latest connection.
    pub new_this_month: u64,
}

/// Derive summary statistics from the record set and its company/position
/// aggregates. Returns [`InsightError::EmptyDataset`] when there is nothing
/// to summarize.
pub fn summarize(
    records: &[ConnectionRecord],
    companies: &AggregateTable,
    positions: &AggregateTable,
) -> Result<InsightsSummary> {
    let (first_top_company, top_position) = match (companies.rows.first(), positions.rows.first())
    {
        (Some(c), Some(p)) => (c, p),
        _ => return Err(InsightError::EmptyDataset),
    };

    let first = records
        .iter()
        .min_by_key(|r| r.connected_on)
        .ok_or(InsightError::EmptyDataset)?;
    let latest = records
        .iter()
        .max_by_key(|r| r.connected_on)
        .ok_or(InsightError::EmptyDataset)?;

    let reference = latest.connected_on;
    let new_this_month = records
        .iter()
        .filter(|r| {
            r.connected_on.year() == reference.year() && r.connected_on.month() == reference.month()
        })
        .count() as u64;

    let emails_shared = records.iter().filter(|r| r.email.is_some()).count() as u64;

    Ok(InsightsSummary {
        total_connections: records.len() as u64,
        top_company: first_top_company.value.clone(),
        top_company_count: first_top_company.count,
        second_company: companies.rows.get(1).map(|r| r.value.clone()),
        top_position: top_position.value.clone(),
        top_position_count: top_position.count,
        first_connection: ConnectionBrief::from(first),
        latest_connection: ConnectionBrief::from(latest),
        emails_shared,
        new_this_month,
    })
}

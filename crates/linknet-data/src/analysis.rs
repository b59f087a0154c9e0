//! Main analysis pipeline for linknet.
//!
//! Orchestrates archive loading, normalization, title consolidation and
//! aggregation, returning an [`AnalysisReport`] ready for rendering.

use std::path::Path;

use chrono::Utc;
use linknet_core::error::{InsightError, Result};
use linknet_core::models::{
    AggregateTable, ConnectionRecord, CumulativeSeries, MessageRecord, TimeBucketSeries,
};
use linknet_core::similarity::TokenSetScorer;
use tracing::{debug, info};

use crate::aggregator::{aggregate, by_date, by_hour, by_weekday, cumulative_by_date};
use crate::consolidator::{apply_rules, standard_rules};
use crate::normalizer::{normalize, NormalizerConfig};
use crate::reader::load_archive;
use crate::summary::{summarize, InsightsSummary};

// ── Public types ──────────────────────────────────────────────────────────────

/// Knobs for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Drop identifying columns before any further processing.
    pub privacy: bool,
    /// Similarity threshold for the "Data Scientist" consolidation pass.
    pub ds_threshold: u8,
    /// Similarity threshold for the "Software Engineer" consolidation pass.
    pub swe_threshold: u8,
    /// Override for the company denylist pattern, `None` for the default.
    pub denylist: Option<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            privacy: false,
            ds_threshold: 75,
            swe_threshold: 85,
            denylist: None,
        }
    }
}

/// Metadata produced alongside the analysis report.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Connection rows read from the archive before cleaning.
    pub records_loaded: usize,
    /// Connection records remaining after cleaning and filtering.
    pub records_kept: usize,
    /// Message rows read from the archive, if any.
    pub messages_loaded: usize,
    /// Wall-clock seconds spent reading the archive.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent cleaning, consolidating and aggregating.
    pub transform_time_seconds: f64,
}

/// The complete output of [`analyze_archive`].
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Cleaned, consolidated connection records.
    pub records: Vec<ConnectionRecord>,
    /// Parsed message records (empty when the archive has none).
    pub messages: Vec<MessageRecord>,
    /// Connections per company, count descending.
    pub companies: AggregateTable,
    /// Connections per position, count descending.
    pub positions: AggregateTable,
    /// Messages per sender, when messages are present.
    pub senders: Option<AggregateTable>,
    /// Messages per recipient, when messages are present.
    pub recipients: Option<AggregateTable>,
    /// Connections per calendar day, chronological.
    pub timeline: TimeBucketSeries,
    /// Connections per weekday, Monday through Sunday.
    pub weekdays: TimeBucketSeries,
    /// Messages per hour of day, when messages are present.
    pub message_hours: Option<TimeBucketSeries>,
    /// Running connection total per calendar day.
    pub cumulative: CumulativeSeries,
    /// Headline statistics.
    pub summary: InsightsSummary,
    /// Metadata about this analysis run.
    pub metadata: AnalysisMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full analysis pipeline against an archive (zip or directory).
///
/// 1. Load the raw connections table and any messages from `path`.
/// 2. Normalize: redaction, header canonicalization, cleaning, denylist.
/// 3. Consolidate title variants with the standard rules.
/// 4. Aggregate frequency tables and time-bucket series.
/// 5. Summarize and return an [`AnalysisReport`].
///
/// Returns [`InsightError::EmptyDataset`] when no records survive cleaning.
pub fn analyze_archive(path: &Path, options: &AnalysisOptions) -> Result<AnalysisReport> {
    // ── Step 1: Load archive ──────────────────────────────────────────────────
    let load_start = std::time::Instant::now();
    let contents = load_archive(path)?;
    let load_time = load_start.elapsed().as_secs_f64();
    let records_loaded = contents.connections.rows.len();
    let messages = contents.messages;
    debug!(
        "Loaded {} connection rows and {} messages from {}",
        records_loaded,
        messages.len(),
        path.display()
    );

    // ── Step 2: Normalize ─────────────────────────────────────────────────────
    let transform_start = std::time::Instant::now();
    let config = match &options.denylist {
        Some(pattern) => NormalizerConfig::with_denylist(options.privacy, pattern)?,
        None => NormalizerConfig {
            privacy: options.privacy,
            ..NormalizerConfig::default()
        },
    };
    let records = normalize(&contents.connections, &config)?;

    // ── Step 3: Consolidate titles ────────────────────────────────────────────
    let rules = standard_rules(options.ds_threshold, options.swe_threshold);
    let records = apply_rules(records, &rules, &TokenSetScorer)?;
    if records.is_empty() {
        return Err(InsightError::EmptyDataset);
    }

    // ── Step 4: Aggregate ─────────────────────────────────────────────────────
    let companies = aggregate(&records, "company")?;
    let positions = aggregate(&records, "position")?;
    let (senders, recipients, message_hours) = if messages.is_empty() {
        (None, None, None)
    } else {
        (
            Some(aggregate(&messages, "from")?),
            Some(aggregate(&messages, "to")?),
            Some(by_hour(&messages)),
        )
    };
    let timeline = by_date(&records);
    let weekdays = by_weekday(&records);
    let cumulative = cumulative_by_date(&records);

    // ── Step 5: Summarize ─────────────────────────────────────────────────────
    let summary = summarize(&records, &companies, &positions)?;
    let transform_time = transform_start.elapsed().as_secs_f64();

    info!(
        "Analyzed {}: kept {}/{} connections across {} companies",
        path.display(),
        records.len(),
        records_loaded,
        companies.len()
    );

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        records_loaded,
        records_kept: records.len(),
        messages_loaded: messages.len(),
        load_time_seconds: load_time,
        transform_time_seconds: transform_time,
    };

    Ok(AnalysisReport {
        records,
        messages,
        companies,
        positions,
        senders,
        recipients,
        timeline,
        weekdays,
        message_hours,
        cumulative,
        summary,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const CONNECTIONS_CSV: &str = "\
Notes:,,,,,
\"When exporting your connection data, you may be missing information\",,,,,
Export prepared for you,,,,,
First Name,Last Name,Email Address,Company,Position,Connected On
Alice,Anderson,alice@example.com,Acme Corp,Data Scientist,20 Aug 2021
Bob,Brown,,Acme Corp,Data Scientists,21 Aug 2021
Carol,Clark,,Beta LLC,Manager,22 Aug 2021
Dave,Davis,,Freelance,Consultant,22 Aug 2021
";

    const MESSAGES_CSV: &str = "\
CONVERSATION ID,FROM,TO,DATE,SUBJECT,CONTENT
c1,Alice Anderson,Me,2021-08-22 09:15:03 UTC,Hello,Hi there
c2,Me,Bob Brown,2021-08-22 17:40:00 UTC,,Following up
";

    fn write_archive_dir(dir: &std::path::Path) {
        let mut f = std::fs::File::create(dir.join("Connections.csv")).unwrap();
        f.write_all(CONNECTIONS_CSV.as_bytes()).unwrap();
        let mut f = std::fs::File::create(dir.join("messages.csv")).unwrap();
        f.write_all(MESSAGES_CSV.as_bytes()).unwrap();
    }

    #[test]
    fn test_analyze_archive_end_to_end() {
        let dir = TempDir::new().unwrap();
        write_archive_dir(dir.path());

        let report = analyze_archive(dir.path(), &AnalysisOptions::default()).unwrap();

        // Dave (Freelance) is denylisted; the plural title is consolidated.
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.summary.total_connections, 3);
        assert_eq!(report.companies.rows[0].value, "Acme Corp");
        assert_eq!(report.positions.count_of("Data Scientist"), Some(2));
        assert_eq!(report.metadata.records_loaded, 4);
        assert_eq!(report.metadata.records_kept, 3);
        assert_eq!(report.metadata.messages_loaded, 2);
        assert_eq!(report.cumulative.buckets.last().unwrap().running_total, 3);
    }

    #[test]
    fn test_analyze_archive_message_aggregates_present() {
        let dir = TempDir::new().unwrap();
        write_archive_dir(dir.path());

        let report = analyze_archive(dir.path(), &AnalysisOptions::default()).unwrap();

        let senders = report.senders.unwrap();
        assert_eq!(senders.count_of("Alice Anderson"), Some(1));
        let hours = report.message_hours.unwrap();
        assert_eq!(hours.buckets.len(), 24);
        assert_eq!(hours.buckets[9].count, 1);
        assert_eq!(hours.buckets[17].count, 1);
    }

    #[test]
    fn test_analyze_archive_without_messages() {
        let dir = TempDir::new().unwrap();
        let mut f = std::fs::File::create(dir.path().join("Connections.csv")).unwrap();
        f.write_all(CONNECTIONS_CSV.as_bytes()).unwrap();

        let report = analyze_archive(dir.path(), &AnalysisOptions::default()).unwrap();

        assert!(report.messages.is_empty());
        assert!(report.senders.is_none());
        assert!(report.message_hours.is_none());
        assert_eq!(report.metadata.messages_loaded, 0);
    }

    #[test]
    fn test_analyze_archive_privacy_mode() {
        let dir = TempDir::new().unwrap();
        write_archive_dir(dir.path());

        let options = AnalysisOptions {
            privacy: true,
            ..AnalysisOptions::default()
        };
        let report = analyze_archive(dir.path(), &options).unwrap();

        assert!(report.records.iter().all(|r| r.name.is_empty()));
        assert!(report.records.iter().all(|r| r.email.is_none()));
        assert_eq!(report.summary.emails_shared, 0);
    }

    #[test]
    fn test_analyze_archive_custom_denylist() {
        let dir = TempDir::new().unwrap();
        write_archive_dir(dir.path());

        let options = AnalysisOptions {
            denylist: Some(r"(?i)beta".to_string()),
            ..AnalysisOptions::default()
        };
        let report = analyze_archive(dir.path(), &options).unwrap();

        // Beta LLC is filtered, Freelance survives under the custom pattern.
        assert!(report.companies.count_of("Beta LLC").is_none());
        assert_eq!(report.companies.count_of("Freelance"), Some(1));
    }

    #[test]
    fn test_analyze_archive_empty_after_filtering() {
        let dir = TempDir::new().unwrap();
        let csv = "\
a,,,,,
b,,,,,
c,,,,,
First Name,Last Name,Email Address,Company,Position,Connected On
Dave,Davis,,Freelance,Consultant,22 Aug 2021
";
        let mut f = std::fs::File::create(dir.path().join("Connections.csv")).unwrap();
        f.write_all(csv.as_bytes()).unwrap();

        let err = analyze_archive(dir.path(), &AnalysisOptions::default()).unwrap_err();
        assert!(matches!(err, InsightError::EmptyDataset));
    }

    #[test]
    fn test_analyze_archive_missing_path() {
        let dir = TempDir::new().unwrap();
        let err = analyze_archive(&dir.path().join("nope.zip"), &AnalysisOptions::default())
            .unwrap_err();
        assert!(matches!(err, InsightError::FileRead { .. }));
    }
}

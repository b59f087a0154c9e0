//! Archive discovery and loading for linknet.
//!
//! Opens an exported connections archive (a zip, or an already-extracted
//! directory), locates the connections CSV and the optional message-log CSV,
//! and turns them into a [`RawTable`] plus typed [`MessageRecord`]s for
//! downstream processing.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use csv::ReaderBuilder;
use linknet_core::error::{InsightError, Result};
use linknet_core::models::{MessageRecord, RawTable};
use tracing::{debug, warn};

use crate::normalizer::canonicalize_header;

/// Number of metadata preamble records before the real header row in the
/// connections file.
pub const METADATA_ROWS: usize = 3;

// ── Public API ────────────────────────────────────────────────────────────────

/// Everything read out of one uploaded archive.
#[derive(Debug, Clone)]
pub struct ArchiveContents {
    /// The primary connections table, pre-normalization.
    pub connections: RawTable,
    /// Parsed message-log rows; empty when the archive has no message file.
    pub messages: Vec<MessageRecord>,
}

/// Load an archive from `path`.
///
/// `path` may be a zip file or an already-extracted directory. Zip contents
/// are extracted into a temporary directory that is deleted when this
/// function returns, on both the success and the error path.
pub fn load_archive(path: &Path) -> Result<ArchiveContents> {
    if path.is_dir() {
        return load_directory(path);
    }

    let file = File::open(path).map_err(|e| InsightError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| InsightError::ArchiveFormat(e.to_string()))?;

    // Ephemeral extraction area, released unconditionally on scope exit.
    let extraction = tempfile::TempDir::new()?;
    archive.extract(extraction.path())?;

    load_directory(extraction.path())
}

/// Load archive contents from an extracted directory tree.
///
/// The connections file is the CSV whose name contains `connection`
/// (case-insensitive), or the sole CSV in the tree; the message log is the
/// CSV whose name contains `message`.
pub fn load_directory(dir: &Path) -> Result<ArchiveContents> {
    let csv_files = find_csv_files(dir);
    if csv_files.is_empty() {
        return Err(InsightError::ArchiveFormat(format!(
            "no CSV files found in {}",
            dir.display()
        )));
    }

    let connections_path = locate(&csv_files, "connection")
        .or_else(|| {
            if csv_files.len() == 1 {
                Some(csv_files[0].clone())
            } else {
                None
            }
        })
        .ok_or_else(|| {
            InsightError::ArchiveFormat("no connections CSV found in archive".to_string())
        })?;

    let connections = read_raw_table(&connections_path)?;

    let messages = match locate(&csv_files, "message") {
        Some(path) => read_messages(&path)?,
        None => Vec::new(),
    };

    debug!(
        "Loaded {} connection rows and {} messages from {}",
        connections.rows.len(),
        messages.len(),
        dir.display()
    );

    Ok(ArchiveContents {
        connections,
        messages,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `dir`, sorted by path.
fn find_csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// First CSV whose file name contains `needle`, case-insensitive.
fn locate(files: &[PathBuf], needle: &str) -> Option<PathBuf> {
    files
        .iter()
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_lowercase().contains(needle))
                .unwrap_or(false)
        })
        .cloned()
}

/// Read the connections CSV into a [`RawTable`], skipping the fixed-size
/// metadata preamble before the header row.
fn read_raw_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path).map_err(|e| InsightError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if i < METADATA_ROWS {
            continue;
        }
        if i == METADATA_ROWS {
            headers = record.iter().map(str::to_string).collect();
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    if headers.is_empty() {
        return Err(InsightError::ArchiveFormat(format!(
            "connections file {} has no header row after the {}-row preamble",
            path.display(),
            METADATA_ROWS
        )));
    }

    Ok(RawTable { headers, rows })
}

/// Read the message-log CSV into typed [`MessageRecord`]s.
///
/// The message file is secondary data: rows with an unparsable timestamp are
/// skipped with a warning rather than failing the load.
fn read_messages(path: &Path) -> Result<Vec<MessageRecord>> {
    let file = File::open(path).map_err(|e| InsightError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(canonicalize_header)
        .collect();

    let col = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| InsightError::MissingRequiredColumn(name.to_string()))
    };

    let conversation_idx = col("conversation_id")?;
    let from_idx = col("from")?;
    let to_idx = col("to")?;
    let date_idx = col("date")?;
    let subject_idx = headers.iter().position(|h| h == "subject");
    let content_idx = headers.iter().position(|h| h == "content");

    let mut messages = Vec::new();
    let mut skipped = 0u64;

    for record in reader.records() {
        let record = record?;
        let get = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        let date_str = get(date_idx);
        let Some(sent_at) = parse_message_timestamp(&date_str) else {
            warn!("Skipping message row with unparsable date \"{}\"", date_str);
            skipped += 1;
            continue;
        };

        let subject = subject_idx.map(get).filter(|s| !s.is_empty());

        messages.push(MessageRecord {
            conversation_id: get(conversation_idx),
            from: get(from_idx),
            to: get(to_idx),
            sent_at,
            subject,
            content: content_idx.map(get).unwrap_or_default(),
        });
    }

    if skipped > 0 {
        debug!("Skipped {} message rows with unparsable dates", skipped);
    }

    Ok(messages)
}

/// Parse a message timestamp of the form `"2021-06-06 13:51:53 UTC"`.
///
/// Falls back to RFC 3339 for robustness; returns `None` on failure.
fn parse_message_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let without_zone = trimmed.strip_suffix(" UTC").unwrap_or(trimmed);
    if let Ok(naive) = NaiveDateTime::parse_from_str(without_zone, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters kept in a company name.
pub const COMPANY_MAX_LEN: usize = 35;

/// Truncate `s` to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ── RawTable ──────────────────────────────────────────────────────────────────

/// A parsed tabular file before normalization: one header row plus data rows.
///
/// Rows may be ragged when the source file is malformed; consumers index
/// fields through [`RawTable::column_index`] and treat missing cells as empty.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names exactly as they appear in the source file.
    pub headers: Vec<String>,
    /// Data rows, one `Vec<String>` per record.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Index of the column named `name`, or `None` if absent.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// The cell at (`row`, `column`), or `None` when the row is too short.
    pub fn cell<'a>(&self, row: &'a [String], column: usize) -> Option<&'a str> {
        row.get(column).map(|s| s.as_str())
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// One cleaned contact row from the connections file.
///
/// Immutable once the normalizer and title consolidator have run; company and
/// position are always non-empty, and company is at most
/// [`COMPANY_MAX_LEN`] characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Full name, first and last joined with a single space. Empty in
    /// privacy mode.
    #[serde(default)]
    pub name: String,
    /// Employer name, truncated to [`COMPANY_MAX_LEN`] characters.
    pub company: String,
    /// Free-text job title.
    pub position: String,
    /// Calendar date the connection was made (no time component).
    pub connected_on: NaiveDate,
    /// Email address, present only when the contact shared it.
    #[serde(default)]
    pub email: Option<String>,
}

/// One row from the optional message-log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Identifier of the conversation thread.
    pub conversation_id: String,
    /// Sender display name.
    pub from: String,
    /// Recipient display name.
    pub to: String,
    /// When the message was sent, normalized to UTC.
    pub sent_at: DateTime<Utc>,
    /// Subject line, when present.
    #[serde(default)]
    pub subject: Option<String>,
    /// Message body.
    #[serde(default)]
    pub content: String,
}

// ── Tabular ───────────────────────────────────────────────────────────────────

/// Column access over a typed record, the seam between records and the
/// aggregator.
///
/// `field` returns `None` both for an unknown column and for a null value;
/// callers distinguish the two by checking [`Tabular::columns`] first.
pub trait Tabular {
    /// Names of the categorical columns this record type exposes.
    fn columns() -> &'static [&'static str];

    /// Value of `column` for this record, `None` when absent.
    fn field(&self, column: &str) -> Option<&str>;
}

impl Tabular for ConnectionRecord {
    fn columns() -> &'static [&'static str] {
        &["name", "company", "position", "email"]
    }

    fn field(&self, column: &str) -> Option<&str> {
        match column {
            "name" => Some(self.name.as_str()),
            "company" => Some(self.company.as_str()),
            "position" => Some(self.position.as_str()),
            "email" => self.email.as_deref(),
            _ => None,
        }
    }
}

impl Tabular for MessageRecord {
    fn columns() -> &'static [&'static str] {
        &["conversation_id", "from", "to", "subject"]
    }

    fn field(&self, column: &str) -> Option<&str> {
        match column {
            "conversation_id" => Some(self.conversation_id.as_str()),
            "from" => Some(self.from.as_str()),
            "to" => Some(self.to.as_str()),
            "subject" => self.subject.as_deref(),
            _ => None,
        }
    }
}

// ── AggregateTable ────────────────────────────────────────────────────────────

/// One (category value, count) pair in an [`AggregateTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Distinct category value.
    pub value: String,
    /// Number of records holding that value.
    pub count: u64,
}

/// Frequency table over one categorical column.
///
/// Rows are sorted by count descending; ties keep the order in which the
/// values first appeared in the input. Values are unique within one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateTable {
    /// The column this table was aggregated over.
    pub column: String,
    /// Sorted (value, count) rows.
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    /// Number of distinct category values.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first `n` rows (the table is already sorted by count).
    pub fn top_n(&self, n: usize) -> &[AggregateRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Count for `value`, or `None` when the value is not in the table.
    pub fn count_of(&self, value: &str) -> Option<u64> {
        self.rows.iter().find(|r| r.value == value).map(|r| r.count)
    }

    /// Largest count in the table (first row).
    pub fn max_count(&self) -> Option<u64> {
        self.rows.first().map(|r| r.count)
    }

    /// Smallest count in the table (last row).
    pub fn min_count(&self) -> Option<u64> {
        self.rows.last().map(|r| r.count)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }
}

// ── Time-bucketed series ──────────────────────────────────────────────────────

/// One (bucket key, count) pair in a [`TimeBucketSeries`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucket {
    /// Bucket key: a date (`"2021-08-22"`), weekday name, or zero-padded
    /// hour of day.
    pub key: String,
    /// Number of records in the bucket.
    pub count: u64,
}

/// Ordered sequence of time buckets.
///
/// Keys are unique; ordering is chronological for dates and hours, and the
/// fixed Monday→Sunday order for weekdays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeBucketSeries {
    pub buckets: Vec<TimeBucket>,
}

impl TimeBucketSeries {
    /// Sum of all bucket counts.
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

/// One date bucket carrying a running total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeBucket {
    /// Date key, `"%Y-%m-%d"`.
    pub key: String,
    /// Count for this date alone.
    pub count: u64,
    /// Running sum of counts up to and including this date.
    pub running_total: u64,
}

/// Chronologically ascending cumulative series over connection dates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CumulativeSeries {
    pub buckets: Vec<CumulativeBucket>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(company: &str, position: &str) -> ConnectionRecord {
        ConnectionRecord {
            name: "Ada Lovelace".to_string(),
            company: company.to_string(),
            position: position.to_string(),
            connected_on: NaiveDate::from_ymd_opt(2021, 8, 22).unwrap(),
            email: None,
        }
    }

    // ── truncate_chars ────────────────────────────────────────────────────────

    #[test]
    fn test_truncate_chars_shorter_than_max() {
        assert_eq!(truncate_chars("Acme", 35), "Acme");
    }

    #[test]
    fn test_truncate_chars_cuts_at_max() {
        let long = "a".repeat(40);
        assert_eq!(truncate_chars(&long, 35).chars().count(), 35);
    }

    #[test]
    fn test_truncate_chars_multibyte_safe() {
        // Each 'é' is two bytes; truncation must count characters.
        let s = "ééééé";
        assert_eq!(truncate_chars(s, 3), "ééé");
    }

    // ── RawTable ──────────────────────────────────────────────────────────────

    #[test]
    fn test_raw_table_column_index() {
        let table = RawTable {
            headers: vec!["first_name".to_string(), "company".to_string()],
            rows: vec![],
        };
        assert_eq!(table.column_index("company"), Some(1));
        assert_eq!(table.column_index("missing"), None);
    }

    #[test]
    fn test_raw_table_cell_ragged_row() {
        let table = RawTable {
            headers: vec!["a".to_string(), "b".to_string()],
            rows: vec![],
        };
        let short_row = vec!["only".to_string()];
        assert_eq!(table.cell(&short_row, 0), Some("only"));
        assert_eq!(table.cell(&short_row, 1), None);
    }

    // ── Tabular ───────────────────────────────────────────────────────────────

    #[test]
    fn test_connection_record_field_access() {
        let r = record("Acme Corp", "Data Scientist");
        assert_eq!(r.field("company"), Some("Acme Corp"));
        assert_eq!(r.field("position"), Some("Data Scientist"));
        assert_eq!(r.field("name"), Some("Ada Lovelace"));
        assert_eq!(r.field("email"), None);
        assert_eq!(r.field("salary"), None);
    }

    #[test]
    fn test_connection_record_columns_list() {
        assert!(ConnectionRecord::columns().contains(&"company"));
        assert!(!ConnectionRecord::columns().contains(&"connected_on"));
    }

    #[test]
    fn test_message_record_field_access() {
        let m = MessageRecord {
            conversation_id: "c-1".to_string(),
            from: "Ada".to_string(),
            to: "Grace".to_string(),
            sent_at: DateTime::parse_from_rfc3339("2021-06-06T13:51:53Z")
                .unwrap()
                .with_timezone(&Utc),
            subject: None,
            content: "hello".to_string(),
        };
        assert_eq!(m.field("from"), Some("Ada"));
        assert_eq!(m.field("to"), Some("Grace"));
        assert_eq!(m.field("subject"), None);
        assert_eq!(m.field("content"), None); // content is not categorical
    }

    // ── AggregateTable ────────────────────────────────────────────────────────

    fn sample_table() -> AggregateTable {
        AggregateTable {
            column: "company".to_string(),
            rows: vec![
                AggregateRow {
                    value: "Acme Corp".to_string(),
                    count: 5,
                },
                AggregateRow {
                    value: "Beta LLC".to_string(),
                    count: 2,
                },
                AggregateRow {
                    value: "Gamma Inc".to_string(),
                    count: 1,
                },
            ],
        }
    }

    #[test]
    fn test_aggregate_table_top_n() {
        let table = sample_table();
        assert_eq!(table.top_n(2).len(), 2);
        assert_eq!(table.top_n(2)[0].value, "Acme Corp");
        // n larger than the table is clamped.
        assert_eq!(table.top_n(10).len(), 3);
        assert_eq!(table.top_n(0).len(), 0);
    }

    #[test]
    fn test_aggregate_table_bounds() {
        let table = sample_table();
        assert_eq!(table.max_count(), Some(5));
        assert_eq!(table.min_count(), Some(1));
        assert_eq!(table.total(), 8);
        assert_eq!(table.count_of("Beta LLC"), Some(2));
        assert_eq!(table.count_of("Nowhere"), None);
    }

    #[test]
    fn test_aggregate_table_empty() {
        let table = AggregateTable {
            column: "company".to_string(),
            rows: vec![],
        };
        assert!(table.is_empty());
        assert_eq!(table.max_count(), None);
        assert_eq!(table.min_count(), None);
        assert_eq!(table.total(), 0);
    }

    // ── TimeBucketSeries ──────────────────────────────────────────────────────

    #[test]
    fn test_time_bucket_series_total() {
        let series = TimeBucketSeries {
            buckets: vec![
                TimeBucket {
                    key: "2021-08-21".to_string(),
                    count: 3,
                },
                TimeBucket {
                    key: "2021-08-22".to_string(),
                    count: 4,
                },
            ],
        };
        assert_eq!(series.total(), 7);
    }
}

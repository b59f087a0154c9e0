//! Plain-text report rendering for the terminal.

use linknet_core::formatting::{format_count, shorten};
use linknet_core::models::{AggregateTable, TimeBucketSeries};
use linknet_data::analysis::AnalysisReport;
use linknet_data::summary::InsightsSummary;

const VALUE_WIDTH: usize = 38;

/// Render the whole report to a string; `main` prints it in one write.
pub fn render(report: &AnalysisReport, top_n: usize) -> String {
    let mut out = String::new();

    render_summary(&mut out, &report.summary);

    render_table(&mut out, "Top companies", &report.companies, top_n);
    render_table(&mut out, "Top positions", &report.positions, top_n);
    if let Some(senders) = &report.senders {
        render_table(&mut out, "Top message senders", senders, top_n);
    }
    if let Some(recipients) = &report.recipients {
        render_table(&mut out, "Top message recipients", recipients, top_n);
    }

    render_series(&mut out, "Connections per weekday", &report.weekdays);
    if let Some(hours) = &report.message_hours {
        render_series(&mut out, "Messages per hour", hours);
    }

    out.push_str(&format!(
        "\nAnalyzed {} rows in {:.2}s (load) + {:.2}s (transform)\n",
        format_count(report.metadata.records_loaded as u64),
        report.metadata.load_time_seconds,
        report.metadata.transform_time_seconds,
    ));

    out
}

fn render_summary(out: &mut String, summary: &InsightsSummary) {
    out.push_str("── Summary ──\n");
    push_row(
        out,
        "Total connections",
        &format_count(summary.total_connections),
    );
    push_row(
        out,
        "Top company",
        &format!(
            "{} ({})",
            shorten(&summary.top_company, VALUE_WIDTH),
            format_count(summary.top_company_count)
        ),
    );
    if let Some(second) = &summary.second_company {
        push_row(out, "Runner-up company", &shorten(second, VALUE_WIDTH));
    }
    push_row(
        out,
        "Top position",
        &format!(
            "{} ({})",
            shorten(&summary.top_position, VALUE_WIDTH),
            format_count(summary.top_position_count)
        ),
    );
    push_row(
        out,
        "First connection",
        &summary.first_connection.connected_on,
    );
    push_row(
        out,
        "Latest connection",
        &summary.latest_connection.connected_on,
    );
    push_row(out, "Emails shared", &format_count(summary.emails_shared));
    push_row(out, "New this month", &format_count(summary.new_this_month));
}

fn render_table(out: &mut String, title: &str, table: &AggregateTable, top_n: usize) {
    if top_n == 0 || table.is_empty() {
        return;
    }
    out.push_str(&format!("\n── {} ──\n", title));
    for row in table.top_n(top_n) {
        out.push_str(&format!(
            "  {:<width$} {:>7}\n",
            shorten(&row.value, VALUE_WIDTH),
            format_count(row.count),
            width = VALUE_WIDTH + 3
        ));
    }
}

fn render_series(out: &mut String, title: &str, series: &TimeBucketSeries) {
    if series.buckets.is_empty() {
        return;
    }
    out.push_str(&format!("\n── {} ──\n", title));
    let max = series.buckets.iter().map(|b| b.count).max().unwrap_or(0);
    for bucket in &series.buckets {
        let bar_len = if max == 0 {
            0
        } else {
            (bucket.count * 40 / max) as usize
        };
        out.push_str(&format!(
            "  {:<9} {:>7} {}\n",
            bucket.key,
            format_count(bucket.count),
            "#".repeat(bar_len)
        ));
    }
}

fn push_row(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("  {:<20} {}\n", label, value));
}

// ── Tests ─────────────────────────────────────────────────────────────────────

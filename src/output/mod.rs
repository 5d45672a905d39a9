//! Plain-text table and age formatting for staged artifacts

use chrono::{DateTime, Utc};

/// Rendered for any missing field
pub const NOT_AVAILABLE: &str = "N/A";

/// Format raw headers and rows as a table
///
/// Columns are left-aligned and separated by two spaces. Cells beyond the
/// header count are ignored and missing trailing cells render empty.
pub fn format_table_raw(headers: &[&str], rows: &[Vec<String>]) -> String {
    // Calculate column widths
    let num_cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();

    for row in rows {
        for (i, cell) in row.iter().enumerate().take(num_cols) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_line(&mut output, &header_cells, &widths);

    for row in rows {
        push_line(&mut output, row, &widths);
    }

    output
}

fn push_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let padding = width.saturating_sub(cell.chars().count());
        line.push_str(cell);
        line.push_str(&" ".repeat(padding + 2));
    }
    output.push_str(line.trim_end());
    output.push('\n');
}

/// A row of `N/A` placeholders
pub fn placeholder_row(columns: usize) -> Vec<String> {
    vec![NOT_AVAILABLE.to_string(); columns]
}

/// Render a table that always has at least one data row
///
/// Summary files are never empty: an empty collection renders a single row
/// of placeholders, one per header.
pub fn render_table(headers: &[&str], mut rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        rows.push(placeholder_row(headers.len()));
    }
    format_table_raw(headers, &rows)
}

/// Elapsed time between `then` and `now` as `{days}d {hours}h {minutes}m`
///
/// Truncated to the minute. Timestamps in the future render as zero.
pub fn format_age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let minutes = now.signed_duration_since(then).num_minutes().max(0);
    format!("{}d {}h {}m", minutes / (24 * 60), (minutes / 60) % 24, minutes % 60)
}

/// Like [`format_age`], rendering `N/A` when the timestamp is absent
pub fn format_age_or_na(now: DateTime<Utc>, then: Option<DateTime<Utc>>) -> String {
    then.map(|t| format_age(now, t))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Collapse a possibly multi-line value onto one table line
pub fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

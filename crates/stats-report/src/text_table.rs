//! Plain-text tables for the totals report and the monthly pivot.
//!
//! Columns are padded by display width, so names with combining marks or
//! wide CJK characters still line up in a terminal.

use stats_core::formatting::{format_count, format_percentage};
use stats_core::models::Metric;
use stats_data::aggregator::{ContactTotals, PivotTable, TotalsTable};
use unicode_width::UnicodeWidthStr;

const COLUMN_GAP: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// A header, body rows and an optional footer, rendered with aligned columns.
#[derive(Debug, Clone)]
struct TextTable {
    headers: Vec<String>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
    footer: Option<Vec<String>>,
}

impl TextTable {
    fn new(headers: Vec<String>) -> Self {
        // First column is a label, everything after it is numeric.
        let align = (0..headers.len())
            .map(|i| if i == 0 { Align::Left } else { Align::Right })
            .collect();
        Self {
            headers,
            align,
            rows: Vec::new(),
            footer: None,
        }
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in self.rows.iter().chain(self.footer.iter()) {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.width());
                }
            }
        }
        widths
    }

    fn render(&self) -> String {
        let widths = self.widths();
        let rule = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP);

        let mut out = String::new();
        out.push_str(&self.line(&self.headers, &widths));
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&self.line(row, &widths));
            out.push('\n');
        }
        if let Some(footer) = &self.footer {
            out.push_str(&rule);
            out.push('\n');
            out.push_str(&self.line(footer, &widths));
            out.push('\n');
        }
        out
    }

    fn line(&self, cells: &[String], widths: &[usize]) -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .zip(&self.align)
            .map(|((cell, width), align)| pad(cell, *width, *align))
            .collect();
        padded.join(COLUMN_GAP).trim_end().to_string()
    }
}

fn pad(cell: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.width()));
    match align {
        Align::Left => format!("{cell}{fill}"),
        Align::Right => format!("{fill}{cell}"),
    }
}

// ── Public renderers ──────────────────────────────────────────────────────────

/// Render the all-time totals with a TOTAL footer and a share-of-messages column.
pub fn render_totals(totals: &TotalsTable) -> String {
    let headers = [
        "Friend",
        "Sent",
        "Sent chars",
        "Received",
        "Received chars",
        "Total",
        "Total chars",
        "Share",
    ];
    let mut table = TextTable::new(headers.iter().map(|h| h.to_string()).collect());

    let grand = totals.grand_total();
    let whole = grand.total_count();
    let cells = |c: &ContactTotals| {
        vec![
            c.counterparty.clone(),
            format_count(c.sent.count),
            format_count(c.sent.length),
            format_count(c.received.count),
            format_count(c.received.length),
            format_count(c.total_count()),
            format_count(c.total_length()),
            format_percentage(c.total_count(), whole),
        ]
    };

    table.rows = totals.rows.iter().map(cells).collect();
    table.footer = Some(cells(&grand));
    table.render()
}

/// Render the monthly pivot, one row per month plus a per-month total column.
pub fn render_monthly(pivot: &PivotTable) -> String {
    let mut headers = Vec::with_capacity(pivot.columns.len() + 2);
    headers.push("Month".to_string());
    headers.extend(pivot.columns.iter().cloned());
    headers.push(total_label(pivot.metric).to_string());
    let mut table = TextTable::new(headers);

    let mut column_sums = vec![0u64; pivot.columns.len()];
    for (month, values) in pivot.months.iter().zip(&pivot.values) {
        let mut row = Vec::with_capacity(values.len() + 2);
        row.push(month.to_string());
        row.extend(values.iter().map(|v| format_count(*v)));
        row.push(format_count(values.iter().sum()));
        for (sum, v) in column_sums.iter_mut().zip(values) {
            *sum += v;
        }
        table.rows.push(row);
    }

    if !table.rows.is_empty() {
        let mut footer = Vec::with_capacity(column_sums.len() + 2);
        footer.push("TOTAL".to_string());
        footer.extend(column_sums.iter().map(|v| format_count(*v)));
        footer.push(format_count(column_sums.iter().sum()));
        table.footer = Some(footer);
    }
    table.render()
}

fn total_label(metric: Metric) -> &'static str {
    match metric {
        Metric::Count => "Messages",
        Metric::Length => "Characters",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

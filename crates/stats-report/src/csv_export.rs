//! Delimited-text export of the totals and monthly tables.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use stats_data::aggregator::{PivotTable, TotalsTable};

use crate::error::{ReportError, Result};

/// Header of the all-time totals CSV.
pub const TOTALS_HEADER: [&str; 7] = [
    "friend",
    "sent_count",
    "sent_length",
    "received_count",
    "received_length",
    "total_count",
    "total_length",
];

/// Label of the first column of the monthly CSV.
pub const MONTH_COLUMN: &str = "month";

/// Write one row per counterparty.
pub fn write_totals_csv<W: Write>(writer: W, totals: &TotalsTable) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(TOTALS_HEADER)?;
    for row in &totals.rows {
        wtr.write_record([
            row.counterparty.clone(),
            row.sent.count.to_string(),
            row.sent.length.to_string(),
            row.received.count.to_string(),
            row.received.length.to_string(),
            row.total_count().to_string(),
            row.total_length().to_string(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write one row per month with a column per counterparty.
pub fn write_monthly_csv<W: Write>(writer: W, pivot: &PivotTable) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(pivot.columns.len() + 1);
    header.push(MONTH_COLUMN.to_string());
    header.extend(pivot.columns.iter().cloned());
    wtr.write_record(&header)?;

    for (month, values) in pivot.months.iter().zip(&pivot.values) {
        let mut record = Vec::with_capacity(values.len() + 1);
        record.push(month.to_string());
        record.extend(values.iter().map(u64::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Create `path` for writing, attaching the path to any failure.
pub(crate) fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use stats_core::models::{Direction, FriendFilter, MessageEvent, Metric};
    use stats_core::time_utils::ReportTimezone;
    use stats_data::aggregator::MessageAggregator;

    fn event(counterparty: &str, direction: Direction, length: u64, ts: &str) -> MessageEvent {
        MessageEvent {
            counterparty: counterparty.to_string(),
            direction,
            length,
            timestamp: DateTime::parse_from_rfc3339(ts)
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn sample() -> Vec<MessageEvent> {
        vec![
            event("Alice", Direction::Sent, 5, "2024-01-05T10:00:00Z"),
            event("Alice", Direction::Received, 3, "2024-01-06T10:00:00Z"),
            event("Alice", Direction::Received, 4, "2024-01-07T10:00:00Z"),
            event("Smith, Bob", Direction::Received, 10, "2024-03-01T10:00:00Z"),
        ]
    }

    fn to_string<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut buf = Vec::new();
        write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_totals_csv() {
        let totals = MessageAggregator::totals(&sample());
        let out = to_string(|buf| write_totals_csv(buf, &totals));
        assert_eq!(
            out,
            "friend,sent_count,sent_length,received_count,received_length,total_count,total_length\n\
             Alice,1,5,2,7,3,12\n\
             \"Smith, Bob\",0,0,1,10,1,10\n"
        );
    }

    #[test]
    fn test_totals_csv_empty_is_header_only() {
        let totals = MessageAggregator::totals(&[]);
        let out = to_string(|buf| write_totals_csv(buf, &totals));
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("friend,"));
    }

    #[test]
    fn test_monthly_csv_counts() {
        let table =
            MessageAggregator::monthly(&sample(), &FriendFilter::All, &ReportTimezone::utc());
        let out = to_string(|buf| write_monthly_csv(buf, &table.pivot(Metric::Count)));
        assert_eq!(
            out,
            "month,Alice,\"Smith, Bob\"\n\
             2024-01,3,0\n\
             2024-02,0,0\n\
             2024-03,0,1\n"
        );
    }

    #[test]
    fn test_monthly_csv_lengths() {
        let table =
            MessageAggregator::monthly(&sample(), &FriendFilter::All, &ReportTimezone::utc());
        let out = to_string(|buf| write_monthly_csv(buf, &table.pivot(Metric::Length)));
        assert!(out.contains("2024-01,12,0\n"));
        assert!(out.contains("2024-03,0,10\n"));
    }

    #[test]
    fn test_monthly_csv_empty_is_header_only() {
        let filter = FriendFilter::from_names(&["Nobody"]);
        let table = MessageAggregator::monthly(&sample(), &filter, &ReportTimezone::utc());
        let out = to_string(|buf| write_monthly_csv(buf, &table.pivot(Metric::Count)));
        assert_eq!(out, "month\n");
    }
}

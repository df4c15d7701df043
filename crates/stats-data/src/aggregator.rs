//! Per-contact aggregation over all time and per calendar month.
//!
//! Counterparties are ordered alphabetically and months chronologically, so
//! the tables produced here are identical across runs on the same input.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use stats_core::models::{Direction, FriendFilter, MessageEvent, Metric};
use stats_core::time_utils::{month_range, Month, ReportTimezone};
use tracing::debug;

// ── DirectionStats ────────────────────────────────────────────────────────────

/// Message count and summed length for one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionStats {
    pub count: u64,
    pub length: u64,
}

impl DirectionStats {
    fn add(&mut self, length: u64) {
        self.count += 1;
        self.length += length;
    }
}

// ── ContactTotals ─────────────────────────────────────────────────────────────

/// All-time sent/received totals for one counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactTotals {
    pub counterparty: String,
    pub sent: DirectionStats,
    pub received: DirectionStats,
}

impl ContactTotals {
    fn new(counterparty: impl Into<String>) -> Self {
        Self {
            counterparty: counterparty.into(),
            sent: DirectionStats::default(),
            received: DirectionStats::default(),
        }
    }

    fn add_event(&mut self, event: &MessageEvent) {
        match event.direction {
            Direction::Sent => self.sent.add(event.length),
            Direction::Received => self.received.add(event.length),
        }
    }

    pub fn total_count(&self) -> u64 {
        self.sent.count + self.received.count
    }

    pub fn total_length(&self) -> u64 {
        self.sent.length + self.received.length
    }
}

/// The all-time table, one row per counterparty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsTable {
    pub rows: Vec<ContactTotals>,
}

impl TotalsTable {
    pub fn get(&self, counterparty: &str) -> Option<&ContactTotals> {
        self.rows
            .binary_search_by(|row| row.counterparty.as_str().cmp(counterparty))
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn counterparties(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.counterparty.as_str())
    }

    /// Sum of every row, labelled `"TOTAL"`.
    pub fn grand_total(&self) -> ContactTotals {
        let mut total = ContactTotals::new("TOTAL");
        for row in &self.rows {
            total.sent.count += row.sent.count;
            total.sent.length += row.sent.length;
            total.received.count += row.received.count;
            total.received.length += row.received.length;
        }
        total
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── Monthly buckets ───────────────────────────────────────────────────────────

/// `(month, counterparty)` key of the monthly table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthlyBucket {
    pub month: Month,
    pub counterparty: String,
}

/// Counts and length sums for one monthly bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub bucket: MonthlyBucket,
    pub sent_count: u64,
    pub received_count: u64,
    pub sent_length_sum: u64,
    pub received_length_sum: u64,
}

impl AggregateRow {
    fn empty(bucket: MonthlyBucket) -> Self {
        Self {
            bucket,
            sent_count: 0,
            received_count: 0,
            sent_length_sum: 0,
            received_length_sum: 0,
        }
    }

    fn add_event(&mut self, event: &MessageEvent) {
        match event.direction {
            Direction::Sent => {
                self.sent_count += 1;
                self.sent_length_sum += event.length;
            }
            Direction::Received => {
                self.received_count += 1;
                self.received_length_sum += event.length;
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.sent_count + self.received_count
    }

    pub fn length(&self) -> u64 {
        self.sent_length_sum + self.received_length_sum
    }

    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Count => self.count(),
            Metric::Length => self.length(),
        }
    }
}

/// Dense `(month × counterparty)` table without gaps.
///
/// `rows` holds one entry for every month in `months` and every
/// counterparty in `counterparties`, ordered by month then counterparty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyTable {
    pub months: Vec<Month>,
    pub counterparties: Vec<String>,
    pub rows: Vec<AggregateRow>,
}

impl MonthlyTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up one bucket.
    pub fn row(&self, month: Month, counterparty: &str) -> Option<&AggregateRow> {
        let m = self.months.binary_search(&month).ok()?;
        let c = self
            .counterparties
            .binary_search_by(|name| name.as_str().cmp(counterparty))
            .ok()?;
        self.rows.get(m * self.counterparties.len() + c)
    }

    /// Number of events across every bucket.
    pub fn total_count(&self) -> u64 {
        self.rows.iter().map(AggregateRow::count).sum()
    }

    /// Reshape into one row per month and one column per counterparty.
    pub fn pivot(&self, metric: Metric) -> PivotTable {
        let width = self.counterparties.len();
        let values = if width == 0 {
            Vec::new()
        } else {
            self.rows
                .chunks(width)
                .map(|chunk| chunk.iter().map(|row| row.value(metric)).collect())
                .collect()
        };
        PivotTable {
            metric,
            months: self.months.clone(),
            columns: self.counterparties.clone(),
            values,
        }
    }
}

/// Monthly values of one metric, ready for CSV export and charting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotTable {
    pub metric: Metric,
    pub months: Vec<Month>,
    pub columns: Vec<String>,
    /// `values[month][column]`; missing buckets are 0.
    pub values: Vec<Vec<u64>>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.months.is_empty() || self.columns.is_empty()
    }

    /// The values of one column in month order.
    pub fn series(&self, column: usize) -> Vec<u64> {
        self.values
            .iter()
            .map(|row| row.get(column).copied().unwrap_or(0))
            .collect()
    }

    /// Largest single cell; 0 when empty.
    pub fn max_value(&self) -> u64 {
        self.values
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// Largest per-month sum across columns; 0 when empty.
    pub fn max_stacked(&self) -> u64 {
        self.values
            .iter()
            .map(|row| row.iter().sum::<u64>())
            .max()
            .unwrap_or(0)
    }
}

// ── MessageAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that groups message events by contact and month.
pub struct MessageAggregator;

impl MessageAggregator {
    /// All-time totals over every counterparty, regardless of any filter.
    pub fn totals(events: &[MessageEvent]) -> TotalsTable {
        let mut map: BTreeMap<&str, ContactTotals> = BTreeMap::new();
        for event in events {
            map.entry(event.counterparty.as_str())
                .or_insert_with(|| ContactTotals::new(event.counterparty.as_str()))
                .add_event(event);
        }
        TotalsTable {
            rows: map.into_values().collect(),
        }
    }

    /// Monthly table over the events that pass `filter`.
    ///
    /// Months are taken in `tz`. The range runs from the earliest to the
    /// latest month among the filtered events, and every filtered
    /// counterparty gets a row for each month in it.
    pub fn monthly(
        events: &[MessageEvent],
        filter: &FriendFilter,
        tz: &ReportTimezone,
    ) -> MonthlyTable {
        let mut buckets: BTreeMap<(Month, &str), Vec<&MessageEvent>> = BTreeMap::new();
        let mut counterparties: BTreeSet<&str> = BTreeSet::new();

        for event in events.iter().filter(|e| filter.allows(&e.counterparty)) {
            let month = tz.month_of(event.timestamp);
            counterparties.insert(event.counterparty.as_str());
            buckets
                .entry((month, event.counterparty.as_str()))
                .or_default()
                .push(event);
        }

        let (first, last) = match (buckets.keys().next(), buckets.keys().next_back()) {
            (Some((first, _)), Some((last, _))) => (*first, *last),
            _ => return MonthlyTable::default(),
        };

        let months = month_range(first, last);
        let mut rows = Vec::with_capacity(months.len() * counterparties.len());
        for month in &months {
            for counterparty in &counterparties {
                let mut row = AggregateRow::empty(MonthlyBucket {
                    month: *month,
                    counterparty: counterparty.to_string(),
                });
                if let Some(bucket_events) = buckets.get(&(*month, *counterparty)) {
                    for event in bucket_events {
                        row.add_event(event);
                    }
                }
                rows.push(row);
            }
        }

        debug!(
            "Monthly table: {} months x {} contacts",
            months.len(),
            counterparties.len()
        );

        MonthlyTable {
            months,
            counterparties: counterparties.into_iter().map(str::to_string).collect(),
            rows,
        }
    }

    /// Names in an explicit allow-list that never appear in `events`.
    pub fn unknown_friends(events: &[MessageEvent], filter: &FriendFilter) -> Vec<String> {
        match filter {
            FriendFilter::All => Vec::new(),
            FriendFilter::Only(names) => {
                let seen: BTreeSet<&str> = events.iter().map(|e| e.counterparty.as_str()).collect();
                names
                    .iter()
                    .filter(|name| !seen.contains(name.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

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

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    fn sample() -> Vec<MessageEvent> {
        vec![
            event("Alice", Direction::Sent, 5, "2024-01-05T10:00:00Z"),
            event("Alice", Direction::Received, 3, "2024-01-06T10:00:00Z"),
            event("Alice", Direction::Received, 4, "2024-01-07T10:00:00Z"),
            event("Bob", Direction::Received, 10, "2024-03-01T10:00:00Z"),
            event("Carol", Direction::Sent, 2, "2024-02-10T10:00:00Z"),
        ]
    }

    // ── totals ───────────────────────────────────────────────────────────────

    #[test]
    fn test_totals_per_contact_and_direction() {
        let totals = MessageAggregator::totals(&sample());
        let alice = totals.get("Alice").unwrap();

        assert_eq!(alice.sent, DirectionStats { count: 1, length: 5 });
        assert_eq!(alice.received, DirectionStats { count: 2, length: 7 });
        assert_eq!(alice.total_count(), 3);
        assert_eq!(alice.total_length(), 12);
    }

    #[test]
    fn test_totals_sorted_alphabetically() {
        let totals = MessageAggregator::totals(&sample());
        let names: Vec<&str> = totals.counterparties().collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn test_totals_grand_total() {
        let totals = MessageAggregator::totals(&sample());
        let grand = totals.grand_total();
        assert_eq!(grand.counterparty, "TOTAL");
        assert_eq!(grand.total_count(), 5);
        assert_eq!(grand.total_length(), 24);
    }

    #[test]
    fn test_totals_empty() {
        let totals = MessageAggregator::totals(&[]);
        assert!(totals.is_empty());
        assert_eq!(totals.grand_total().total_count(), 0);
        assert!(totals.get("Alice").is_none());
    }

    // ── monthly ──────────────────────────────────────────────────────────────

    #[test]
    fn test_monthly_fills_gaps() {
        let table =
            MessageAggregator::monthly(&sample(), &FriendFilter::All, &ReportTimezone::utc());

        assert_eq!(
            table.months,
            vec![month("2024-01"), month("2024-02"), month("2024-03")]
        );
        assert_eq!(table.counterparties, vec!["Alice", "Bob", "Carol"]);
        assert_eq!(table.rows.len(), 9);

        assert_eq!(table.row(month("2024-01"), "Alice").unwrap().count(), 3);
        assert_eq!(table.row(month("2024-02"), "Alice").unwrap().count(), 0);
        assert_eq!(table.row(month("2024-01"), "Bob").unwrap().count(), 0);
        assert_eq!(table.row(month("2024-03"), "Bob").unwrap().count(), 1);
    }

    #[test]
    fn test_monthly_row_sums() {
        let table =
            MessageAggregator::monthly(&sample(), &FriendFilter::All, &ReportTimezone::utc());
        let row = table.row(month("2024-01"), "Alice").unwrap();
        assert_eq!(row.sent_count, 1);
        assert_eq!(row.received_count, 2);
        assert_eq!(row.sent_length_sum, 5);
        assert_eq!(row.received_length_sum, 7);
        assert_eq!(row.value(Metric::Length), 12);
    }

    #[test]
    fn test_monthly_filter_restricts_contacts_and_range() {
        let filter = FriendFilter::from_names(&["Alice", "Carol"]);
        let table = MessageAggregator::monthly(&sample(), &filter, &ReportTimezone::utc());

        assert_eq!(table.counterparties, vec!["Alice", "Carol"]);
        // Bob's March message is outside the filtered range.
        assert_eq!(table.months, vec![month("2024-01"), month("2024-02")]);
        assert_eq!(table.total_count(), 4);
    }

    #[test]
    fn test_monthly_total_matches_filtered_events() {
        let events = sample();
        let filter = FriendFilter::from_names(&["Alice", "Bob"]);
        let table = MessageAggregator::monthly(&events, &filter, &ReportTimezone::utc());
        let expected = events.iter().filter(|e| filter.allows(&e.counterparty)).count() as u64;
        assert_eq!(table.total_count(), expected);
    }

    #[test]
    fn test_monthly_no_matching_contacts_is_empty() {
        let filter = FriendFilter::from_names(&["Nobody"]);
        let table = MessageAggregator::monthly(&sample(), &filter, &ReportTimezone::utc());
        assert!(table.is_empty());
        assert!(table.months.is_empty());
        assert!(table.pivot(Metric::Count).is_empty());
    }

    #[test]
    fn test_monthly_uses_reference_zone() {
        let events = vec![event("Alice", Direction::Sent, 1, "2024-01-31T23:30:00Z")];
        let utc = MessageAggregator::monthly(&events, &FriendFilter::All, &ReportTimezone::utc());
        assert_eq!(utc.months, vec![month("2024-01")]);

        let tokyo = ReportTimezone::new("Asia/Tokyo").unwrap();
        let local = MessageAggregator::monthly(&events, &FriendFilter::All, &tokyo);
        assert_eq!(local.months, vec![month("2024-02")]);
    }

    #[test]
    fn test_monthly_range_spans_years() {
        let events = vec![
            event("Alice", Direction::Sent, 1, "2023-11-15T00:00:00Z"),
            event("Alice", Direction::Sent, 1, "2024-02-15T00:00:00Z"),
        ];
        let table = MessageAggregator::monthly(&events, &FriendFilter::All, &ReportTimezone::utc());
        assert_eq!(table.months.len(), 4);
        assert_eq!(table.months[1], month("2023-12"));
    }

    // ── pivot ────────────────────────────────────────────────────────────────

    #[test]
    fn test_pivot_count_and_length() {
        let table =
            MessageAggregator::monthly(&sample(), &FriendFilter::All, &ReportTimezone::utc());

        let counts = table.pivot(Metric::Count);
        assert_eq!(counts.columns, vec!["Alice", "Bob", "Carol"]);
        assert_eq!(counts.values, vec![vec![3, 0, 0], vec![0, 0, 1], vec![0, 1, 0]]);
        assert_eq!(counts.series(0), vec![3, 0, 0]);
        assert_eq!(counts.max_value(), 3);
        assert_eq!(counts.max_stacked(), 3);

        let lengths = table.pivot(Metric::Length);
        assert_eq!(lengths.values[0], vec![12, 0, 0]);
        assert_eq!(lengths.values[2], vec![0, 10, 0]);
    }

    // ── unknown_friends ──────────────────────────────────────────────────────

    #[test]
    fn test_unknown_friends() {
        let filter = FriendFilter::from_names(&["Alice", "Zed"]);
        assert_eq!(
            MessageAggregator::unknown_friends(&sample(), &filter),
            vec!["Zed".to_string()]
        );
        assert!(MessageAggregator::unknown_friends(&sample(), &FriendFilter::All).is_empty());
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{Result, StatsError};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── Month ─────────────────────────────────────────────────────────────────────

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month immediately after this one.
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = String;

    /// Parse the `"YYYY-MM"` form produced by [`fmt::Display`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got \"{}\"", s))?;
        let year: i32 = year.parse().map_err(|_| format!("bad year in \"{}\"", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("bad month in \"{}\"", s))?;
        Month::new(year, month).ok_or_else(|| format!("month out of range in \"{}\"", s))
    }
}

/// Every month from `first` to `last` inclusive, in order.
///
/// Empty when `first > last`.
pub fn month_range(first: Month, last: Month) -> Vec<Month> {
    let mut months = Vec::new();
    let mut current = first;
    while current <= last {
        months.push(current);
        current = current.succ();
    }
    months
}

// ── ReportTimezone ────────────────────────────────────────────────────────────

/// The fixed reference zone used to truncate timestamps to calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTimezone {
    tz: Tz,
}

impl Default for ReportTimezone {
    fn default() -> Self {
        Self::utc()
    }
}

impl ReportTimezone {
    /// Resolve an IANA zone name; `"auto"` selects the system zone.
    pub fn new(tz_name: &str) -> Result<Self> {
        let name = if tz_name.eq_ignore_ascii_case("auto") {
            get_system_timezone()
        } else {
            tz_name.to_string()
        };
        let tz = name
            .parse::<Tz>()
            .map_err(|_| StatsError::InvalidTimezone(name.clone()))?;
        Ok(Self { tz })
    }

    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// The calendar month `ts` falls into, seen from the reference zone.
    pub fn month_of(&self, ts: DateTime<Utc>) -> Month {
        let local = ts.with_timezone(&self.tz);
        Month {
            year: local.year(),
            month: local.month(),
        }
    }

    /// Parse an ISO 8601 / RFC 3339 timestamp string into UTC.
    ///
    /// Strings without an offset are read as wall-clock time in the
    /// reference zone. Returns `None` for empty or unrecognised input.
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }

        // Offsets without a colon, e.g. "2018-10-05T16:04:18+0000".
        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
            return Some(dt.with_timezone(&Utc));
        }

        const FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in FMTS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                if let Some(dt) = self.tz.from_local_datetime(&naive).earliest() {
                    return Some(dt.with_timezone(&Utc));
                }
            }
        }

        warn!("could not parse timestamp \"{}\"", s);
        None
    }
}

/// Convert a Unix timestamp in milliseconds to UTC.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

use clap::Parser;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::{FriendFilter, Metric};
use crate::time_utils::{get_system_timezone, ReportTimezone};

/// Accepted `--log-level` names, most verbose first.
pub const LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly message statistics from exported chat histories
#[derive(Parser, Debug, Clone)]
#[command(
    name = "chat-stats",
    about = "Monthly message statistics from exported chat histories",
    version
)]
pub struct Settings {
    /// Name of the export owner, exactly as it appears in the messages
    #[arg(long)]
    pub name: String,

    /// Friends to include in the monthly stats ("all" for everyone)
    #[arg(long, required = true, num_args = 1..)]
    pub friends: Vec<String>,

    /// Output directory
    #[arg(long, env = "CHAT_STATS_OUTDIR", default_value = "output")]
    pub outdir: PathBuf,

    /// Single JSON file holding an array of threads
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Root of the per-thread inbox export
    #[arg(long, default_value = "messages/inbox", conflicts_with = "data")]
    pub inbox: PathBuf,

    /// Keep conversations with more than one other participant
    #[arg(long)]
    pub include_groups: bool,

    /// Value reported per month and contact
    #[arg(long, value_enum, default_value_t = Metric::Count)]
    pub metric: Metric,

    /// Timezone used to split months ("auto" for the system timezone)
    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    /// Skip rendering the PNG charts
    #[arg(long)]
    pub no_charts: bool,

    /// Chart width in pixels
    #[arg(long, default_value = "3000", value_parser = clap::value_parser!(u32).range(100..=20000))]
    pub chart_width: u32,

    /// Chart height in pixels
    #[arg(long, default_value = "1500", value_parser = clap::value_parser!(u32).range(100..=20000))]
    pub chart_height: u32,

    /// Logging level
    #[arg(long, env = "CHAT_STATS_LOG", default_value = "INFO", value_parser = LOG_LEVELS)]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and resolve derived values.
    ///
    /// Exits with a usage message when a required flag is missing.
    pub fn load() -> Self {
        Self::parse().resolve()
    }

    /// Resolve the `"auto"` timezone and apply the `--debug` flag.
    pub fn resolve(mut self) -> Self {
        if self.timezone.eq_ignore_ascii_case("auto") {
            self.timezone = get_system_timezone();
        }
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// The allow-list built from `--friends`.
    pub fn friend_filter(&self) -> FriendFilter {
        FriendFilter::from_names(&self.friends)
    }

    /// The reference zone for month bucketing.
    pub fn report_timezone(&self) -> Result<ReportTimezone> {
        ReportTimezone::new(&self.timezone)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

//! Main analysis pipeline for chat-stats.
//!
//! Loads conversations, flattens them into message events and aggregates
//! both tables, returning an [`AnalysisResult`] ready for the report layer.

use serde::{Deserialize, Serialize};
use stats_core::error::Result;
use stats_core::models::{FriendFilter, MessageEvent};
use stats_core::settings::Settings;
use stats_core::time_utils::ReportTimezone;
use tracing::{info, warn};

use crate::aggregator::{MessageAggregator, MonthlyTable, TotalsTable};
use crate::flattener::{FlattenStats, Flattener};
use crate::reader::{ConversationLoader, ExportSource, LoadStats};

// ── Public types ──────────────────────────────────────────────────────────────

/// Everything the pipeline needs to know about one run.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub source: ExportSource,
    /// Identity of the export owner.
    pub owner: String,
    pub friends: FriendFilter,
    pub include_groups: bool,
    pub timezone: ReportTimezone,
}

impl AnalysisRequest {
    /// Build a request from parsed CLI settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            source: ExportSource::from_settings(settings),
            owner: settings.name.clone(),
            friends: settings.friend_filter(),
            include_groups: settings.include_groups,
            timezone: settings.report_timezone()?,
        })
    }
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub load: LoadStats,
    pub flatten: FlattenStats,
    /// Distinct counterparties across the whole dataset.
    pub contacts_total: usize,
    /// Counterparties that made it into the monthly table.
    pub contacts_selected: usize,
    /// Requested friends that never appear in the data.
    pub unknown_friends: Vec<String>,
    /// Reference zone used for month bucketing.
    pub timezone: String,
    /// Wall-clock seconds spent loading and flattening.
    pub load_time_seconds: f64,
}

/// The complete output of [`analyze`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Every flattened event, before friend filtering.
    pub events: Vec<MessageEvent>,
    /// All-time totals over every counterparty.
    pub totals: TotalsTable,
    /// Monthly table restricted to the selected friends.
    pub monthly: MonthlyTable,
    pub metadata: AnalysisMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full pipeline.
///
/// 1. Open the export (fatal if missing) and stream conversations.
/// 2. Flatten them into message events from the owner's point of view.
/// 3. Compute all-time totals over every counterparty.
/// 4. Compute the gap-free monthly table over the selected friends.
pub fn analyze(request: &AnalysisRequest) -> Result<AnalysisResult> {
    // ── Step 1 + 2: Load and flatten ──────────────────────────────────────────
    let load_start = std::time::Instant::now();
    let loader = ConversationLoader::new(request.source.clone(), request.timezone)
        .include_groups(request.include_groups);
    let mut conversations = loader.conversations()?;
    let (events, flatten) = Flattener::new(&request.owner).flatten_all(conversations.by_ref());
    let load = conversations.stats().clone();
    let load_time = load_start.elapsed().as_secs_f64();

    info!(
        "Loaded {} conversations ({} skipped, {} group) into {} events",
        load.conversations_loaded,
        load.documents_skipped,
        load.group_conversations_skipped,
        events.len()
    );

    // ── Step 3: All-time totals ───────────────────────────────────────────────
    let totals = MessageAggregator::totals(&events);

    // ── Step 4: Monthly table ─────────────────────────────────────────────────
    let unknown_friends = MessageAggregator::unknown_friends(&events, &request.friends);
    for name in &unknown_friends {
        warn!("Friend \"{}\" does not appear in the export", name);
    }
    let monthly = MessageAggregator::monthly(&events, &request.friends, &request.timezone);

    let metadata = AnalysisMetadata {
        load,
        flatten,
        contacts_total: totals.rows.len(),
        contacts_selected: monthly.counterparties.len(),
        unknown_friends,
        timezone: request.timezone.name().to_string(),
        load_time_seconds: load_time,
    };

    Ok(AnalysisResult {
        events,
        totals,
        monthly,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_inbox(root: &Path, thread: &str, participants: &[&str], messages: serde_json::Value) {
        let dir = root.join(thread);
        std::fs::create_dir_all(&dir).unwrap();
        let participants: Vec<_> = participants.iter().map(|p| json!({ "name": p })).collect();
        let doc = json!({ "participants": participants, "messages": messages });
        std::fs::write(dir.join("message_1.json"), doc.to_string()).unwrap();
    }

    fn request(root: &Path, friends: &[&str]) -> AnalysisRequest {
        AnalysisRequest {
            source: ExportSource::Inbox(root.to_path_buf()),
            owner: "Me".to_string(),
            friends: FriendFilter::from_names(friends),
            include_groups: false,
            timezone: ReportTimezone::utc(),
        }
    }

    #[test]
    fn test_analyze_missing_root_is_error() {
        let req = request(Path::new("/tmp/does-not-exist-chat-stats-analysis"), &["all"]);
        assert!(analyze(&req).is_err());
    }

    #[test]
    fn test_analyze_empty_inbox() {
        let dir = TempDir::new().unwrap();
        let result = analyze(&request(dir.path(), &["all"])).unwrap();
        assert!(result.events.is_empty());
        assert!(result.totals.is_empty());
        assert!(result.monthly.is_empty());
        assert_eq!(result.metadata.load.documents_found, 0);
    }

    #[test]
    fn test_analyze_metadata() {
        let dir = TempDir::new().unwrap();
        write_inbox(
            dir.path(),
            "alice",
            &["Alice", "Me"],
            json!([
                { "sender_name": "Alice", "timestamp_ms": 1_704_067_200_000i64, "content": "hi", "type": "Generic" },
                { "sender_name": "Alice", "timestamp_ms": 1_704_067_300_000i64, "type": "Share" },
            ]),
        );
        write_inbox(
            dir.path(),
            "bob",
            &["Bob", "Me"],
            json!([
                { "sender_name": "Me", "timestamp_ms": 1_704_067_200_000i64, "content": "yo", "type": "Generic" },
            ]),
        );

        let result = analyze(&request(dir.path(), &["Alice", "Zed"])).unwrap();
        let meta = &result.metadata;

        assert_eq!(meta.load.conversations_loaded, 2);
        assert_eq!(meta.flatten.non_text_skipped, 1);
        assert_eq!(meta.contacts_total, 2);
        assert_eq!(meta.contacts_selected, 1);
        assert_eq!(meta.unknown_friends, vec!["Zed".to_string()]);
        assert_eq!(meta.timezone, "UTC");
    }

    #[test]
    fn test_request_from_settings() {
        use clap::Parser;

        let settings = Settings::parse_from([
            "chat-stats",
            "--name",
            "Me",
            "--friends",
            "Alice",
            "--data",
            "threads.json",
            "--include-groups",
            "--timezone",
            "Europe/Paris",
        ]);
        let req = AnalysisRequest::from_settings(&settings).unwrap();
        assert_eq!(req.owner, "Me");
        assert_eq!(req.source, ExportSource::ThreadFile(PathBuf::from("threads.json")));
        assert!(req.include_groups);
        assert!(req.friends.allows("Alice"));
        assert!(!req.friends.allows("Bob"));
        assert_eq!(req.timezone.name(), "Europe/Paris");
    }
}

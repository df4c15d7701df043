//! Export discovery and loading for chat-stats.
//!
//! Reads conversation exports in either of the two supported layouts and
//! yields [`Conversation`] records lazily, one file (or thread object) at a
//! time. Unparseable files are skipped; only a missing export root is fatal.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stats_core::error::{Result, StatsError};
use stats_core::models::{Conversation, MessageKind, RawMessage};
use stats_core::settings::Settings;
use stats_core::time_utils::{from_millis, ReportTimezone};
use tracing::{debug, warn};

/// Inbox message type that denotes a plain text message.
const GENERIC_TYPE: &str = "Generic";

/// Kind recorded for inbox messages that carry no `type` and no media key.
const UNTYPED: &str = "untyped";

/// Inbox keys that name the payload of an untyped message.
const INBOX_MEDIA_KEYS: &[&str] = &[
    "photos",
    "sticker",
    "audio_files",
    "videos",
    "gifs",
    "files",
    "share",
    "call_duration",
];

/// Thread-file keys that mark an entry as media rather than text.
const MEDIA_KEYS: &[&str] = &[
    "media",
    "media_url",
    "media_share_url",
    "story_share",
    "heart",
    "voice_media",
    "animated_media_images",
    "action",
];

// ── ExportSource ──────────────────────────────────────────────────────────────

/// Where and in which layout the chat export lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSource {
    /// `<root>/<thread>/message_<n>.json`, one conversation per file.
    Inbox(PathBuf),
    /// A single JSON array of thread objects.
    ThreadFile(PathBuf),
}

impl ExportSource {
    /// `--data` selects the thread file; otherwise the inbox root is used.
    pub fn from_settings(settings: &Settings) -> Self {
        match &settings.data {
            Some(path) => ExportSource::ThreadFile(path.clone()),
            None => ExportSource::Inbox(settings.inbox.clone()),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ExportSource::Inbox(p) | ExportSource::ThreadFile(p) => p,
        }
    }
}

// ── LoadStats ─────────────────────────────────────────────────────────────────

/// Counters collected while iterating over an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Inbox files matched, or thread objects found in the thread file.
    pub documents_found: usize,
    /// Documents that failed to read or parse.
    pub documents_skipped: usize,
    /// Conversations dropped for not being one-on-one.
    pub group_conversations_skipped: usize,
    /// Conversations handed to the caller.
    pub conversations_loaded: usize,
    /// Messages dropped for a missing sender or timestamp.
    pub messages_skipped: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `message_<n>.json` files recursively under `root`, sorted by path.
pub fn find_message_files(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        warn!("Inbox path does not exist: {}", root.display());
        return Vec::new();
    }

    let pattern = message_file_pattern();
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| pattern.is_match(name))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Reads conversations from an [`ExportSource`].
#[derive(Debug, Clone)]
pub struct ConversationLoader {
    source: ExportSource,
    timezone: ReportTimezone,
    include_groups: bool,
}

impl ConversationLoader {
    pub fn new(source: ExportSource, timezone: ReportTimezone) -> Self {
        Self {
            source,
            timezone,
            include_groups: false,
        }
    }

    /// Keep conversations whose participant count is not exactly two.
    pub fn include_groups(mut self, include: bool) -> Self {
        self.include_groups = include;
        self
    }

    /// Start iterating over the export.
    ///
    /// Fails only when the export root is missing or the thread file cannot
    /// be read; everything below that level is skipped with a warning.
    pub fn conversations(&self) -> Result<Conversations> {
        let path = self.source.path();
        if !path.exists() {
            return Err(StatsError::DataPathNotFound(path.to_path_buf()));
        }

        let (pending, documents_found) = match &self.source {
            ExportSource::Inbox(root) => {
                let files = find_message_files(root);
                let found = files.len();
                (Pending::Files(files.into_iter()), found)
            }
            ExportSource::ThreadFile(file) => {
                let text = std::fs::read_to_string(file).map_err(|source| {
                    StatsError::FileRead {
                        path: file.clone(),
                        source,
                    }
                })?;
                let threads = match serde_json::from_str::<Vec<Value>>(&text) {
                    Ok(threads) => threads,
                    Err(e) => {
                        warn!("Skipping {}: {}", file.display(), classify(file, e));
                        Vec::new()
                    }
                };
                let found = threads.len();
                (
                    Pending::Threads {
                        path: file.clone(),
                        items: threads.into_iter().enumerate(),
                    },
                    found,
                )
            }
        };

        debug!(
            "Found {} documents under {}",
            documents_found,
            path.display()
        );

        Ok(Conversations {
            pending,
            timezone: self.timezone,
            include_groups: self.include_groups,
            stats: LoadStats {
                documents_found,
                ..LoadStats::default()
            },
        })
    }
}

/// Lazy iterator over the conversations of one export.
pub struct Conversations {
    pending: Pending,
    timezone: ReportTimezone,
    include_groups: bool,
    stats: LoadStats,
}

enum Pending {
    Files(std::vec::IntoIter<PathBuf>),
    Threads {
        path: PathBuf,
        items: std::iter::Enumerate<std::vec::IntoIter<Value>>,
    },
}

impl Conversations {
    /// Counters so far; complete once the iterator is exhausted.
    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }
}

impl Iterator for Conversations {
    type Item = Conversation;

    fn next(&mut self) -> Option<Conversation> {
        loop {
            let parsed = match &mut self.pending {
                Pending::Files(files) => {
                    let path = files.next()?;
                    parse_inbox_file(&path)
                }
                Pending::Threads { path, items } => {
                    let (index, item) = items.next()?;
                    parse_thread(path, index, item, &self.timezone)
                }
            };

            let (conversation, messages_skipped) = match parsed {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Skipping conversation: {}", e);
                    self.stats.documents_skipped += 1;
                    continue;
                }
            };

            self.stats.messages_skipped += messages_skipped;

            if !self.include_groups && !conversation.is_one_on_one() {
                debug!(
                    "Discarding group conversation {} ({} participants)",
                    conversation.source.display(),
                    conversation.participants.len()
                );
                self.stats.group_conversations_skipped += 1;
                continue;
            }

            self.stats.conversations_loaded += 1;
            return Some(conversation);
        }
    }
}

// ── Facebook-style inbox ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct InboxFile {
    participants: Vec<ParticipantRecord>,
    messages: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct InboxMessage {
    sender_name: Option<String>,
    timestamp_ms: Option<i64>,
    content: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ParticipantRecord {
    Named { name: String },
    Plain(String),
}

impl ParticipantRecord {
    fn into_name(self) -> String {
        match self {
            ParticipantRecord::Named { name } | ParticipantRecord::Plain(name) => name,
        }
    }
}

/// Parse one inbox file into a conversation plus the number of messages
/// that had to be dropped.
fn parse_inbox_file(path: &Path) -> Result<(Conversation, usize)> {
    let text = std::fs::read_to_string(path).map_err(|source| StatsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let file: InboxFile = serde_json::from_str(&text).map_err(|e| classify(path, e))?;

    let participants = file
        .participants
        .into_iter()
        .map(|p| repair_mojibake(&p.into_name()))
        .collect();

    let mut messages = Vec::with_capacity(file.messages.len());
    let mut skipped = 0usize;
    for value in file.messages {
        match map_inbox_message(value) {
            Some(message) => messages.push(message),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("{}: {} messages skipped", path.display(), skipped);
    }

    Ok((
        Conversation {
            participants,
            messages,
            source: path.to_path_buf(),
        },
        skipped,
    ))
}

fn map_inbox_message(value: Value) -> Option<RawMessage> {
    let message: InboxMessage = serde_json::from_value(value).ok()?;
    let sender = repair_mojibake(&message.sender_name?);
    let timestamp = from_millis(message.timestamp_ms?)?;

    // Only an explicit `Generic` type is text.
    let kind = match message.kind.as_deref() {
        Some(GENERIC_TYPE) => MessageKind::Text,
        Some(other) => MessageKind::Other(other.to_string()),
        None => MessageKind::Other(
            media_marker(INBOX_MEDIA_KEYS, &message.extra)
                .unwrap_or(UNTYPED)
                .to_string(),
        ),
    };

    Some(RawMessage {
        sender,
        timestamp,
        content: message.content.map(|c| repair_mojibake(&c)),
        kind,
    })
}

// ── Thread-array file ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ThreadRecord {
    participants: Vec<ParticipantRecord>,
    conversation: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    sender: Option<String>,
    created_at: Option<String>,
    text: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

fn parse_thread(
    path: &Path,
    index: usize,
    value: Value,
    tz: &ReportTimezone,
) -> Result<(Conversation, usize)> {
    let label = PathBuf::from(format!("{}#{}", path.display(), index));
    let thread: ThreadRecord = serde_json::from_value(value).map_err(|e| classify(&label, e))?;

    let participants = thread
        .participants
        .into_iter()
        .map(ParticipantRecord::into_name)
        .collect();

    let mut messages = Vec::with_capacity(thread.conversation.len());
    let mut skipped = 0usize;
    for value in thread.conversation {
        match map_thread_message(value, tz) {
            Some(message) => messages.push(message),
            None => skipped += 1,
        }
    }

    Ok((
        Conversation {
            participants,
            messages,
            source: label,
        },
        skipped,
    ))
}

fn map_thread_message(value: Value, tz: &ReportTimezone) -> Option<RawMessage> {
    let message: ThreadMessage = serde_json::from_value(value).ok()?;
    let sender = message.sender?;
    let timestamp = tz.parse_timestamp(message.created_at.as_deref()?)?;

    let kind = match (&message.text, media_marker(MEDIA_KEYS, &message.extra)) {
        (None, Some(marker)) => MessageKind::Other(marker.to_string()),
        _ => MessageKind::Text,
    };

    Some(RawMessage {
        sender,
        timestamp,
        content: message.text,
        kind,
    })
}

/// The first of `keys` present in `extra` with a non-null value.
fn media_marker(
    keys: &'static [&'static str],
    extra: &serde_json::Map<String, Value>,
) -> Option<&'static str> {
    keys.iter()
        .copied()
        .find(|key| extra.get(*key).map(|v| !v.is_null()).unwrap_or(false))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn message_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^message_\d+\.json$").expect("regex is valid"))
}

/// Split serde failures into syntax errors and missing/mistyped fields.
fn classify(path: &Path, err: serde_json::Error) -> StatsError {
    match err.classify() {
        serde_json::error::Category::Data => StatsError::MalformedExport {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
        _ => StatsError::JsonParse(err),
    }
}

/// Undo the Latin-1 re-encoding Facebook applies to UTF-8 text.
///
/// Strings that are ASCII, contain code points above U+00FF, or whose bytes
/// are not valid UTF-8 are returned unchanged.
pub fn repair_mojibake(s: &str) -> String {
    if s.is_ascii() || s.chars().any(|c| c as u32 > 0xFF) {
        return s.to_string();
    }
    let bytes: Vec<u8> = s.chars().map(|c| c as u32 as u8).collect();
    String::from_utf8(bytes).unwrap_or_else(|_| s.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

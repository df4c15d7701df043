use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel `--friends` value that disables counterparty filtering.
pub const ALL_FRIENDS: &str = "all";

/// Whether a message was written by the report owner or by someone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Authored by the report owner.
    Sent,
    /// Authored by a counterparty.
    Received,
}

/// What a raw message carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// A plain text message (possibly with empty or absent content).
    Text,
    /// Media, shares, calls and other markers; the label is the source type.
    Other(String),
}

impl MessageKind {
    pub fn is_text(&self) -> bool {
        matches!(self, MessageKind::Text)
    }
}

/// One message as read from an export file, before flattening.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Identity of the author, exactly as the export spells it.
    pub sender: String,
    /// UTC instant the message was sent.
    pub timestamp: DateTime<Utc>,
    /// Textual body; `None` when the export has no content field.
    pub content: Option<String>,
    pub kind: MessageKind,
}

/// A single thread read from an export, consumed by the flattener.
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Participant identities in the order the export lists them.
    pub participants: Vec<String>,
    pub messages: Vec<RawMessage>,
    /// File this conversation was read from.
    pub source: PathBuf,
}

impl Conversation {
    /// `true` when the thread has exactly two participants.
    pub fn is_one_on_one(&self) -> bool {
        self.participants.len() == 2
    }
}

/// A flattened, immutable message record attributed to one counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// The contact this event is counted against.
    pub counterparty: String,
    pub direction: Direction,
    /// Character count of the content, 0 when absent.
    pub length: u64,
    pub timestamp: DateTime<Utc>,
}

/// Which value the monthly table and charts report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Number of messages.
    #[default]
    Count,
    /// Summed content length in characters.
    Length,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Count => write!(f, "count"),
            Metric::Length => write!(f, "length"),
        }
    }
}

/// Allow-list of counterparties for the monthly table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FriendFilter {
    /// Every counterparty in the dataset.
    All,
    /// Only the named counterparties.
    Only(BTreeSet<String>),
}

impl FriendFilter {
    /// Build a filter from `--friends` values.
    ///
    /// Any value equal to [`ALL_FRIENDS`] selects every counterparty, as does
    /// an empty list.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        if names.is_empty() || names.iter().any(|n| n.as_ref() == ALL_FRIENDS) {
            return FriendFilter::All;
        }
        FriendFilter::Only(names.iter().map(|n| n.as_ref().to_string()).collect())
    }

    pub fn allows(&self, counterparty: &str) -> bool {
        match self {
            FriendFilter::All => true,
            FriendFilter::Only(names) => names.contains(counterparty),
        }
    }
}

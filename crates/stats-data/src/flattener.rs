//! Conversion of nested conversations into flat [`MessageEvent`] records.
//!
//! Direction is decided by exact comparison of the sender against the
//! report owner. An owner-authored message is fanned out into one SENT event
//! per counterparty, so in an N-party thread one outgoing message yields N−1
//! events. Received messages are attributed to the single counterparty of a
//! one-on-one thread, or to their sender otherwise.

use serde::{Deserialize, Serialize};
use stats_core::models::{Conversation, Direction, MessageEvent, RawMessage};
use tracing::debug;

// ── FlattenStats ──────────────────────────────────────────────────────────────

/// Counters collected while flattening.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenStats {
    /// Raw messages examined.
    pub messages_seen: usize,
    /// Media, share, call and other non-text messages dropped.
    pub non_text_skipped: usize,
    /// Owner messages in threads with nobody else to attribute them to.
    pub unattributed_skipped: usize,
    /// Events produced, including fan-out.
    pub events_emitted: usize,
}

// ── Flattener ─────────────────────────────────────────────────────────────────

/// Turns conversations into message events from the owner's point of view.
pub struct Flattener<'a> {
    owner: &'a str,
}

impl<'a> Flattener<'a> {
    pub fn new(owner: &'a str) -> Self {
        Self { owner }
    }

    /// Participants other than the owner, in listed order, without repeats.
    pub fn counterparties(&self, conversation: &Conversation) -> Vec<String> {
        let mut others: Vec<String> = Vec::with_capacity(conversation.participants.len());
        for participant in &conversation.participants {
            if participant != self.owner && !others.contains(participant) {
                others.push(participant.clone());
            }
        }
        others
    }

    /// Flatten a single conversation.
    pub fn flatten(&self, conversation: &Conversation) -> Vec<MessageEvent> {
        let mut events = Vec::with_capacity(conversation.messages.len());
        let mut stats = FlattenStats::default();
        self.flatten_into(conversation, &mut events, &mut stats);
        events
    }

    /// Flatten every conversation, consuming them one at a time.
    pub fn flatten_all<I>(&self, conversations: I) -> (Vec<MessageEvent>, FlattenStats)
    where
        I: IntoIterator<Item = Conversation>,
    {
        let mut events = Vec::new();
        let mut stats = FlattenStats::default();
        for conversation in conversations {
            self.flatten_into(&conversation, &mut events, &mut stats);
        }

        debug!(
            "Flattened {} messages into {} events ({} non-text skipped)",
            stats.messages_seen, stats.events_emitted, stats.non_text_skipped
        );

        (events, stats)
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn flatten_into(
        &self,
        conversation: &Conversation,
        events: &mut Vec<MessageEvent>,
        stats: &mut FlattenStats,
    ) {
        let counterparties = self.counterparties(conversation);

        for message in &conversation.messages {
            stats.messages_seen += 1;

            if !message.kind.is_text() {
                stats.non_text_skipped += 1;
                continue;
            }

            let length = content_length(message);

            if message.sender == self.owner {
                if counterparties.is_empty() {
                    stats.unattributed_skipped += 1;
                    continue;
                }
                for counterparty in &counterparties {
                    events.push(MessageEvent {
                        counterparty: counterparty.clone(),
                        direction: Direction::Sent,
                        length,
                        timestamp: message.timestamp,
                    });
                    stats.events_emitted += 1;
                }
            } else {
                let counterparty = match counterparties.as_slice() {
                    [only] => only.clone(),
                    _ => message.sender.clone(),
                };
                events.push(MessageEvent {
                    counterparty,
                    direction: Direction::Received,
                    length,
                    timestamp: message.timestamp,
                });
                stats.events_emitted += 1;
            }
        }
    }
}

/// Character count of the message body; 0 when absent.
pub fn content_length(message: &RawMessage) -> u64 {
    message
        .content
        .as_deref()
        .map(|c| c.chars().count() as u64)
        .unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Data layer for chat-stats.
//!
//! Responsible for discovering and reading chat exports, flattening
//! conversations into message events, aggregating per-contact and monthly
//! tables, and running the top-level analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod flattener;
pub mod reader;

pub use stats_core as core;

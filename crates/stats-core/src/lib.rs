//! Core domain layer for chat-stats.
//!
//! Holds the message and aggregate models, the shared error type, CLI
//! settings, month/time-zone utilities and number formatting used by the
//! data and report layers.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

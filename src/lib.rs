//! # Plan Statusline
//!
//! Quota and usage reporting for a metered coding plan, rendered as a compact
//! status line or JSON.
//!
//! ## Overview
//!
//! Each refresh combines:
//! - the live quota interval (request counts, reset countdown, subscription expiry)
//! - token consumption aggregated from paged billing history (yesterday, the
//!   trailing week, the current plan period)
//! - the context-window usage of the current session, read back from its
//!   transcript log
//!
//! API payloads are held in short-lived in-memory caches; nothing is persisted
//! apart from the credentials file.
//!
//! ## Features
//!
//! - `colors` (default): Enables terminal color output via owo-colors

/// HTTP client and endpoint calls
pub mod api;

/// Billing history pagination
pub mod billing;

/// TTL caches with an injectable clock
pub mod cache;

/// Command-line argument parsing
pub mod cli;

/// Credentials file and environment overrides
pub mod config;

/// Display formatting for text and JSON output
pub mod display;

/// Refresh orchestration
pub mod engine;

/// Error taxonomy and best-effort results
pub mod error;

/// Data models for quota, billing, transcripts and hook input
pub mod models;

/// Quota payload parsing
pub mod snapshot;

/// Usage aggregation over reporting windows
pub mod stats;

/// Token figure resolution across vendor usage formats
pub mod tokens;

/// Transcript log walking for context usage
pub mod transcript;

/// Number, duration and path formatting
pub mod utils;

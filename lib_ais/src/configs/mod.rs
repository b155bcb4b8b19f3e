//! # Configuration Modules
//!
//! Typed configuration for the feed connection and the resolver's time budgets.

/// Feed endpoint, budgets and filtering switches.
pub mod config_feed;

pub use config_feed::{ConfigError, FeedConfig, PhaseBudgets, DEFAULT_WSS_URL, MAX_TOTAL_BUDGET};

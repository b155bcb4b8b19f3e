//! # Utilities Module
//!
//! A collection point for small, general-purpose helpers that don't fit into
//! more specific modules like `maritime` or `ingestors`.
//!
//! ## Contained Modules:
//!
//! - **`time`**: ISO-8601 timestamp formatting and parsing used for the
//!   `fetchedAt` stamp and lineup ordering.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Timestamp helpers.
pub mod time;

pub use time::{current_datetime_rfc9557, current_utc_year, parse_timestamp_millis};

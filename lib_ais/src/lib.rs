//! # lib_ais
//!
//! Resolves the current identity and navigational status of a vessel from a
//! live AIS broadcast feed, given only its IMO number.
//!
//! Modules are gated by Cargo features so that consumers only compile what
//! they use:
//!
//! - **`maritime`**: code tables, the feed envelope and the message normalizer.
//! - **`ingestors`**: the single-query WebSocket stream listener.
//! - **`core`**: the two-stage IMO -> MMSI resolver.
//! - **`configs`**: typed feed configuration.
//! - **`loggers`**: `tracing` subscriber setup with file rotation.
//! - **`utils`**: timestamp helpers.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

#[cfg(feature = "configs")]
pub mod configs;
#[cfg(feature = "core")]
pub mod core;
#[cfg(feature = "ingestors")]
pub mod ingestors;
#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "maritime")]
pub mod maritime;
#[cfg(feature = "utils")]
pub mod utils;

// Re-export the types most callers need
#[cfg(feature = "configs")]
pub use configs::{FeedConfig, PhaseBudgets};
#[cfg(feature = "core")]
pub use crate::core::{Resolution, ResolveError, VesselResolver};
#[cfg(feature = "ingestors")]
pub use ingestors::{ListenOutcome, StreamListener, SubscriptionFilter};
#[cfg(feature = "maritime")]
pub use maritime::NormalizedVessel;

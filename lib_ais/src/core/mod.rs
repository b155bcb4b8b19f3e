//! # Core Engine Module
//!
//! The heart of the crate: turning an IMO number into a [`NormalizedVessel`]
//! by correlating two kinds of feed message.
//!
//! ## Core Components:
//!
//! - **`resolver`**: the two-stage resolver. Phase 1 waits for the static
//!   identity report carrying the queried IMO and learns the vessel's MMSI.
//!   Phase 2 waits for a position report from that MMSI to pick up the
//!   navigational status. Each phase runs its own listener and connection.
//!
//! [`NormalizedVessel`]: crate::maritime::NormalizedVessel

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Two-stage IMO -> MMSI -> status resolver.
pub mod resolver;

// --- Public API Re-exports ---
pub use resolver::{Resolution, ResolveError, VesselResolver};

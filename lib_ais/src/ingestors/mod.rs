//! # Data Ingestors Module
//!
//! Clients that pull data out of external feeds. Each submodule owns the
//! protocol details of one source so the rest of the crate only ever sees
//! decoded [`RawMessage`](crate::maritime::RawMessage)s.
//!
//! ## Contained Modules:
//! - **`aisstream_wss`**: a single-use WebSocket listener for the AISStream
//!   feed. One listener serves one predicate-driven wait and always tears its
//!   connection down before returning.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The single-query WebSocket listener for AISStream.
pub mod aisstream_wss;

// --- Public API Re-exports ---
pub use aisstream_wss::{
    ListenOutcome, ListenerState, StreamError, StreamListener, SubscriptionFilter,
    WORLD_BOUNDING_BOX,
};

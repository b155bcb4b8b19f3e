//! # Maritime Data Module
//!
//! Groups everything that knows what an AIS message *means*, as opposed to how
//! it travels over the wire.
//!
//! ## Contained Modules:
//!
//! - **`codes`**: pure lookup tables turning numeric AIS codes into text
//!   (navigational status, flag state from the MMSI prefix, vessel type).
//!
//! - **`aisstream`**: the feed envelope, the defensive message normalizer and
//!   the `NormalizedVessel` output record.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Static code tables for AIS numeric fields.
pub mod codes;
/// AISStream message envelope, normalizer and output record.
pub mod aisstream;

// --- Public API Re-exports ---
pub use aisstream::{
    lineup_order, normalize_imo, parse_position_report, parse_position_status,
    parse_static_identity, PositionStatus, RawMessage, StaticIdentity, NormalizedVessel,
};
pub use codes::{flag_from_mmsi, nav_status_label, ship_type_category, ShipTypeCategory};

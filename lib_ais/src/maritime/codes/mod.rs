//! # AIS Code Tables
//!
//! Deterministic, side-effect-free mappings from AIS codes to human readable
//! text. Every function is total over its input and returns a sentinel
//! (`None` or `"Code {n}"`) for values it doesn't know.

/// Maritime Identification Digits (MMSI prefix) to flag state.
pub mod mid;
/// Navigational status codes (AIS message types 1-3).
pub mod nav_status;
/// Ship and cargo type codes (AIS message type 5).
pub mod ship_type;

pub use mid::flag_from_mmsi;
pub use nav_status::{nav_status_label, nav_status_text};
pub use ship_type::{ship_type_category, ShipTypeCategory};

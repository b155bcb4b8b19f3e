//! # AISStream Messages
//!
//! The feed at `stream.aisstream.io` emits one JSON object per frame:
//!
//! ```json
//! {
//!   "MessageType": "ShipStaticData",
//!   "MetaData": { "MMSI": 247123456, "ShipName": "..." },
//!   "Message": { "ShipStaticData": { "ImoNumber": 9412634, "...": "..." } }
//! }
//! ```
//!
//! Casing of keys drifts between message variants (`MetaData` vs `Metadata`),
//! so every lookup here is case-insensitive and every decode is allowed to fail
//! quietly. A message that can't be decoded is simply "not a match".

/// The opaque inbound unit and case-insensitive field access.
pub mod envelope;
/// Static identity and position/status extraction.
pub mod normalizer;
/// The canonical output record.
pub mod vessel;

pub use envelope::RawMessage;
pub use normalizer::{
    format_eta, normalize_imo, parse_position_report, parse_position_status,
    parse_static_identity, parse_static_identity_in_year, PositionStatus, StaticIdentity,
    POSITION_REPORT, SHIP_STATIC_DATA,
};
pub use vessel::{lineup_order, NormalizedVessel, SOURCE_TAG};

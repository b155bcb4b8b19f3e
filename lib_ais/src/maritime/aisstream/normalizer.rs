//! Defensive decoding of feed messages into typed partial views.
//!
//! Neither entry point can fail loudly: a message of the wrong type, a missing
//! block or a garbled field all come back as `None`, which callers read as
//! "keep listening".

use serde_json::Value;

use super::envelope::{as_integer, as_text, field, first_field, RawMessage};
use crate::maritime::codes::{nav_status_label, ship_type_category};
use crate::utils::current_utc_year;

/// Type tag of a static identity report.
pub const SHIP_STATIC_DATA: &str = "ShipStaticData";
/// Type tag of a class A position report.
pub const POSITION_REPORT: &str = "PositionReport";

const STATIC_BODIES: [&str; 2] = ["ShipStaticData", "ShipStaticDataExtended"];
const IMO_BODY_KEYS: [&str; 4] = ["ImoNumber", "Imo", "IMO", "imo_number"];
const IMO_META_KEYS: [&str; 2] = ["IMO", "ImoNumber"];

/// Identity fields extracted from a static data report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StaticIdentity {
    /// Normalized IMO number.
    pub imo: Option<String>,
    /// Broadcast identifier, from the metadata or `UserID`.
    pub mmsi: Option<String>,
    /// Padding-trimmed vessel name.
    pub vessel_name: Option<String>,
    /// Decade bucket of the ship type code.
    pub general_type: Option<String>,
    /// Specific ship type label.
    pub detailed_type: Option<String>,
    /// AIS `Destination`.
    pub arrival_at: Option<String>,
    /// ETA as `YYYY-MM-DDTHH:MM:00Z`, or the feed's own string.
    pub reported_eta: Option<String>,
}

/// Status fields extracted from a position report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionStatus {
    /// Reporting vessel.
    pub mmsi: Option<String>,
    /// Navigational status label, never empty.
    pub nav_status: String,
}

/// Canonical form of an IMO number: digits only, without an `IMO` prefix.
///
/// `"IMO 9412634"`, `" 9412634 "` and `"imo:9412634"` all become `"9412634"`.
/// Returns `None` for empty, non-numeric and all-zero input (AIS sends `0`
/// when the number is not available).
pub fn normalize_imo(raw: &str) -> Option<String> {
    let mut s = raw.trim();
    if s.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("imo")) {
        s = s[3..].trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '-');
    }
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.bytes().all(|b| b == b'0') {
        return None;
    }
    Some(s.to_string())
}

fn imo_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(_) => normalize_imo(&as_integer(value)?.to_string()),
        Value::String(s) => normalize_imo(s),
        _ => None,
    }
}

/// Formats an AIS ETA as `YYYY-MM-DDTHH:MM:00Z` in the given year.
///
/// A pre-formatted string passes through untouched. The object form needs all
/// four of `Month`, `Day`, `Hour` and `Minute` as non-negative integers;
/// partial data is treated as absent rather than zero-filled.
pub fn format_eta(eta: &Value, year: i32) -> Option<String> {
    match eta {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(_) => {
            let part = |key: &str| field(eta, key).and_then(as_integer).filter(|n| *n >= 0);
            let month = part("Month")?;
            let day = part("Day")?;
            let hour = part("Hour")?;
            let minute = part("Minute")?;
            Some(format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:00Z",
                year, month, day, hour, minute
            ))
        }
        _ => None,
    }
}

fn mmsi_of(raw: &RawMessage, body: &Value) -> Option<String> {
    raw.metadata()
        .and_then(|meta| field(meta, "MMSI"))
        .and_then(as_text)
        .or_else(|| field(body, "UserID").and_then(as_text))
}

/// Decodes a static identity report, stamping ETAs with the current UTC year.
pub fn parse_static_identity(raw: &RawMessage) -> Option<StaticIdentity> {
    parse_static_identity_in_year(raw, current_utc_year())
}

/// [`parse_static_identity`] with an explicit ETA year.
pub fn parse_static_identity_in_year(raw: &RawMessage, year: i32) -> Option<StaticIdentity> {
    if !raw.is_type(SHIP_STATIC_DATA) {
        return None;
    }
    let body = STATIC_BODIES.iter().find_map(|kind| raw.body(kind))?;
    let meta = raw.metadata();

    let imo = first_field(body, &IMO_BODY_KEYS)
        .and_then(imo_from_value)
        .or_else(|| meta.and_then(|m| first_field(m, &IMO_META_KEYS)).and_then(imo_from_value));

    let vessel_name = field(body, "Name")
        .and_then(as_text)
        .or_else(|| meta.and_then(|m| field(m, "ShipName")).and_then(as_text));

    let category = ship_type_category(field(body, "Type").and_then(as_integer));

    Some(StaticIdentity {
        imo,
        mmsi: mmsi_of(raw, body),
        vessel_name,
        general_type: category.general.map(str::to_string),
        detailed_type: category.detailed,
        arrival_at: field(body, "Destination").and_then(as_text),
        reported_eta: field(body, "Eta").and_then(|eta| format_eta(eta, year)),
    })
}

/// Decodes a position report into its MMSI and navigational status label.
pub fn parse_position_report(raw: &RawMessage) -> Option<PositionStatus> {
    if !raw.is_type(POSITION_REPORT) {
        return None;
    }
    let body = raw.body(POSITION_REPORT)?;
    let nav_status = nav_status_label(field(body, "NavigationalStatus"))?;
    Some(PositionStatus {
        mmsi: mmsi_of(raw, body),
        nav_status,
    })
}

/// The navigational status label of a position report.
pub fn parse_position_status(raw: &RawMessage) -> Option<String> {
    parse_position_report(raw).map(|report| report.nav_status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn static_msg(body: Value) -> RawMessage {
        RawMessage::from(json!({
            "MessageType": "ShipStaticData",
            "MetaData": {"MMSI": 247123456, "ShipName": "META NAME"},
            "Message": {"ShipStaticData": body}
        }))
    }

    #[test]
    fn full_static_report() {
        let msg = static_msg(json!({
            "ImoNumber": 9412634,
            "Name": "COSTA DIADEMA@@@@",
            "Type": 60,
            "Destination": "SAVONA  ",
            "Eta": {"Month": 5, "Day": 3, "Hour": 14, "Minute": 30},
            "UserID": 111111111
        }));
        let id = parse_static_identity_in_year(&msg, 2024).unwrap();
        assert_eq!(id.imo.as_deref(), Some("9412634"));
        assert_eq!(id.mmsi.as_deref(), Some("247123456"));
        assert_eq!(id.vessel_name.as_deref(), Some("COSTA DIADEMA"));
        assert_eq!(id.general_type.as_deref(), Some("Passenger"));
        assert_eq!(id.detailed_type.as_deref(), Some("Passenger"));
        assert_eq!(id.arrival_at.as_deref(), Some("SAVONA"));
        assert_eq!(id.reported_eta.as_deref(), Some("2024-05-03T14:30:00Z"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let msg = RawMessage::from(json!({
            "MessageType": "PositionReport",
            "Message": {"ShipStaticData": {"ImoNumber": 9412634}}
        }));
        assert_eq!(parse_static_identity(&msg), None);
        assert_eq!(parse_static_identity(&RawMessage::from(json!("hello"))), None);
        assert_eq!(parse_static_identity(&RawMessage::from(json!(null))), None);
    }

    #[test]
    fn lowercase_envelope_and_extended_body() {
        let msg = RawMessage::from(json!({
            "messageType": "shipStaticData",
            "Metadata": {"mmsi": "538001234"},
            "message": {"ShipStaticDataExtended": {"imo": "IMO 9321483"}}
        }));
        let id = parse_static_identity(&msg).unwrap();
        assert_eq!(id.imo.as_deref(), Some("9321483"));
        assert_eq!(id.mmsi.as_deref(), Some("538001234"));
        assert_eq!(id.vessel_name, None);
        assert_eq!(id.general_type, None);
        assert_eq!(id.reported_eta, None);
    }

    #[test]
    fn name_and_mmsi_fallbacks() {
        let msg = RawMessage::from(json!({
            "MessageType": "ShipStaticData",
            "Message": {"ShipStaticData": {"UserID": 247000001, "ImoNumber": 0}},
            "MetaData": {"ShipName": "FALLBACK", "IMO": 9000001}
        }));
        let id = parse_static_identity(&msg).unwrap();
        assert_eq!(id.mmsi.as_deref(), Some("247000001"));
        assert_eq!(id.vessel_name.as_deref(), Some("FALLBACK"));
        assert_eq!(id.imo.as_deref(), Some("9000001"));
    }

    #[test]
    fn empty_strings_become_none() {
        let id = parse_static_identity(&static_msg(json!({
            "ImoNumber": 9412634, "Name": "", "Destination": "@@@@"
        })))
        .unwrap();
        assert_eq!(id.vessel_name.as_deref(), Some("META NAME"));
        assert_eq!(id.arrival_at, None);
    }

    #[test]
    fn eta_formatting() {
        assert_eq!(
            format_eta(&json!({"Month": 5, "Day": 3, "Hour": 14, "Minute": 30}), 2031).as_deref(),
            Some("2031-05-03T14:30:00Z")
        );
        assert_eq!(
            format_eta(&json!({"month": "12", "day": "1", "hour": "0", "minute": "5"}), 2024).as_deref(),
            Some("2024-12-01T00:05:00Z")
        );
        assert_eq!(format_eta(&json!({"Month": 5, "Day": null, "Hour": 14, "Minute": 30}), 2024), None);
        assert_eq!(format_eta(&json!({"Month": 5, "Hour": 14, "Minute": 30}), 2024), None);
        assert_eq!(format_eta(&json!({"Month": "x", "Day": 1, "Hour": 1, "Minute": 1}), 2024), None);
        assert_eq!(format_eta(&json!("05-03 14:30"), 2024).as_deref(), Some("05-03 14:30"));
        assert_eq!(format_eta(&json!(""), 2024), None);
        assert_eq!(format_eta(&json!(42), 2024), None);
    }

    #[test]
    fn imo_normalization() {
        assert_eq!(normalize_imo("9412634").as_deref(), Some("9412634"));
        assert_eq!(normalize_imo(" IMO 9412634 ").as_deref(), Some("9412634"));
        assert_eq!(normalize_imo("imo:9412634").as_deref(), Some("9412634"));
        assert_eq!(normalize_imo("IMO-9412634").as_deref(), Some("9412634"));
        assert_eq!(normalize_imo(""), None);
        assert_eq!(normalize_imo("0"), None);
        assert_eq!(normalize_imo("94x2634"), None);
        assert_eq!(normalize_imo("IMO"), None);
    }

    #[test]
    fn position_report() {
        let msg = RawMessage::from(json!({
            "MessageType": "PositionReport",
            "MetaData": {"MMSI": 247123456},
            "Message": {"PositionReport": {"NavigationalStatus": 1, "UserID": 247123456}}
        }));
        let report = parse_position_report(&msg).unwrap();
        assert_eq!(report.mmsi.as_deref(), Some("247123456"));
        assert_eq!(report.nav_status, "At anchor");
        assert_eq!(parse_position_status(&msg).as_deref(), Some("At anchor"));
    }

    #[test]
    fn position_report_without_status() {
        let msg = RawMessage::from(json!({
            "MessageType": "PositionReport",
            "Message": {"PositionReport": {"Sog": 12.1}}
        }));
        assert_eq!(parse_position_status(&msg), None);
        let wrong = RawMessage::from(json!({
            "MessageType": "ShipStaticData",
            "Message": {"PositionReport": {"NavigationalStatus": 1}}
        }));
        assert_eq!(parse_position_status(&wrong), None);
    }
}

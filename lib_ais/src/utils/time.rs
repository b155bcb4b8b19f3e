use chrono::{DateTime, Datelike, Utc};

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn current_datetime_rfc9557() -> String {
    format_rfc9557(Utc::now())
}

/// Formats a UTC instant with millisecond precision and a `Z` suffix.
pub fn format_rfc9557(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// The calendar year in UTC right now. AIS ETAs carry no year of their own.
pub fn current_utc_year() -> i32 {
    Utc::now().year()
}

/// Parses an RFC 3339 timestamp into Unix milliseconds.
///
/// Returns `None` for anything that isn't a valid timestamp so callers can pick
/// their own fallback.
pub fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_millis_and_zulu() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 3, 14, 30, 0).unwrap();
        assert_eq!(format_rfc9557(ts), "2024-05-03T14:30:00.000Z");
    }

    #[test]
    fn round_trips_through_parser() {
        let now = current_datetime_rfc9557();
        assert!(parse_timestamp_millis(&now).is_some());
        assert_eq!(parse_timestamp_millis("not a date"), None);
        assert_eq!(parse_timestamp_millis("1970-01-01T00:00:01.000Z"), Some(1000));
    }
}

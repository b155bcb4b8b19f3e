use serde::Serialize;

/// Coarse and fine text for an AIS ship type code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipTypeCategory {
    /// Decade bucket label, e.g. `"Cargo"` for 70-79.
    pub general: Option<&'static str>,
    /// Specific label when one is known, otherwise `"Code {n}"`.
    pub detailed: Option<String>,
}

impl ShipTypeCategory {
    fn unknown() -> Self {
        Self {
            general: None,
            detailed: None,
        }
    }
}

const RANGES: [(i64, i64, &str); 8] = [
    (20, 29, "Wing in ground"),
    (30, 39, "Fishing"),
    (40, 49, "Towing/Offshore"),
    (50, 59, "Pilot/Port Tender"),
    (60, 69, "Passenger"),
    (70, 79, "Cargo"),
    (80, 89, "Tanker"),
    (90, 99, "Other"),
];

fn detailed_label(code: i64) -> Option<&'static str> {
    match code {
        50 => Some("Pilot vessel"),
        52 => Some("Tug"),
        55 => Some("Law enforcement"),
        60 => Some("Passenger"),
        69 => Some("Passenger, other"),
        70 => Some("Cargo"),
        79 => Some("Cargo, other"),
        80 => Some("Tanker"),
        89 => Some("Tanker, other"),
        _ => None,
    }
}

/// Buckets a ship type code. `None` in gives `None` for both fields; codes
/// outside 20-99 get a general label of `"Unknown"`.
pub fn ship_type_category(code: Option<i64>) -> ShipTypeCategory {
    let Some(code) = code else {
        return ShipTypeCategory::unknown();
    };

    let general = RANGES
        .iter()
        .find(|(min, max, _)| (*min..=*max).contains(&code))
        .map(|(_, _, label)| *label)
        .unwrap_or("Unknown");

    let detailed = detailed_label(code)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Code {}", code));

    ShipTypeCategory {
        general: Some(general),
        detailed: Some(detailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cargo_has_a_detailed_label() {
        let cat = ship_type_category(Some(70));
        assert_eq!(cat.general, Some("Cargo"));
        assert_eq!(cat.detailed.as_deref(), Some("Cargo"));
    }

    #[test]
    fn other_falls_back_to_code() {
        let cat = ship_type_category(Some(95));
        assert_eq!(cat.general, Some("Other"));
        assert_eq!(cat.detailed.as_deref(), Some("Code 95"));
    }

    #[test]
    fn null_is_fully_unknown() {
        assert_eq!(ship_type_category(None), ShipTypeCategory::unknown());
    }

    #[test]
    fn out_of_range() {
        let cat = ship_type_category(Some(7));
        assert_eq!(cat.general, Some("Unknown"));
        assert_eq!(cat.detailed.as_deref(), Some("Code 7"));
    }

    #[test]
    fn range_edges() {
        assert_eq!(ship_type_category(Some(20)).general, Some("Wing in ground"));
        assert_eq!(ship_type_category(Some(52)).detailed.as_deref(), Some("Tug"));
        assert_eq!(ship_type_category(Some(89)).general, Some("Tanker"));
        assert_eq!(ship_type_category(Some(99)).general, Some("Other"));
        assert_eq!(ship_type_category(Some(100)).general, Some("Unknown"));
    }
}

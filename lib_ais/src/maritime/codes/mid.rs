/// Looks up the flag state for a Maritime Identification Digits prefix.
fn flag_for_mid(mid: &str) -> Option<&'static str> {
    let flag = match mid {
        "201" => "Albania",
        "205" => "Belgium",
        "211" => "Germany",
        "219" => "Denmark",
        "224" => "Spain",
        "226" | "227" => "France",
        "229" => "Malta",
        "232" | "235" => "United Kingdom",
        "236" => "Gibraltar",
        "237" | "240" => "Greece",
        "244" => "Netherlands",
        "247" => "Italy",
        "250" => "Ireland",
        "255" => "Portugal",
        "257" => "Norway",
        "266" => "Sweden",
        "269" => "Switzerland",
        "273" => "Russia",
        "275" => "Estonia",
        "303" => "USA",
        "316" => "Canada",
        "351" | "370" => "Panama",
        "431" => "Japan",
        "440" => "Korea (Republic of)",
        "461" => "India",
        "477" => "Hong Kong, China",
        "503" => "Australia",
        "533" => "Malaysia",
        "538" => "Marshall Islands",
        "563" | "565" | "566" => "Singapore",
        "574" => "Viet Nam",
        "710" => "South Africa",
        "725" => "Chile",
        "730" => "Colombia",
        "735" => "Peru",
        "740" => "Ecuador",
        "743" => "Argentina",
        "760" => "Brazil",
        "770" => "Uruguay",
        _ => return None,
    };
    Some(flag)
}

/// Flag state derived from the first three digits of an MMSI.
///
/// Inputs shorter than three characters, and prefixes missing from the table,
/// yield `None`.
pub fn flag_from_mmsi(mmsi: Option<&str>) -> Option<&'static str> {
    let mmsi = mmsi?.trim();
    flag_for_mid(mmsi.get(..3)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn italian_prefix() {
        assert_eq!(flag_from_mmsi(Some("247012345")), Some("Italy"));
        assert_eq!(flag_from_mmsi(Some("2470")), Some("Italy"));
    }

    #[test]
    fn short_or_missing_input() {
        assert_eq!(flag_from_mmsi(Some("2")), None);
        assert_eq!(flag_from_mmsi(Some("24")), None);
        assert_eq!(flag_from_mmsi(Some("")), None);
        assert_eq!(flag_from_mmsi(None), None);
    }

    #[test]
    fn unknown_prefix() {
        assert_eq!(flag_from_mmsi(Some("999000111")), None);
    }

    #[test]
    fn shared_prefixes() {
        assert_eq!(flag_from_mmsi(Some("370123456")), Some("Panama"));
        assert_eq!(flag_from_mmsi(Some("351123456")), Some("Panama"));
        assert_eq!(flag_from_mmsi(Some("566000000")), Some("Singapore"));
    }
}

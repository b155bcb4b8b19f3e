use serde_json::Value;

/// Text for a numeric navigational status code.
///
/// Codes 9-13 are reserved by ITU-R M.1371 and render as `"Code {n}"`, as does
/// anything outside 0-15.
pub fn nav_status_text(code: i64) -> String {
    let label = match code {
        0 => "Under way using engine",
        1 => "At anchor",
        2 => "Not under command",
        3 => "Restricted manoeuverability",
        4 => "Constrained by draught",
        5 => "Moored",
        6 => "Aground",
        7 => "Engaged in fishing",
        8 => "Under way sailing",
        14 => "AIS-SART active",
        15 => "Undefined",
        other => return format!("Code {}", other),
    };
    label.to_string()
}

/// Resolves a raw `NavigationalStatus` field into a label.
///
/// Numbers (and numeric strings) go through [`nav_status_text`]; fractional
/// numbers render as `"Code {n}"`. Text that
/// isn't a number is assumed to be a label already and is returned as is.
/// Anything else, including a missing field, is `None`.
pub fn nav_status_label(raw: Option<&Value>) -> Option<String> {
    match raw? {
        Value::Number(n) => {
            let code = n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64));
            // Fractional codes match nothing in the table
            Some(code.map_or_else(|| format!("Code {}", n), nav_status_text))
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<i64>() {
                Ok(code) => Some(nav_status_text(code)),
                Err(_) => Some(trimmed.to_string()),
            }
        }
        _ => None,
    }
}

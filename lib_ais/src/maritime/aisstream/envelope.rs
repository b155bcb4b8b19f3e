use serde_json::Value;

/// One decoded frame from the feed.
///
/// Nothing about its shape is trusted. It lives only as long as the predicate
/// call that examines it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage(Value);

impl RawMessage {
    /// Decodes a text frame.
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self)
    }

    /// Decodes a binary frame (the feed sends JSON in binary frames too).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes).map(Self)
    }

    /// The underlying JSON value.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// The `MessageType` tag, if present and textual.
    pub fn message_type(&self) -> Option<&str> {
        field(&self.0, "MessageType")?.as_str()
    }

    /// Whether the type tag equals `kind`, ignoring case.
    pub fn is_type(&self, kind: &str) -> bool {
        self.message_type()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(kind))
    }

    /// The `MetaData` block (also accepts `Metadata` and other casings).
    pub fn metadata(&self) -> Option<&Value> {
        field(&self.0, "MetaData").filter(|v| v.is_object())
    }

    /// The typed payload `Message.<kind>`.
    pub fn body(&self, kind: &str) -> Option<&Value> {
        field(field(&self.0, "Message")?, kind).filter(|v| v.is_object())
    }
}

impl From<Value> for RawMessage {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Object member lookup: exact key first, then ASCII case-insensitive.
/// `null` members count as absent.
pub(crate) fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let obj = value.as_object()?;
    obj.get(key)
        .or_else(|| {
            obj.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
        .filter(|v| !v.is_null())
}

/// First present member among several aliases.
pub(crate) fn first_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| field(value, key))
}

/// Integer view of a number or numeric string. Fractional values are rejected.
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Text view of a string or number. AIS pads text fields with `@` and spaces;
/// both are trimmed, and an empty result is `None`.
pub(crate) fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim_matches(|c: char| c == '@' || c.is_whitespace()).to_string(),
        Value::Number(_) => as_integer(value)?.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_casing_variants() {
        let a = RawMessage::from(json!({"MetaData": {"MMSI": 1}}));
        let b = RawMessage::from(json!({"Metadata": {"MMSI": 1}}));
        assert!(a.metadata().is_some());
        assert!(b.metadata().is_some());
    }

    #[test]
    fn type_tag_is_case_insensitive() {
        let msg = RawMessage::from(json!({"messagetype": "shipstaticdata"}));
        assert!(msg.is_type("ShipStaticData"));
        assert!(!msg.is_type("PositionReport"));
    }

    #[test]
    fn non_object_values_are_tolerated() {
        let msg = RawMessage::from(json!([1, 2, 3]));
        assert_eq!(msg.message_type(), None);
        assert_eq!(msg.metadata(), None);
        assert_eq!(msg.body("PositionReport"), None);
    }

    #[test]
    fn text_and_integer_views() {
        assert_eq!(as_text(&json!("EVER GIVEN@@@   ")).as_deref(), Some("EVER GIVEN"));
        assert_eq!(as_text(&json!("   ")), None);
        assert_eq!(as_text(&json!(247123456)).as_deref(), Some("247123456"));
        assert_eq!(as_integer(&json!("14")), Some(14));
        assert_eq!(as_integer(&json!(14.0)), Some(14));
        assert_eq!(as_integer(&json!(14.5)), None);
        assert_eq!(as_integer(&json!("x")), None);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(RawMessage::from_text("{not json").is_err());
        assert!(RawMessage::from_slice(br#"{"MessageType":"PositionReport"}"#).is_ok());
    }
}

//! # Field Values
//!
//! A diff entry is a `FieldMap` of wire field names to `FieldValue`s. Different
//! event categories contribute different value kinds under the same name space,
//! so the value is a closed union rather than a free-form JSON document. It
//! serializes untagged, i.e. to the plain JSON value the collector expects.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Longest callsign accepted as an entity key.
pub const MAX_ENTITY_ID_LEN: usize = 20;

/// # Entity Identifier
///
/// A callsign, used verbatim (case-sensitive) as the top-level key of the
/// outbound JSON document. Always non-empty and at most `MAX_ENTITY_ID_LEN`
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Validates a raw callsign. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let len = trimmed.chars().count();
        if len == 0 || len > MAX_ENTITY_ID_LEN {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// The callsign as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field name to value. Ordered so that dumps are stable.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// # Field Value
///
/// One recorded value. Nested maps carry hierarchical data such as the runway
/// configuration (airport → runway → direction flags).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// `true` / `false` flags (clearance received, controller role, runway active).
    Bool(bool),
    /// Altitudes, rates, headings, speeds.
    Int(i64),
    /// Mach number and radio frequency.
    Float(f64),
    /// Codes, names and free text.
    Str(String),
    /// Nested mapping.
    Map(FieldMap),
}

impl FieldValue {
    /// The string payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<FieldMap> for FieldValue {
    fn from(v: FieldMap) -> Self {
        FieldValue::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_id_bounds() {
        assert!(EntityId::parse("").is_none());
        assert!(EntityId::parse("   ").is_none());
        assert!(EntityId::parse(&"X".repeat(21)).is_none());
        assert_eq!(EntityId::parse(&"X".repeat(20)).unwrap().as_str().len(), 20);
        assert_eq!(EntityId::parse(" SAS123 ").unwrap().as_str(), "SAS123");
        // Case is preserved, not folded.
        assert_ne!(EntityId::parse("sas123"), EntityId::parse("SAS123"));
    }

    #[test]
    fn values_serialize_untagged() {
        let mut runway = FieldMap::new();
        runway.insert("arrival".into(), true.into());
        runway.insert("departure".into(), false.into());
        let mut airport = FieldMap::new();
        airport.insert("19L".into(), runway.into());

        let mut entry = FieldMap::new();
        entry.insert("ahdg".into(), 270i64.into());
        entry.insert("amach".into(), 0.78f64.into());
        entry.insert("direct".into(), "".into());
        entry.insert("rwyconfig".into(), airport.into());

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "ahdg": 270,
                "amach": 0.78,
                "direct": "",
                "rwyconfig": { "19L": { "arrival": true, "departure": false } }
            })
        );
    }
}

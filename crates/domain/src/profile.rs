//! Canonical, engine-agnostic profile and the bookkeeping needed to write it back.

use crate::engine::EngineKind;
use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// A raw profile document as an engine emits or consumes it.
pub type RawDocument = Map<String, Value>;

/// Borrow a JSON value as a raw document.
pub fn raw_document(value: &Value) -> Result<&RawDocument, ProfileError> {
    value.as_object().ok_or(ProfileError::DocumentNotObject {
        found: json_type_name(value),
    })
}

/// Convert an owned JSON value into a raw document.
pub fn into_raw_document(value: Value) -> Result<RawDocument, ProfileError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ProfileError::DocumentNotObject {
            found: json_type_name(&other),
        }),
    }
}

/// JSON type name used in error messages.
#[must_use]
pub const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Literal pair a boolean setting was stored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BooleanEncoding {
    /// `"false"` / `"true"`
    LowerWord,
    /// `"False"` / `"True"`
    TitleWord,
    /// `"0"` / `"1"`
    Digit,
}

impl BooleanEncoding {
    /// Encodings in the order raw literals are matched.
    pub const MATCH_ORDER: [Self; 3] = [Self::LowerWord, Self::TitleWord, Self::Digit];

    /// `[false literal, true literal]`.
    #[must_use]
    pub const fn literals(self) -> [&'static str; 2] {
        match self {
            Self::LowerWord => ["false", "true"],
            Self::TitleWord => ["False", "True"],
            Self::Digit => ["0", "1"],
        }
    }

    /// Literal for `flag`.
    #[must_use]
    pub const fn encode(self, flag: bool) -> &'static str {
        let [off, on] = self.literals();
        if flag { on } else { off }
    }

    /// Recognize one of the six literals.
    #[must_use]
    pub fn decode(text: &str) -> Option<(Self, bool)> {
        Self::MATCH_ORDER.into_iter().find_map(|encoding| {
            let [off, on] = encoding.literals();
            if text == off {
                Some((encoding, false))
            } else if text == on {
                Some((encoding, true))
            } else {
                None
            }
        })
    }
}

/// Normalized profile plus the side channels that make normalization reversible.
///
/// A key is either *applicable* (it has a value) or *inapplicable* (the source
/// engine did not define it). Inapplicable keys are never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CanonicalProfile {
    engine: EngineKind,
    values: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    inapplicable: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    percent_suffixed: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    numeric_strings: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    boolean_encodings: BTreeMap<String, BooleanEncoding>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    array_keys: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    fidelity_gaps: BTreeSet<String>,
}

impl CanonicalProfile {
    /// Empty profile for `engine`.
    #[must_use]
    pub const fn empty(engine: EngineKind) -> Self {
        Self {
            engine,
            values: BTreeMap::new(),
            inapplicable: BTreeSet::new(),
            percent_suffixed: BTreeSet::new(),
            numeric_strings: BTreeSet::new(),
            boolean_encodings: BTreeMap::new(),
            array_keys: BTreeSet::new(),
            fidelity_gaps: BTreeSet::new(),
        }
    }

    /// Engine the profile was normalized from.
    #[must_use]
    pub const fn engine(&self) -> EngineKind {
        self.engine
    }

    /// Value of an applicable key.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// True when `key` has a value.
    #[must_use]
    pub fn is_applicable(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// True when `key` is known but not defined by the source engine.
    #[must_use]
    pub fn is_inapplicable(&self, key: &str) -> bool {
        self.inapplicable.contains(key)
    }

    /// Applicable keys and their values, sorted by key.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Inapplicable keys, sorted.
    pub fn inapplicable_keys(&self) -> impl Iterator<Item = &str> {
        self.inapplicable.iter().map(String::as_str)
    }

    /// Number of applicable keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no key has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when a trailing `%` was stripped from `key`.
    #[must_use]
    pub fn is_percent_suffixed(&self, key: &str) -> bool {
        self.percent_suffixed.contains(key)
    }

    /// Keys whose `%` suffix must be restored.
    pub fn percent_suffixed_keys(&self) -> impl Iterator<Item = &str> {
        self.percent_suffixed.iter().map(String::as_str)
    }

    /// True when `key` held a number written as a JSON string.
    #[must_use]
    pub fn is_numeric_string(&self, key: &str) -> bool {
        self.numeric_strings.contains(key)
    }

    /// Literal pair recorded for a boolean key.
    #[must_use]
    pub fn boolean_encoding(&self, key: &str) -> Option<BooleanEncoding> {
        self.boolean_encodings.get(key).copied()
    }

    /// Boolean keys with a recorded literal pair.
    pub fn boolean_encodings(&self) -> impl Iterator<Item = (&str, BooleanEncoding)> {
        self.boolean_encodings
            .iter()
            .map(|(key, encoding)| (key.as_str(), *encoding))
    }

    /// True when `key` was an array in the source document.
    #[must_use]
    pub fn was_array(&self, key: &str) -> bool {
        self.array_keys.contains(key)
    }

    /// Keys that were arrays in the source document.
    pub fn array_keys(&self) -> impl Iterator<Item = &str> {
        self.array_keys.iter().map(String::as_str)
    }

    /// Boolean keys whose literal was unrecognized and coerced by truthiness.
    ///
    /// Their original encoding is lost; they are written back as native booleans.
    pub fn fidelity_gaps(&self) -> impl Iterator<Item = &str> {
        self.fidelity_gaps.iter().map(String::as_str)
    }

    /// Set a value, making the key applicable.
    pub fn set_value(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.inapplicable.remove(&key);
        self.values.insert(key, value);
    }

    /// Builder form of [`CanonicalProfile::set_value`].
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set_value(key, value);
        self
    }

    /// Remove a value, marking the key inapplicable. Returns the old value.
    pub fn clear_value(&mut self, key: &str) -> Option<Value> {
        self.inapplicable.insert(key.to_string());
        self.values.remove(key)
    }

    pub(crate) fn mark_inapplicable(&mut self, key: &str) {
        self.values.remove(key);
        self.inapplicable.insert(key.to_string());
    }

    pub(crate) fn record_percent_suffix(&mut self, key: &str) {
        self.percent_suffixed.insert(key.to_string());
    }

    pub(crate) fn record_numeric_string(&mut self, key: &str) {
        self.numeric_strings.insert(key.to_string());
    }

    pub(crate) fn record_boolean_encoding(&mut self, key: &str, encoding: BooleanEncoding) {
        self.boolean_encodings.insert(key.to_string(), encoding);
    }

    pub(crate) fn record_array(&mut self, key: &str) {
        self.array_keys.insert(key.to_string());
    }

    pub(crate) fn record_fidelity_gap(&mut self, key: &str) {
        self.fidelity_gaps.insert(key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_matches_in_order() {
        assert_eq!(
            BooleanEncoding::decode("true"),
            Some((BooleanEncoding::LowerWord, true))
        );
        assert_eq!(
            BooleanEncoding::decode("False"),
            Some((BooleanEncoding::TitleWord, false))
        );
        assert_eq!(
            BooleanEncoding::decode("1"),
            Some((BooleanEncoding::Digit, true))
        );
        assert_eq!(BooleanEncoding::decode("TRUE"), None);
        assert_eq!(BooleanEncoding::decode("yes"), None);
    }

    #[test]
    fn encode_is_inverse_of_decode() {
        for encoding in BooleanEncoding::MATCH_ORDER {
            for flag in [false, true] {
                assert_eq!(
                    BooleanEncoding::decode(encoding.encode(flag)),
                    Some((encoding, flag))
                );
            }
        }
    }

    #[test]
    fn set_and_clear_toggle_applicability() {
        let mut profile = CanonicalProfile::empty(EngineKind::Cura);
        profile.mark_inapplicable("brim_width");
        assert!(profile.is_inapplicable("brim_width"));
        assert!(!profile.is_applicable("brim_width"));

        profile.set_value("brim_width", json!(5));
        assert!(profile.is_applicable("brim_width"));
        assert!(!profile.is_inapplicable("brim_width"));

        assert_eq!(profile.clear_value("brim_width"), Some(json!(5)));
        assert!(profile.is_inapplicable("brim_width"));
        assert!(profile.is_empty());
    }

    #[test]
    fn side_channels_serialize_with_profile() -> Result<(), serde_json::Error> {
        let mut profile = CanonicalProfile::empty(EngineKind::Slic3r).with_value("fill_density", json!(20));
        profile.record_percent_suffix("fill_density");
        profile.record_boolean_encoding("cooling", BooleanEncoding::Digit);
        profile.record_numeric_string("layer_height");

        let encoded = serde_json::to_value(&profile)?;
        assert_eq!(encoded.get("engine"), Some(&json!("slic3r")));
        assert_eq!(encoded.get("percentSuffixed"), Some(&json!(["fill_density"])));
        assert_eq!(
            encoded.pointer("/booleanEncodings/cooling"),
            Some(&json!("digit"))
        );
        assert_eq!(encoded.get("numericStrings"), Some(&json!(["layer_height"])));
        assert!(encoded.get("arrayKeys").is_none());

        let decoded: CanonicalProfile = serde_json::from_value(encoded)?;
        assert_eq!(decoded, profile);
        Ok(())
    }

    #[test]
    fn raw_document_rejects_non_objects() {
        assert_eq!(
            raw_document(&json!([1, 2])).err(),
            Some(ProfileError::DocumentNotObject { found: "array" })
        );
        assert!(into_raw_document(json!({"layer_height": 0.2})).is_ok());
    }
}

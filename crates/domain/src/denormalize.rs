//! [`CanonicalProfile`] → raw engine document.

use crate::catalog::ESCAPED_NEWLINE_KEYS;
use crate::engine::EngineKind;
use crate::loose::{is_truthy, to_display_string};
use crate::normalize::map_strings;
use crate::overrides::{OverrideReport, OverrideRuleTable, apply_overrides};
use crate::profile::{CanonicalProfile, RawDocument};
use serde::Serialize;
use serde_json::Value;

/// Denormalized document plus the override rules that fired while producing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Denormalized {
    /// Document in the target engine's shape.
    pub document: RawDocument,
    /// Rules that fired during the final override step.
    pub overrides: OverrideReport,
}

/// Write `profile` back in the shape `engine` expects, then apply `rules`.
#[must_use]
pub fn denormalize(
    profile: &CanonicalProfile,
    engine: EngineKind,
    rules: &OverrideRuleTable,
) -> RawDocument {
    denormalize_with_report(profile, engine, rules).document
}

/// [`denormalize`], also returning which override rules fired.
#[must_use]
pub fn denormalize_with_report(
    profile: &CanonicalProfile,
    engine: EngineKind,
    rules: &OverrideRuleTable,
) -> Denormalized {
    let mut document: RawDocument = profile
        .values()
        .map(|(key, value)| (key.to_string(), restore_value(profile, key, value)))
        .collect();

    if engine.escapes_newlines() {
        for key in ESCAPED_NEWLINE_KEYS {
            if let Some(value) = document.get_mut(key) {
                *value = map_strings(value, |text| text.replace('\n', "\\n"));
            }
        }
    }

    let overrides = apply_overrides(&mut document, rules);
    Denormalized {
        document,
        overrides,
    }
}

fn restore_value(profile: &CanonicalProfile, key: &str, value: &Value) -> Value {
    let mut restored = value.clone();

    if profile.is_percent_suffixed(key) {
        restored = restore_percent(&restored);
    } else if profile.is_numeric_string(key) && restored.is_number() {
        restored = Value::String(to_display_string(&restored));
    }

    if let Some(encoding) = profile.boolean_encoding(key) {
        restored = Value::from(encoding.encode(is_truthy(&restored)));
    }

    if profile.was_array(key) && !restored.is_array() {
        restored = Value::Array(vec![restored]);
    }

    restored
}

/// Append `%` to a percent-suffixed value.
///
/// A string that already ends in `%` is returned unchanged, so an edit written
/// as `"15%"` comes back as `"15%"` and not `"15%%"`.
fn restore_percent(value: &Value) -> Value {
    match value {
        Value::String(text) if text.ends_with('%') => value.clone(),
        other => Value::String(format!("{}%", to_display_string(other))),
    }
}

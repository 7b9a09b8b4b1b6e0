//! Raw engine document → [`CanonicalProfile`].

use crate::catalog::{ESCAPED_NEWLINE_KEYS, FieldCatalog, FieldCategory, catalog};
use crate::engine::{EngineKind, SchemaMode};
use crate::loose::{is_truthy, parse_exact_number};
use crate::profile::{BooleanEncoding, CanonicalProfile, RawDocument};
use serde_json::Value;
use std::borrow::Cow;

/// Normalize a raw profile document emitted by `engine`.
///
/// Catalog engines contribute one entry per catalog key: a value when the key
/// is present, or an inapplicable marker when it is absent. Keys outside the
/// catalog are ignored. The dynamic-schema engine copies every key verbatim.
/// Never fails.
#[must_use]
pub fn normalize(raw: &RawDocument, engine: EngineKind) -> CanonicalProfile {
    match engine.schema() {
        SchemaMode::Catalog => normalize_catalog(raw, engine, catalog()),
        SchemaMode::Dynamic => normalize_dynamic(raw, engine),
    }
}

fn normalize_dynamic(raw: &RawDocument, engine: EngineKind) -> CanonicalProfile {
    raw.iter()
        .fold(CanonicalProfile::empty(engine), |profile, (key, value)| {
            profile.with_value(key.as_str(), value.clone())
        })
}

fn normalize_catalog(
    raw: &RawDocument,
    engine: EngineKind,
    fields: &FieldCatalog,
) -> CanonicalProfile {
    let mut profile = CanonicalProfile::empty(engine);

    for (key, category) in fields.entries() {
        let Some(value) = source_value(raw, key, engine) else {
            profile.mark_inapplicable(key);
            continue;
        };

        match category {
            FieldCategory::Scalar => normalize_scalar(&mut profile, key, &value),
            FieldCategory::Boolean => normalize_boolean(&mut profile, key, &value),
            FieldCategory::Enum => profile.set_value(key, value.into_owned()),
            FieldCategory::Array => normalize_array(&mut profile, key, &value),
        }
    }

    profile
}

// G-code keys on escaping engines are unescaped before any category rule runs.
fn source_value<'a>(raw: &'a RawDocument, key: &str, engine: EngineKind) -> Option<Cow<'a, Value>> {
    let value = raw.get(key)?;
    if engine.escapes_newlines() && ESCAPED_NEWLINE_KEYS.contains(&key) {
        return Some(Cow::Owned(map_strings(value, |text| {
            text.replace("\\n", "\n")
        })));
    }
    Some(Cow::Borrowed(value))
}

/// Apply `convert` to a string value or to the string elements of an array.
pub(crate) fn map_strings(value: &Value, convert: impl Fn(&str) -> String) -> Value {
    match value {
        Value::String(text) => Value::String(convert(text)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::String(text) => Value::String(convert(text)),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

fn normalize_scalar(profile: &mut CanonicalProfile, key: &str, value: &Value) {
    if let Value::String(text) = value {
        if let Some(stripped) = text.strip_suffix('%') {
            profile.record_percent_suffix(key);
            let normalized = parse_exact_number(stripped)
                .map_or_else(|| Value::String(stripped.to_string()), Value::Number);
            profile.set_value(key, normalized);
            return;
        }
        if let Some(number) = parse_exact_number(text) {
            profile.record_numeric_string(key);
            profile.set_value(key, Value::Number(number));
            return;
        }
    }
    profile.set_value(key, value.clone());
}

fn normalize_boolean(profile: &mut CanonicalProfile, key: &str, value: &Value) {
    let flag = match value {
        Value::String(text) => {
            if let Some((encoding, flag)) = BooleanEncoding::decode(text) {
                profile.record_boolean_encoding(key, encoding);
                flag
            } else {
                profile.record_fidelity_gap(key);
                is_truthy(value)
            }
        },
        Value::Bool(flag) => *flag,
        other => {
            profile.record_fidelity_gap(key);
            is_truthy(other)
        },
    };
    profile.set_value(key, Value::Bool(flag));
}

fn normalize_array(profile: &mut CanonicalProfile, key: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            profile.record_array(key);
            match items.first() {
                Some(first) => profile.set_value(key, first.clone()),
                None => profile.mark_inapplicable(key),
            }
        },
        scalar => profile.set_value(key, scalar.clone()),
    }
}

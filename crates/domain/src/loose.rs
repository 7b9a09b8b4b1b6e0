//! Loose value semantics for host-authored profile values.
//!
//! Profiles originate in a browser host that compares and coerces values the
//! way JavaScript does: `"1" == 1`, `true == 1`, empty strings are falsy. The
//! override engine and the boolean fallback depend on those rules, so they are
//! reproduced here over JSON values.

use serde_json::{Number, Value};

/// Truthiness of a value.
///
/// `null`, `false`, `0`, and `""` are falsy; arrays and objects are always truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric conversion; `None` stands for NaN.
#[must_use]
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Number(number) => number.as_f64(),
        Value::String(text) => string_to_number(text),
        Value::Array(_) | Value::Object(_) => string_to_number(&to_display_string(value)),
    }
}

/// String rendering used when a value is concatenated with text.
#[must_use]
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => format_number(number),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Render a number without a trailing `.0` on integral floats.
#[must_use]
pub fn format_number(number: &Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{value:.0}")
        },
        Some(value) => value.to_string(),
        None => number.to_string(),
    }
}

/// Parse `text` as a JSON number only when the number renders back to exactly `text`.
///
/// `"50"` and `"12.5"` qualify; `"0.10"`, `"1e3"`, and `" 5"` do not, so they
/// stay text and survive a round trip unchanged.
#[must_use]
pub fn parse_exact_number(text: &str) -> Option<Number> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Number(number)) if format_number(&number) == text => Some(number),
        _ => None,
    }
}

/// Abstract (`==`) equality between two values.
#[must_use]
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(_), Value::Number(_)) => numbers_equal(to_number(left), to_number(right)),
        (Value::Bool(flag), other) | (other, Value::Bool(flag)) => {
            loose_eq(&Value::from(u8::from(*flag)), other)
        },
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            numbers_equal(to_number(left), to_number(right))
        },
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => false,
        (composite @ (Value::Array(_) | Value::Object(_)), primitive)
        | (primitive, composite @ (Value::Array(_) | Value::Object(_))) => {
            loose_eq(&Value::String(to_display_string(composite)), primitive)
        },
    }
}

#[allow(clippy::float_cmp, reason = "abstract equality compares numbers exactly")]
fn numbers_equal(left: Option<f64>, right: Option<f64>) -> bool {
    matches!((left, right), (Some(a), Some(b)) if a == b)
}

fn string_to_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {},
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    if trimmed
        .chars()
        .any(|ch| ch.is_alphabetic() && ch != 'e' && ch != 'E')
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_follows_host_rules() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("no")));
        assert!(is_truthy(&json!(2.5)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn loose_equality_table() {
        assert!(loose_eq(&json!("1"), &json!(1)));
        assert!(loose_eq(&json!(1), &json!(1.0)));
        assert!(loose_eq(&json!(true), &json!(1)));
        assert!(loose_eq(&json!(false), &json!("0")));
        assert!(loose_eq(&json!([1]), &json!(1)));
        assert!(loose_eq(&json!(" 1 "), &json!(1)));
        assert!(loose_eq(&json!(""), &json!(0)));
        assert!(loose_eq(&json!(null), &json!(null)));

        assert!(!loose_eq(&json!("true"), &json!(1)));
        assert!(!loose_eq(&json!("True"), &json!(1)));
        assert!(!loose_eq(&json!(null), &json!(0)));
        assert!(!loose_eq(&json!("abc"), &json!("ABC")));
        assert!(!loose_eq(&json!([1]), &json!([1])));
        assert!(!loose_eq(&json!(2), &json!(1)));
    }

    #[test]
    fn string_numbers_follow_host_parsing() {
        assert_eq!(string_to_number("0x10"), Some(16.0));
        assert_eq!(string_to_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(string_to_number("1e3"), Some(1000.0));
        assert_eq!(string_to_number("inf"), None);
        assert_eq!(string_to_number("12px"), None);
    }

    #[test]
    fn display_strings_match_concatenation() {
        assert_eq!(to_display_string(&json!(50)), "50");
        assert_eq!(to_display_string(&json!(50.0)), "50");
        assert_eq!(to_display_string(&json!(12.5)), "12.5");
        assert_eq!(to_display_string(&json!("20")), "20");
        assert_eq!(to_display_string(&json!(true)), "true");
        assert_eq!(to_display_string(&json!([1, null, "a"])), "1,,a");
    }

    #[test]
    fn exact_numbers_only() {
        assert_eq!(parse_exact_number("50"), Some(Number::from(50)));
        assert_eq!(parse_exact_number("-3"), Some(Number::from(-3)));
        assert!(parse_exact_number("12.5").is_some());
        assert_eq!(parse_exact_number("0.10"), None);
        assert_eq!(parse_exact_number("1e3"), None);
        assert_eq!(parse_exact_number("007"), None);
        assert_eq!(parse_exact_number("abc"), None);
        assert_eq!(parse_exact_number(""), None);
    }
}

//! `normalize`, `denormalize`, and `roundtrip` handlers.

use crate::CliOutput;
use crate::error::CliError;
use crate::format::{OutputMode, pretty_json, push_override_lines, push_value_lines};
use serde_json::{Value, json};
use slicer_profile_app::settings_document;
use slicer_profile_config::ValidatedProfileConfig;
use slicer_profile_domain::{
    CanonicalProfile, Denormalized, EngineKind, RawDocument, denormalize_with_report, normalize,
};
use slicer_profile_shared::ErrorEnvelope;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// Run the normalize command.
pub fn run_normalize(
    mode: OutputMode,
    config: &ValidatedProfileConfig,
    engine: Option<EngineKind>,
    input: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let engine = resolve_engine(engine, config)?;
    let payload = read_input_json(input)?;
    let profile = normalize(settings_document(engine, &payload)?, engine);

    let stdout = if mode.is_json() {
        pretty_json(&json!({
            "status": "ok",
            "engine": engine,
            "profile": profile,
        }))?
    } else {
        format_profile_text(&profile)
    };
    Ok(CliOutput::ok(stdout))
}

/// Run the denormalize command.
///
/// Accepts either a bare canonical profile or the JSON output of `normalize`.
pub fn run_denormalize(
    mode: OutputMode,
    config: &ValidatedProfileConfig,
    engine: Option<EngineKind>,
    input: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let payload = read_input_json(input)?;
    let profile = parse_canonical_profile(payload)?;
    let engine = engine.unwrap_or_else(|| profile.engine());
    let denormalized = denormalize_with_report(&profile, engine, config.rule_table());

    let stdout = if mode.is_json() {
        pretty_json(&json!({
            "status": "ok",
            "engine": engine,
            "document": denormalized.document,
            "overrides": denormalized.overrides,
        }))?
    } else {
        format_denormalized_text(engine, &denormalized)
    };
    Ok(CliOutput::ok(stdout))
}

/// Run the roundtrip command.
pub fn run_roundtrip(
    mode: OutputMode,
    config: &ValidatedProfileConfig,
    engine: Option<EngineKind>,
    input: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let engine = resolve_engine(engine, config)?;
    let payload = read_input_json(input)?;
    let original = settings_document(engine, &payload)?;
    let profile = normalize(original, engine);
    let denormalized = denormalize_with_report(&profile, engine, config.rule_table());
    let changed = changed_keys(original, &denormalized.document);

    let stdout = if mode.is_json() {
        pretty_json(&json!({
            "status": "ok",
            "engine": engine,
            "document": denormalized.document,
            "changedKeys": changed,
            "overrides": denormalized.overrides,
        }))?
    } else {
        let mut out = format_denormalized_text(engine, &denormalized);
        out.push_str("changed: ");
        out.push_str(&changed.len().to_string());
        out.push('\n');
        for key in &changed {
            out.push_str("  ");
            out.push_str(key);
            out.push('\n');
        }
        out
    };
    Ok(CliOutput::ok(stdout))
}

pub(crate) fn resolve_engine(
    engine: Option<EngineKind>,
    config: &ValidatedProfileConfig,
) -> Result<EngineKind, CliError> {
    engine.or(config.default_engine).ok_or_else(|| {
        CliError::InvalidInput("no engine given; pass --engine or set defaultEngine".to_string())
    })
}

fn read_input_json(input: Option<&Path>) -> Result<Value, CliError> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path).map_err(|error| {
            ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy().to_string())
        })?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        },
    };
    serde_json::from_str(&text)
        .map_err(|error| CliError::InvalidInput(format!("input is not valid JSON: {error}")))
}

fn parse_canonical_profile(payload: Value) -> Result<CanonicalProfile, CliError> {
    let profile = match payload {
        Value::Object(mut wrapper) if wrapper.get("profile").is_some_and(Value::is_object) => {
            wrapper.remove("profile").unwrap_or_default()
        },
        other => other,
    };
    serde_json::from_value(profile)
        .map_err(|error| CliError::InvalidInput(format!("input is not a canonical profile: {error}")))
}

fn changed_keys(before: &RawDocument, after: &RawDocument) -> Vec<String> {
    let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    keys.into_iter()
        .filter(|key| before.get(key.as_str()) != after.get(key.as_str()))
        .cloned()
        .collect()
}

fn format_profile_text(profile: &CanonicalProfile) -> String {
    let mut out = String::new();
    out.push_str("status: ok\n");
    out.push_str("engine: ");
    out.push_str(profile.engine().id());
    out.push('\n');
    out.push_str("applicable: ");
    out.push_str(&profile.len().to_string());
    out.push('\n');
    out.push_str("inapplicable: ");
    out.push_str(&profile.inapplicable_keys().count().to_string());
    out.push('\n');
    let gaps: Vec<&str> = profile.fidelity_gaps().collect();
    out.push_str("fidelityGaps: ");
    if gaps.is_empty() {
        out.push_str("none");
    } else {
        out.push_str(&gaps.join(", "));
    }
    out.push('\n');
    push_value_lines(&mut out, "values", profile.values());
    out
}

fn format_denormalized_text(engine: EngineKind, denormalized: &Denormalized) -> String {
    let mut out = String::new();
    out.push_str("status: ok\n");
    out.push_str("engine: ");
    out.push_str(engine.id());
    out.push('\n');
    push_override_lines(&mut out, &denormalized.overrides);
    push_value_lines(
        &mut out,
        "document",
        denormalized
            .document
            .iter()
            .map(|(key, value)| (key.as_str(), value)),
    );
    out
}

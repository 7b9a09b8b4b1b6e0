//! Integration tests for parsing config fixtures from the workspace testkit.

use serde_json::json;
use slicer_profile_config::{
    CURRENT_CONFIG_VERSION, LogFormat, LogLevel, ProfileEnv, load_profile_config_from_path,
    parse_profile_config_json, parse_profile_config_toml, to_pretty_json, to_pretty_toml,
};
use slicer_profile_domain::{EngineKind, RawDocument};
use slicer_profile_shared::ErrorCode;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest_dir.to_path_buf())
}

fn fixture_path(relative: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join("testkit")
        .join("fixtures")
        .join(relative)
}

fn read_fixture(relative: &str) -> Result<String, Box<dyn Error>> {
    Ok(fs::read_to_string(fixture_path(relative))?)
}

#[test]
fn parses_valid_fixture_and_normalizes() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/slicer-profile.valid.json")?;
    let config = parse_profile_config_json(&contents)?;

    assert_eq!(config.version, CURRENT_CONFIG_VERSION);
    assert_eq!(config.default_engine, Some(EngineKind::Slic3r));
    assert_eq!(
        config.profile_root.as_deref(),
        Some("profiles"),
        "profile root should be trimmed"
    );
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(config.logging.format, LogFormat::Json);

    let triggers: Vec<&str> = config
        .rule_table()
        .rules()
        .iter()
        .map(|rule| rule.trigger_key())
        .collect();
    assert_eq!(triggers, vec!["spiral_vase", "support", "platform_adhesion"]);

    Ok(())
}

#[test]
fn configured_rules_apply_to_documents() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/slicer-profile.valid.json")?;
    let config = parse_profile_config_json(&contents)?;

    let mut document = RawDocument::new();
    document.insert("platform_adhesion".into(), json!("raft"));
    document.insert("brim_width".into(), json!(5));
    let report = config.rule_table().apply(&mut document);

    assert_eq!(document.get("brim_width"), Some(&json!(0)));
    assert_eq!(document.get("skirts"), Some(&json!(0)));
    assert_eq!(report.applied().len(), 1);
    assert_eq!(report.applied()[0].rule_index, 2);
    Ok(())
}

#[test]
fn parses_default_toml_fixture() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/slicer-profile.default.toml")?;
    let config = parse_profile_config_toml(&contents)?;

    assert_eq!(config.default_engine, None);
    assert_eq!(config.logging.level, LogLevel::Info);
    assert_eq!(config.rule_table().len(), 1);
    Ok(())
}

#[test]
fn toml_rules_replace_builtin_rules() -> Result<(), Box<dyn Error>> {
    let config = load_profile_config_from_path(
        Some(&fixture_path("config/slicer-profile.rules.toml")),
        &ProfileEnv::default(),
    )?;

    let rules = config.rule_table().rules();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].trigger_value(), &json!("True"));
    let forced: Vec<&str> = rules[0]
        .overrides()
        .iter()
        .map(|forced| forced.key.as_str())
        .collect();
    assert_eq!(forced, vec!["fill_density", "wall_thickness"]);
    Ok(())
}

#[test]
fn invalid_fixture_reports_error_code() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/slicer-profile.invalid.json")?;
    let error = parse_profile_config_json(&contents)
        .err()
        .ok_or_else(|| std::io::Error::other("expected invalid fixture error"))?;

    assert_eq!(error.code, ErrorCode::new("config", "invalid_forced_rule"));
    assert_eq!(
        error.metadata.get("section").map(String::as_str),
        Some("forcedSettings")
    );
    assert_eq!(
        error.metadata.get("field").map(String::as_str),
        Some("triggerKey")
    );
    assert_eq!(error.metadata.get("index").map(String::as_str), Some("1"));
    Ok(())
}

#[test]
fn pretty_output_reparses_to_the_same_config() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/slicer-profile.valid.json")?;
    let config = parse_profile_config_json(&contents)?;

    let json = to_pretty_json(config.as_ref())?;
    let from_json = parse_profile_config_json(&json)?;
    assert_eq!(from_json.as_ref(), config.as_ref());

    let toml = to_pretty_toml(config.as_ref())?;
    let from_toml = parse_profile_config_toml(&toml)?;
    assert_eq!(from_toml.as_ref(), config.as_ref());
    Ok(())
}

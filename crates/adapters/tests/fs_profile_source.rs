//! Integration tests for the filesystem profile source.

use serde_json::json;
use slicer_profile_adapters::FsProfileSource;
use slicer_profile_ports::{EngineKind, ProfileSelection, ProfileSourcePort};
use slicer_profile_shared::{ErrorCode, RequestContext};
use std::error::Error;
use std::fs;
use std::path::Path;

fn write_profile(root: &Path, engine: &str, name: &str, contents: &str) -> std::io::Result<()> {
    let dir = root.join(engine);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(format!("{name}.json")), contents)
}

#[tokio::test]
async fn reads_profile_from_engine_directory() -> Result<(), Box<dyn Error>> {
    let temp = tempfile::tempdir()?;
    write_profile(
        temp.path(),
        "slic3r",
        "standard",
        r#"{"layer_height": "0.2", "spiral_vase": "0"}"#,
    )?;

    let source = FsProfileSource::new(temp.path());
    let selection = ProfileSelection::parse(EngineKind::Slic3r, "standard")?;
    let payload = source
        .fetch_profile(&RequestContext::new_request(), &selection)
        .await?;

    assert_eq!(payload, json!({"layer_height": "0.2", "spiral_vase": "0"}));
    Ok(())
}

#[tokio::test]
async fn missing_profile_maps_to_not_found() -> Result<(), Box<dyn Error>> {
    let temp = tempfile::tempdir()?;
    let source = FsProfileSource::new(temp.path());
    let selection = ProfileSelection::parse(EngineKind::Cura, "absent")?;

    let error = source
        .fetch_profile(&RequestContext::new_request(), &selection)
        .await
        .err()
        .ok_or_else(|| std::io::Error::other("expected not found"))?;

    assert_eq!(error.code, ErrorCode::not_found());
    assert_eq!(
        error.metadata.get("profile").map(String::as_str),
        Some("cura/absent")
    );
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_reported() -> Result<(), Box<dyn Error>> {
    let temp = tempfile::tempdir()?;
    write_profile(temp.path(), "cura", "broken", "{\"layer_height\": ")?;

    let source = FsProfileSource::new(temp.path());
    let selection = ProfileSelection::parse(EngineKind::Cura, "broken")?;
    let error = source
        .fetch_profile(&RequestContext::new_request(), &selection)
        .await
        .err()
        .ok_or_else(|| std::io::Error::other("expected parse error"))?;

    assert_eq!(error.code, ErrorCode::new("source", "invalid_json"));
    Ok(())
}

#[tokio::test]
async fn oversized_profiles_are_rejected() -> Result<(), Box<dyn Error>> {
    let temp = tempfile::tempdir()?;
    write_profile(temp.path(), "cura", "big", r#"{"layer_height": "0.1"}"#)?;

    let source = FsProfileSource::new(temp.path()).with_max_file_size(4);
    let selection = ProfileSelection::parse(EngineKind::Cura, "big")?;
    let error = source
        .fetch_profile(&RequestContext::new_request(), &selection)
        .await
        .err()
        .ok_or_else(|| std::io::Error::other("expected size error"))?;

    assert_eq!(error.code, ErrorCode::new("source", "profile_too_large"));
    Ok(())
}

#[tokio::test]
async fn cancelled_request_does_not_read() -> Result<(), Box<dyn Error>> {
    let temp = tempfile::tempdir()?;
    write_profile(temp.path(), "cura", "draft", "{}")?;

    let source = FsProfileSource::new(temp.path());
    let selection = ProfileSelection::parse(EngineKind::Cura, "draft")?;
    let ctx = RequestContext::new_request();
    ctx.cancel();

    let error = source
        .fetch_profile(&ctx, &selection)
        .await
        .err()
        .ok_or_else(|| std::io::Error::other("expected cancellation"))?;

    assert!(error.is_cancelled());
    Ok(())
}

#[test]
fn traversal_names_never_reach_the_filesystem() {
    for name in ["../secrets", "cura/../../etc", ".."] {
        assert!(
            ProfileSelection::parse(EngineKind::Cura, name).is_err(),
            "{name:?} should be rejected"
        );
    }
}

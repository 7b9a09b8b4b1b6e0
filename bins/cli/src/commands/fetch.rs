//! Fetch command handler: drives an overrides session against the filesystem store.

use crate::CliOutput;
use crate::commands::transform::resolve_engine;
use crate::error::CliError;
use crate::format::{OutputMode, pretty_json, push_override_lines, push_value_lines};
use serde_json::Value;
use slicer_profile_adapters::{FsProfileSource, TracingLogger};
use slicer_profile_app::{
    FetchOutcome, OverridesSession, OverridesSessionDeps, ProfileSummary, Submission,
};
use slicer_profile_config::ValidatedProfileConfig;
use slicer_profile_domain::EngineKind;
use slicer_profile_shared::{ErrorCode, ErrorEnvelope, RequestContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inputs for the fetch command.
pub struct FetchCommandInput<'a> {
    /// Engine from `--engine`, falling back to config.
    pub engine: Option<EngineKind>,
    /// Profile name.
    pub profile: &'a str,
    /// Store root from `--root`, falling back to config.
    pub root: Option<&'a Path>,
    /// Raw `key=value` edits.
    pub edits: &'a [String],
}

/// Run the fetch command.
pub fn run_fetch(
    mode: OutputMode,
    config: &ValidatedProfileConfig,
    input: FetchCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let engine = resolve_engine(input.engine, config)?;
    let root = resolve_root(input.root, config)?;
    let edits = input
        .edits
        .iter()
        .map(|edit| parse_edit(edit))
        .collect::<Result<Vec<_>, _>>()?;

    let session = OverridesSession::new(OverridesSessionDeps {
        source: Arc::new(FsProfileSource::new(root)),
        logger: Some(Arc::new(TracingLogger::new())),
        rules: config.rule_table().clone(),
    });
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (summary, submission) =
        runtime.block_on(fetch_and_submit(&session, engine, input.profile, edits))?;

    let stdout = if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "profile": summary,
            "submission": submission,
        }))?
    } else {
        format_fetch_text(&summary, &submission)
    };
    Ok(CliOutput::ok(stdout))
}

async fn fetch_and_submit(
    session: &OverridesSession,
    engine: EngineKind,
    profile: &str,
    edits: Vec<(String, Value)>,
) -> Result<(ProfileSummary, Submission), CliError> {
    let ctx = RequestContext::new_request();
    let summary = match session
        .on_profile_change(&ctx, Some(engine), Some(profile))
        .await?
    {
        Some(FetchOutcome::Applied(summary)) => summary,
        Some(FetchOutcome::Superseded) => {
            return Err(ErrorEnvelope::invariant(
                ErrorCode::internal(),
                "single profile fetch was superseded",
            )
            .into());
        },
        None => return Err(CliError::InvalidInput("profile name is blank".to_string())),
    };

    for (key, value) in edits {
        session.set_field(&key, value).await?;
    }
    let submission = session.submission().await?;
    Ok((summary, submission))
}

fn resolve_root(root: Option<&Path>, config: &ValidatedProfileConfig) -> Result<PathBuf, CliError> {
    root.map(Path::to_path_buf)
        .or_else(|| config.profile_root.as_deref().map(PathBuf::from))
        .ok_or_else(|| {
            CliError::InvalidInput("no profile root; pass --root or set profileRoot".to_string())
        })
}

/// `key=value`; the value is read as JSON when it parses, otherwise as a plain string.
fn parse_edit(edit: &str) -> Result<(String, Value), CliError> {
    let Some((key, raw)) = edit.split_once('=') else {
        return Err(CliError::InvalidInput(format!(
            "field edit `{edit}` must look like key=value"
        )));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "field edit `{edit}` has an empty key"
        )));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn format_fetch_text(summary: &ProfileSummary, submission: &Submission) -> String {
    let mut out = String::new();
    out.push_str("status: ok\n");
    out.push_str("selection: ");
    out.push_str(&summary.selection);
    out.push('\n');
    out.push_str("engine: ");
    out.push_str(summary.engine.id());
    out.push('\n');
    out.push_str(&format!(
        "applicable: {}\ninapplicable: {}\n",
        summary.applicable, summary.inapplicable
    ));
    out.push_str("fidelityGaps: ");
    if summary.fidelity_gaps.is_empty() {
        out.push_str("none");
    } else {
        out.push_str(&summary.fidelity_gaps.join(", "));
    }
    out.push('\n');
    push_override_lines(&mut out, &submission.overrides);
    push_value_lines(
        &mut out,
        "values",
        submission
            .values
            .iter()
            .map(|(key, value)| (key.as_str(), value)),
    );
    out
}

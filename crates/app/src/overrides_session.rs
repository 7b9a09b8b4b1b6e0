//! Overrides session use case.
//!
//! Loads a profile for the selected (engine, profile) pair, normalizes it, lets
//! the caller edit canonical values, and produces the `profile.`-prefixed
//! submission. Only the most recent fetch may update the session: starting a
//! new fetch cancels the previous one, and a response that arrives for an
//! older generation is dropped without being normalized.

use crate::error::SessionError;
use serde::Serialize;
use serde_json::{Map, Value};
use slicer_profile_domain::{
    CanonicalProfile, EngineKind, FieldCategory, OverrideReport, OverrideRuleTable, RawDocument,
    SchemaMode, catalog, denormalize_with_report, normalize, raw_document,
};
use slicer_profile_ports::{
    LogEvent, LogFields, LogLevel, LoggerPort, ProfileSelection, ProfileSourcePort,
};
use slicer_profile_shared::{CancellationToken, ErrorEnvelope, RequestContext, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Prefix the host expects on every submitted key.
pub const SUBMISSION_KEY_PREFIX: &str = "profile.";

/// Dependencies required by an [`OverridesSession`].
#[derive(Clone)]
pub struct OverridesSessionDeps {
    /// Where raw profile payloads come from.
    pub source: Arc<dyn ProfileSourcePort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Rules applied at submission time.
    pub rules: OverrideRuleTable,
}

/// Shape of a freshly loaded profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    /// `engine/profile` the payload was loaded for.
    pub selection: String,
    /// Engine of the loaded profile.
    pub engine: EngineKind,
    /// Keys with a value.
    pub applicable: usize,
    /// Catalog keys the engine does not define.
    pub inapplicable: usize,
    /// Boolean keys coerced by truthiness.
    pub fidelity_gaps: Vec<String>,
}

/// Result of [`OverridesSession::fetch_profile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The payload was normalized and is now the session profile.
    Applied(ProfileSummary),
    /// A newer fetch started first; this response was discarded.
    Superseded,
}

impl FetchOutcome {
    /// True when the response was discarded.
    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

/// Denormalized, prefixed document ready for the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Values keyed `profile.<setting>`.
    pub values: Map<String, Value>,
    /// Rules that fired while building `values`.
    pub overrides: OverrideReport,
}

/// Stateful overrides editor for one host slicing dialog.
pub struct OverridesSession {
    source: Arc<dyn ProfileSourcePort>,
    logger: Option<Arc<dyn LoggerPort>>,
    rules: OverrideRuleTable,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    generation: u64,
    in_flight: Option<CancellationToken>,
    loaded: Option<LoadedProfile>,
}

struct LoadedProfile {
    selection: ProfileSelection,
    profile: CanonicalProfile,
}

struct Prepared {
    profile: CanonicalProfile,
    summary: ProfileSummary,
    fallbacks: Vec<(String, Value)>,
}

impl OverridesSession {
    /// Session with no profile loaded.
    #[must_use]
    pub fn new(deps: OverridesSessionDeps) -> Self {
        Self {
            source: deps.source,
            logger: deps.logger,
            rules: deps.rules,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Rules applied by [`OverridesSession::submission`].
    #[must_use]
    pub const fn rules(&self) -> &OverrideRuleTable {
        &self.rules
    }

    /// React to the host changing its engine or profile selection.
    ///
    /// Returns `Ok(None)` without fetching while either half is unset.
    pub async fn on_profile_change(
        &self,
        ctx: &RequestContext,
        engine: Option<EngineKind>,
        profile: Option<&str>,
    ) -> Result<Option<FetchOutcome>> {
        let (Some(engine), Some(profile)) = (engine, profile) else {
            return Ok(None);
        };
        if profile.trim().is_empty() {
            return Ok(None);
        }
        let selection = ProfileSelection::parse(engine, profile)?;
        self.fetch_profile(ctx, selection).await.map(Some)
    }

    /// Fetch `selection`, cancelling any fetch still in flight.
    pub async fn fetch_profile(
        &self,
        ctx: &RequestContext,
        selection: ProfileSelection,
    ) -> Result<FetchOutcome> {
        ctx.ensure_not_cancelled("overrides_session.fetch")?;

        let (generation, token) = self.begin_fetch().await;
        let fields = fetch_fields(&selection, generation);
        self.log(
            LogLevel::Debug,
            "profile.fetch.start",
            "Profile fetch started",
            fields.clone(),
        );

        let request = RequestContext::with_cancellation(ctx.correlation_id().clone(), token.clone());
        let fetched = tokio::select! {
            biased;
            () = token.cancelled() => None,
            () = ctx.cancelled() => Some(Err(
                ErrorEnvelope::cancelled("profile fetch cancelled")
                    .with_metadata("profile", selection.to_string()),
            )),
            result = self.source.fetch_profile(&request, &selection) => Some(result),
        };
        let Some(fetched) = fetched else {
            return Ok(self.superseded(fields));
        };

        let mut state = self.state.lock().await;
        if state.generation != generation || token.is_cancelled() {
            drop(state);
            return Ok(self.superseded(fields));
        }
        state.in_flight = None;

        let prepared = fetched.and_then(|payload| prepare(&selection, &payload));
        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(error) => {
                drop(state);
                self.log_fetch_error(fields, &error);
                return Err(error);
            },
        };

        let summary = prepared.summary.clone();
        state.loaded = Some(LoadedProfile {
            selection,
            profile: prepared.profile,
        });
        drop(state);

        self.log_loaded(&summary, prepared.fallbacks);
        Ok(FetchOutcome::Applied(summary))
    }

    /// Replace the session profile with an already-fetched payload.
    ///
    /// Does not cancel or supersede an in-flight fetch.
    pub async fn update_from_profile(
        &self,
        selection: ProfileSelection,
        payload: &Value,
    ) -> Result<ProfileSummary> {
        let prepared = prepare(&selection, payload)?;
        let summary = prepared.summary.clone();
        {
            let mut state = self.state.lock().await;
            state.loaded = Some(LoadedProfile {
                selection,
                profile: prepared.profile,
            });
        }
        self.log_loaded(&summary, prepared.fallbacks);
        Ok(summary)
    }

    /// Selection of the loaded profile.
    pub async fn selection(&self) -> Option<ProfileSelection> {
        let state = self.state.lock().await;
        state.loaded.as_ref().map(|loaded| loaded.selection.clone())
    }

    /// Snapshot of the loaded canonical profile.
    pub async fn profile(&self) -> Option<CanonicalProfile> {
        let state = self.state.lock().await;
        state.loaded.as_ref().map(|loaded| loaded.profile.clone())
    }

    /// Canonical value of `key`, if a profile is loaded and the key is applicable.
    pub async fn field(&self, key: &str) -> Option<Value> {
        let state = self.state.lock().await;
        state
            .loaded
            .as_ref()
            .and_then(|loaded| loaded.profile.value(key).cloned())
    }

    /// Set a canonical value. `null` clears the key.
    ///
    /// Catalog engines only accept catalog keys, and boolean keys only accept
    /// `true` or `false`; the dynamic engine accepts any key and value.
    pub async fn set_field(&self, key: &str, value: Value) -> Result<()> {
        let mut state = self.state.lock().await;
        let loaded = state
            .loaded
            .as_mut()
            .ok_or(SessionError::NoProfileLoaded)?;
        let engine = loaded.profile.engine();
        if engine.schema() == SchemaMode::Catalog {
            match catalog().category_of(key) {
                None => {
                    return Err(SessionError::UnknownKey {
                        key: key.to_string(),
                        engine: engine.id(),
                    }
                    .into());
                },
                Some(FieldCategory::Boolean) if !value.is_null() && !value.is_boolean() => {
                    return Err(SessionError::InvalidValue {
                        key: key.to_string(),
                        expected: "boolean",
                    }
                    .into());
                },
                Some(_) => {},
            }
        }
        if value.is_null() {
            loaded.profile.clear_value(key);
        } else {
            loaded.profile.set_value(key, value);
        }
        Ok(())
    }

    /// Legal values of an enumerated key; `None` for any other key.
    #[must_use]
    pub fn options_for_key(&self, key: &str) -> Option<&'static [&'static str]> {
        catalog().enum_values_of(key).ok()
    }

    /// Denormalize the loaded profile for its engine and prefix every key.
    pub async fn submission(&self) -> Result<Submission> {
        let denormalized = {
            let state = self.state.lock().await;
            let loaded = state.loaded.as_ref().ok_or(SessionError::NoProfileLoaded)?;
            denormalize_with_report(&loaded.profile, loaded.profile.engine(), &self.rules)
        };

        for applied in denormalized.overrides.applied() {
            let mut fields = LogFields::new();
            fields.insert("ruleIndex".into(), Value::from(applied.rule_index));
            fields.insert("triggerKey".into(), Value::from(applied.trigger_key.as_str()));
            fields.insert(
                "forcedKeys".into(),
                Value::from(applied.forced_keys.clone()),
            );
            self.log(
                LogLevel::Info,
                "profile.submission.overrideApplied",
                "Forced settings applied",
                fields,
            );
        }
        let conflicts = denormalized.overrides.conflicting_keys();
        if !conflicts.is_empty() {
            let mut fields = LogFields::new();
            fields.insert("keys".into(), Value::from(conflicts));
            self.log(
                LogLevel::Warn,
                "profile.submission.overrideConflict",
                "Several rules forced the same keys; the last rule wins",
                fields,
            );
        }

        let values = denormalized
            .document
            .into_iter()
            .map(|(key, value)| (format!("{SUBMISSION_KEY_PREFIX}{key}"), value))
            .collect();
        Ok(Submission {
            values,
            overrides: denormalized.overrides,
        })
    }

    async fn begin_fetch(&self) -> (u64, CancellationToken) {
        let mut state = self.state.lock().await;
        if let Some(previous) = state.in_flight.take() {
            previous.cancel();
        }
        state.generation = state.generation.wrapping_add(1);
        let token = CancellationToken::new();
        state.in_flight = Some(token.clone());
        (state.generation, token)
    }

    fn superseded(&self, fields: LogFields) -> FetchOutcome {
        self.log(
            LogLevel::Debug,
            "profile.fetch.superseded",
            "Profile fetch superseded by a newer selection",
            fields,
        );
        FetchOutcome::Superseded
    }

    fn log_fetch_error(&self, fields: LogFields, error: &ErrorEnvelope) {
        let Some(logger) = self.logger.as_ref() else {
            return;
        };
        let event = if error.is_cancelled() {
            LogEvent::new(LogLevel::Info, "profile.fetch.cancelled", "Profile fetch cancelled")
        } else {
            LogEvent::new(LogLevel::Error, "profile.fetch.failed", "Profile fetch failed")
        };
        logger.log(event.with_fields(fields).with_error(error));
    }

    fn log_loaded(&self, summary: &ProfileSummary, fallbacks: Vec<(String, Value)>) {
        for (key, raw) in fallbacks {
            let mut fields = LogFields::new();
            fields.insert("selection".into(), Value::from(summary.selection.as_str()));
            fields.insert("key".into(), Value::from(key));
            fields.insert("raw".into(), raw);
            self.log(
                LogLevel::Warn,
                "profile.normalize.booleanFallback",
                "Unrecognized boolean literal coerced by truthiness",
                fields,
            );
        }

        let mut fields = LogFields::new();
        fields.insert("selection".into(), Value::from(summary.selection.as_str()));
        fields.insert("applicable".into(), Value::from(summary.applicable));
        fields.insert("inapplicable".into(), Value::from(summary.inapplicable));
        self.log(
            LogLevel::Info,
            "profile.normalize.completed",
            "Profile normalized",
            fields,
        );
    }

    fn log(&self, level: LogLevel, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.logger.as_ref() {
            logger.log(LogEvent::new(level, event, message).with_fields(fields));
        }
    }
}

fn fetch_fields(selection: &ProfileSelection, generation: u64) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("selection".into(), Value::from(selection.to_string()));
    fields.insert("generation".into(), Value::from(generation));
    fields
}

/// Settings document inside a host payload.
///
/// The dynamic-schema engine nests its settings under
/// `metadata.octoprint_settings`; catalog engines send the document itself.
pub fn settings_document(engine: EngineKind, payload: &Value) -> Result<&RawDocument> {
    let document = match engine.schema() {
        SchemaMode::Catalog => payload,
        SchemaMode::Dynamic => payload
            .get("metadata")
            .and_then(|metadata| metadata.get("octoprint_settings"))
            .ok_or(SessionError::MissingEmbeddedSettings {
                engine: engine.id(),
            })?,
    };
    Ok(raw_document(document)?)
}

fn prepare(selection: &ProfileSelection, payload: &Value) -> Result<Prepared> {
    let document = settings_document(selection.engine, payload)
        .map_err(|error| error.with_metadata("profile", selection.to_string()))?;
    let profile = normalize(document, selection.engine);
    let fallbacks = profile
        .fidelity_gaps()
        .map(|key| {
            let raw = document.get(key).cloned().unwrap_or(Value::Null);
            (key.to_string(), raw)
        })
        .collect();
    let summary = ProfileSummary {
        selection: selection.to_string(),
        engine: selection.engine,
        applicable: profile.len(),
        inapplicable: profile.inapplicable_keys().count(),
        fidelity_gaps: profile.fidelity_gaps().map(str::to_string).collect(),
    };
    Ok(Prepared {
        profile,
        summary,
        fallbacks,
    })
}

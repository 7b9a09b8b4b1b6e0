//! In-memory adapter implementations for port contracts.
//!
//! These implementations are intended for:
//! - Unit/integration tests
//! - Deterministic stale-fetch scenarios (see [`ProfileGate`])

use serde_json::Value;
use slicer_profile_ports::{
    BoxFuture, LogEvent, LogFields, LoggerPort, ProfileSelection, ProfileSourcePort,
};
use slicer_profile_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{RwLock, Semaphore};

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// Logger that keeps every event for later assertions.
///
/// Children share the parent's event buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
    base_fields: LogFields,
}

impl RecordingLogger {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded event, oldest first.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Names of every recorded event, oldest first.
    pub fn event_names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| event.event.to_string())
            .collect()
    }

    /// Events with the given name.
    pub fn events_named(&self, name: &str) -> Vec<LogEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.event.as_ref() == name)
            .collect()
    }
}

impl LoggerPort for RecordingLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base_fields.is_empty() {
            let mut fields = self.base_fields.clone();
            fields.extend(event.fields.take().unwrap_or_default());
            event.fields = Some(fields);
        }
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base_fields = self.base_fields.clone();
        base_fields.extend(fields);
        Box::new(Self {
            events: Arc::clone(&self.events),
            base_fields,
        })
    }
}

/// Profile source backed by a map of canned payloads.
#[derive(Debug, Default)]
pub struct InMemoryProfileSource {
    profiles: RwLock<HashMap<ProfileSelection, Value>>,
    gates: Mutex<HashMap<ProfileSelection, Arc<Semaphore>>>,
    fetches: AtomicUsize,
}

impl InMemoryProfileSource {
    /// Source with no profiles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: serve `payload` for `selection`.
    #[must_use]
    pub fn with_profile(mut self, selection: ProfileSelection, payload: Value) -> Self {
        self.profiles.get_mut().insert(selection, payload);
        self
    }

    /// Serve `payload` for `selection`, replacing any previous payload.
    pub async fn insert(&self, selection: ProfileSelection, payload: Value) {
        self.profiles.write().await.insert(selection, payload);
    }

    /// Hold every later fetch of `selection` until the returned gate is released.
    pub fn gate(&self, selection: &ProfileSelection) -> ProfileGate {
        let permits = Arc::new(Semaphore::new(0));
        if let Ok(mut gates) = self.gates.lock() {
            gates.insert(selection.clone(), Arc::clone(&permits));
        }
        ProfileGate { permits }
    }

    /// Number of fetches started so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ProfileSourcePort for InMemoryProfileSource {
    fn fetch_profile(
        &self,
        ctx: &RequestContext,
        selection: &ProfileSelection,
    ) -> BoxFuture<'_, Result<Value>> {
        let ctx = ctx.clone();
        let selection = selection.clone();
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            ctx.ensure_not_cancelled("in_memory_profile_source.fetch")?;

            let gate = self
                .gates
                .lock()
                .ok()
                .and_then(|gates| gates.get(&selection).cloned());
            if let Some(gate) = gate {
                tokio::select! {
                    () = ctx.cancelled() => {
                        return Err(ErrorEnvelope::cancelled("fetch cancelled while gated")
                            .with_metadata("profile", selection.to_string()));
                    },
                    permit = gate.acquire() => {
                        permit
                            .map_err(|_| {
                                ErrorEnvelope::invariant(ErrorCode::internal(), "profile gate closed")
                            })?
                            .forget();
                    },
                }
            }

            let profiles = self.profiles.read().await;
            profiles.get(&selection).cloned().ok_or_else(|| {
                ErrorEnvelope::expected(ErrorCode::not_found(), "profile not found")
                    .with_metadata("profile", selection.to_string())
            })
        })
    }
}

/// Release handle returned by [`InMemoryProfileSource::gate`].
#[derive(Debug, Clone)]
pub struct ProfileGate {
    permits: Arc<Semaphore>,
}

impl ProfileGate {
    /// Let one held fetch proceed. Releasing before the fetch arrives is fine.
    pub fn release(&self) {
        self.permits.add_permits(1);
    }
}

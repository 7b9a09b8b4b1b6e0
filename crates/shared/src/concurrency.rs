//! Request-scoped context and cancellation.
//!
//! A profile fetch can be superseded by a newer selection before it resolves.
//! The session cancels the older request's token so its result is dropped
//! instead of being normalized.

use crate::{ErrorCode, ErrorEnvelope, Result};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

/// Identifier used to correlate log events for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Parse a caller-supplied id. Surrounding whitespace is trimmed; empty ids are rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "correlationId must be non-empty",
            ));
        }
        Ok(Self(Arc::from(trimmed)))
    }

    /// Next process-unique `req_<n>` id.
    #[must_use]
    pub fn new_request_id() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        Self(Arc::from(format!("req_{n}")))
    }

    /// Borrow as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Clonable cancellation flag that can also be awaited.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

#[derive(Debug)]
struct CancellationState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// New, not-yet-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationState {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Cancel and wake every waiter. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// True once [`CancellationToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve when the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Context passed across port boundaries.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Context with a fresh cancellation token.
    #[must_use]
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self::with_cancellation(correlation_id, CancellationToken::new())
    }

    /// Context with an auto-generated `req_*` id.
    #[must_use]
    pub fn new_request() -> Self {
        Self::new(CorrelationId::new_request_id())
    }

    /// Context sharing an existing cancellation token.
    #[must_use]
    pub const fn with_cancellation(
        correlation_id: CorrelationId,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            correlation_id,
            cancellation,
        }
    }

    /// Derive a child context with the same id and its own token.
    ///
    /// Cancelling the child does not cancel the parent.
    #[must_use]
    pub fn child(&self) -> Self {
        Self::new(self.correlation_id.clone())
    }

    /// Correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Clone of the cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// True if this request was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancel this request.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Resolve when this request is cancelled.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

    /// `core:cancelled` error tagged with `operation` when cancelled.
    pub fn ensure_not_cancelled(&self, operation: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(ErrorEnvelope::cancelled("operation cancelled")
                .with_metadata("operation", operation)
                .with_metadata("correlationId", self.correlation_id.as_str()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn correlation_id_rejects_blank_input() {
        assert!(CorrelationId::parse("   ").is_err());
        assert!(matches!(
            CorrelationId::parse(" req_7 ").map(|id| id.to_string()),
            Ok(ref id) if id == "req_7"
        ));
    }

    #[test]
    fn request_ids_are_unique() {
        let first = CorrelationId::new_request_id();
        let second = CorrelationId::new_request_id();
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("req_"));
    }

    #[test]
    fn child_context_cancels_independently() {
        let parent = RequestContext::new_request();
        let child = parent.child();
        child.cancel();

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
        assert_eq!(child.correlation_id(), parent.correlation_id());
    }

    #[test]
    fn ensure_not_cancelled_reports_operation() {
        let ctx = RequestContext::new_request();
        assert!(ctx.ensure_not_cancelled("fetch").is_ok());

        ctx.cancel();
        let error = ctx.ensure_not_cancelled("fetch").err();
        assert_eq!(
            error
                .as_ref()
                .and_then(|error| error.metadata.get("operation"))
                .map(String::as_str),
            Some("fetch")
        );
        assert!(error.is_some_and(|error| error.is_cancelled()));
    }

    #[tokio::test]
    async fn cancelled_future_wakes_waiters() {
        let token = CancellationToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn cancelled_future_resolves_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let resolved = tokio::time::timeout(Duration::from_millis(50), token.cancelled()).await;
        assert!(resolved.is_ok());
    }
}

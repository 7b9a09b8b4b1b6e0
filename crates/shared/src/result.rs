//! Result alias and error-context helpers.

use crate::errors::ErrorEnvelope;

/// Workspace-wide result type.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Context helpers for results carrying an [`ErrorEnvelope`].
pub trait ResultExt<T> {
    /// Attach a metadata entry to the error, if any.
    fn with_metadata(self, key: &str, value: impl Into<String>) -> Result<T>;

    /// Prefix the error message with a short description of the failed step.
    fn context(self, step: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_metadata(self, key: &str, value: impl Into<String>) -> Result<T> {
        self.map_err(|error| error.with_metadata(key, value))
    }

    fn context(self, step: &str) -> Result<T> {
        self.map_err(|mut error| {
            error.message = format!("{step}: {}", error.message);
            error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn with_metadata_only_touches_errors() {
        let ok: Result<u8> = Ok(1);
        assert!(matches!(ok.with_metadata("profile", "pla"), Ok(1)));

        let failed: Result<u8> = Err(ErrorEnvelope::expected(ErrorCode::not_found(), "missing"));
        let error = failed.with_metadata("profile", "pla").err();
        assert_eq!(
            error
                .as_ref()
                .and_then(|error| error.metadata.get("profile"))
                .map(String::as_str),
            Some("pla")
        );
    }

    #[test]
    fn context_prefixes_message() {
        let failed: Result<()> = Err(ErrorEnvelope::expected(ErrorCode::io(), "denied"));
        let error = failed.context("read profile").err();
        assert_eq!(
            error.map(|error| error.message),
            Some("read profile: denied".to_string())
        );
    }
}

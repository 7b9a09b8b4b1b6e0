//! Filesystem profile source.
//!
//! Profiles are stored as `<root>/<engine-id>/<profile>.json`. The profile
//! segment is a validated [`ProfileName`](slicer_profile_ports::ProfileName),
//! so it cannot escape the engine directory.

use slicer_profile_ports::{BoxFuture, ProfileSelection, ProfileSourcePort};
use slicer_profile_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::io;
use std::path::{Path, PathBuf};

const PROFILE_EXTENSION: &str = "json";

/// Local filesystem profile source using async IO.
#[derive(Debug, Clone)]
pub struct FsProfileSource {
    root: PathBuf,
    max_file_size_bytes: Option<u64>,
}

impl FsProfileSource {
    /// Source rooted at `root` with no size limit.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size_bytes: None,
        }
    }

    /// Reject profile files larger than `limit` bytes.
    #[must_use]
    pub const fn with_max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size_bytes = Some(limit);
        self
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path the source reads for `selection`.
    pub fn profile_path(&self, selection: &ProfileSelection) -> PathBuf {
        self.root
            .join(selection.engine.id())
            .join(format!("{}.{PROFILE_EXTENSION}", selection.profile))
    }
}

impl ProfileSourcePort for FsProfileSource {
    fn fetch_profile(
        &self,
        ctx: &RequestContext,
        selection: &ProfileSelection,
    ) -> BoxFuture<'_, Result<serde_json::Value>> {
        let ctx = ctx.clone();
        let selection = selection.clone();
        let path = self.profile_path(&selection);
        let max_file_size_bytes = self.max_file_size_bytes;
        Box::pin(async move {
            ctx.ensure_not_cancelled("fs_profile_source.fetch")?;

            let metadata = tokio::fs::metadata(&path)
                .await
                .map_err(|error| read_error(error, &selection, &path))?;
            if !metadata.is_file() {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::invalid_input(),
                    "profile path is not a file",
                )
                .with_metadata("profile", selection.to_string()));
            }
            if let Some(limit) = max_file_size_bytes {
                if metadata.len() > limit {
                    return Err(ErrorEnvelope::expected(
                        ErrorCode::new("source", "profile_too_large"),
                        "profile file exceeds max size",
                    )
                    .with_metadata("profile", selection.to_string())
                    .with_metadata("limitBytes", limit.to_string())
                    .with_metadata("sizeBytes", metadata.len().to_string()));
                }
            }

            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|error| read_error(error, &selection, &path))?;
            ctx.ensure_not_cancelled("fs_profile_source.fetch")?;

            serde_json::from_str(&contents).map_err(|error| {
                ErrorEnvelope::expected(
                    ErrorCode::new("source", "invalid_json"),
                    format!("profile is not valid JSON: {error}"),
                )
                .with_metadata("profile", selection.to_string())
                .with_metadata("line", error.line().to_string())
            })
        })
    }
}

fn read_error(error: io::Error, selection: &ProfileSelection, path: &Path) -> ErrorEnvelope {
    let envelope = if error.kind() == io::ErrorKind::NotFound {
        ErrorEnvelope::expected(ErrorCode::not_found(), "profile not found")
    } else {
        ErrorEnvelope::from(error)
    };
    envelope
        .with_metadata("profile", selection.to_string())
        .with_metadata("path", path.display().to_string())
}

//! Static file serving.
//!
//! URL prefixes are mounted onto directories. A request path under a mounted
//! prefix is resolved inside that directory and served before middleware
//! and routing run. Anything that cannot be served safely is reported as
//! "not found" and the request carries on down the normal pipeline.

use std::path::{Path, PathBuf};

use crate::http::mime;
use crate::http::util::contains_path_traversal;

/// A URL prefix mapped to a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub prefix: String,
    pub directory: PathBuf,
}

/// A file ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    pub content: Vec<u8>,
    pub content_type: &'static str,
    pub status: u16,
}

/// The set of static mounts, checked in registration order.
#[derive(Debug, Clone, Default)]
pub struct StaticFiles {
    mounts: Vec<Mount>,
}

impl StaticFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves files under `directory` for request paths starting with `prefix`.
    pub fn mount(&mut self, prefix: impl Into<String>, directory: impl Into<PathBuf>) -> &mut Self {
        self.mounts.push(Mount {
            prefix: prefix.into(),
            directory: directory.into(),
        });
        self
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// The first mount whose prefix `path` starts with.
    pub fn matches(&self, path: &str) -> Option<&Mount> {
        self.mounts.iter().find(|m| path.starts_with(&m.prefix))
    }

    /// Resolves and reads the file for `request_path`.
    ///
    /// Returns `None` when no mount applies, the path tries to escape the
    /// mounted directory, or the file is missing or unreadable.
    pub async fn try_serve(&self, request_path: &str) -> Option<StaticFile> {
        let mount = self.matches(request_path)?;
        let file = resolve(mount, request_path).await?;

        match tokio::fs::read(&file).await {
            Ok(content) => {
                tracing::debug!(path = request_path, file = %file.display(), "serving static file");
                Some(StaticFile {
                    content,
                    content_type: mime::from_path(&file),
                    status: 200,
                })
            }
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "failed to read static file");
                None
            }
        }
    }
}

/// Maps a request path onto a regular file inside the mount's directory.
async fn resolve(mount: &Mount, request_path: &str) -> Option<PathBuf> {
    let relative = request_path[mount.prefix.len()..].trim_start_matches('/');

    if relative.is_empty() || contains_path_traversal(relative) {
        return None;
    }

    let root = tokio::fs::canonicalize(&mount.directory).await.ok()?;
    let candidate = tokio::fs::canonicalize(root.join(relative)).await.ok()?;

    if !is_within(&root, &candidate) {
        tracing::warn!(path = request_path, "static path escapes mounted directory");
        return None;
    }

    let meta = tokio::fs::metadata(&candidate).await.ok()?;
    meta.is_file().then_some(candidate)
}

fn is_within(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

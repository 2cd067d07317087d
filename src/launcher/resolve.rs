use std::path::{Path, PathBuf};

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::lib::errors::LaunchError;

/// Resolve-once lookup of the Claude Code executable on `PATH`.
///
/// The primary name is tried first, then each alternative in order. The
/// first hit is cached for the lifetime of the resolver; concurrent callers
/// share one search.
#[derive(Debug)]
pub struct ExecutableResolver {
    primary: String,
    alternatives: Vec<String>,
    resolved: OnceCell<PathBuf>,
}

impl ExecutableResolver {
    pub fn new(primary: impl Into<String>, alternatives: Vec<String>) -> Self {
        Self {
            primary: primary.into(),
            alternatives,
            resolved: OnceCell::new(),
        }
    }

    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.alternatives.iter().map(String::as_str))
    }

    /// Path found by an earlier successful resolution.
    pub fn cached(&self) -> Option<&Path> {
        self.resolved.get().map(PathBuf::as_path)
    }

    pub async fn resolve(&self) -> Result<PathBuf, LaunchError> {
        self.resolved
            .get_or_try_init(|| async { self.search() })
            .await
            .cloned()
    }

    fn search(&self) -> Result<PathBuf, LaunchError> {
        for candidate in self.candidates() {
            match which::which(candidate) {
                Ok(path) => {
                    info!(
                        target: "ccenv::launcher",
                        candidate,
                        path = %path.display(),
                        "Resolved Claude Code executable"
                    );
                    return Ok(path);
                }
                Err(err) => {
                    debug!(
                        target: "ccenv::launcher",
                        candidate,
                        reason = %err,
                        "Executable candidate not found"
                    );
                }
            }
        }

        Err(LaunchError::ExecutableNotFound {
            name: self.primary.clone(),
            tried: self.candidates().map(str::to_string).collect(),
        })
    }
}

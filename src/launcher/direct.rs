use crate::config::LauncherSection;

use super::{ExecutableResolver, Launcher, LauncherCore};

/// Launches Claude Code and reports a non-zero exit as [`crate::lib::errors::LaunchError::Exit`].
///
/// Switching pass-through mode on makes it mirror the child's exit code
/// instead, exactly like [`super::PassthroughLauncher`].
#[derive(Debug)]
pub struct DirectLauncher {
    core: LauncherCore,
}

impl DirectLauncher {
    pub fn new(settings: &LauncherSection) -> Self {
        Self {
            core: LauncherCore::from_settings(settings, false),
        }
    }

    /// Launcher for a specific executable name and fallbacks.
    pub fn with_executable(primary: impl Into<String>, alternatives: Vec<String>) -> Self {
        Self {
            core: LauncherCore::new(ExecutableResolver::new(primary, alternatives), false),
        }
    }
}

impl Default for DirectLauncher {
    fn default() -> Self {
        Self::new(&LauncherSection::default())
    }
}

impl Launcher for DirectLauncher {
    fn core(&self) -> &LauncherCore {
        &self.core
    }
}

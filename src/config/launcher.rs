use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_EXECUTABLE: &str = "claude";
pub const DEFAULT_ALTERNATIVES: &[&str] = &["claude-code"];
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Launcher settings: which executable to run and the optional deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherSection {
    pub executable: String,
    pub alternatives: Vec<String>,
    pub default_environment: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for LauncherSection {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            alternatives: DEFAULT_ALTERNATIVES.iter().map(|s| s.to_string()).collect(),
            default_environment: None,
            timeout: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawLauncherSection {
    pub executable: Option<String>,
    pub alternatives: Option<Vec<String>>,
    pub default_environment: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub fn parse_launcher_section(
    raw: Option<RawLauncherSection>,
    path: &Path,
) -> Result<LauncherSection, ConfigError> {
    let raw = raw.unwrap_or_default();
    let defaults = LauncherSection::default();

    let executable = raw.executable.unwrap_or(defaults.executable);
    if executable.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "launcher.executable",
            message: "Executable name cannot be empty".into(),
        });
    }

    let alternatives = raw.alternatives.unwrap_or(defaults.alternatives);
    if alternatives.iter().any(|name| name.trim().is_empty()) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "launcher.alternatives",
            message: "Alternative executable names cannot be empty".into(),
        });
    }

    if let Some(secs) = raw.timeout_secs {
        if secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidField {
                path: path.to_path_buf(),
                field: "launcher.timeout_secs",
                message: format!("Use at most {MAX_TIMEOUT_SECS} seconds (0 selects the default)"),
            });
        }
    }

    Ok(LauncherSection {
        executable,
        alternatives,
        default_environment: raw
            .default_environment
            .filter(|name| !name.trim().is_empty()),
        timeout: raw.timeout_secs.map(Duration::from_secs),
    })
}

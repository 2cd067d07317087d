use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use serde::Serialize;
use thiserror::Error;

use crate::launcher::ParameterError;

/// Exit code reported when no executable could be resolved.
pub const EXIT_CODE_NOT_FOUND: i32 = 127;

/// Errors that can occur while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize the document into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Required field is missing.
    #[error("Configuration file {path} is missing `{field}`")]
    MissingField { path: PathBuf, field: &'static str },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
    /// The requested environment is not defined.
    #[error("Environment `{name}` is not defined (available: {})", available.join(", "))]
    UnknownEnvironment {
        name: String,
        available: Vec<String>,
    },
    /// Several environments exist and none was selected.
    #[error("Select an environment with --env (available: {})", available.join(", "))]
    AmbiguousEnvironment { available: Vec<String> },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Failures of a single launch. None of them are retried and none carry the API key.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Invalid launch parameters: {0}")]
    InvalidParameters(#[from] ParameterError),
    #[error("Claude Code executable `{name}` was not found (tried: {})", tried.join(", "))]
    ExecutableNotFound { name: String, tried: Vec<String> },
    #[error("Failed to start {path} with arguments {args:?}: {source}")]
    Spawn {
        path: PathBuf,
        args: Vec<String>,
        #[source]
        source: io::Error,
    },
    #[error("Failed to install signal forwarding: {source}")]
    SignalSetup {
        #[source]
        source: io::Error,
    },
    #[error("Failed while waiting for Claude Code to exit: {source}")]
    Wait {
        #[source]
        source: io::Error,
    },
    #[error("Claude Code exited with status {code}")]
    Exit { code: i32, signal_forwarded: bool },
    #[error("Claude Code was stopped after exceeding the {duration_secs} second timeout")]
    Timeout { duration_secs: u64 },
}

impl LaunchError {
    /// Static description of this failure class.
    pub fn descriptor(&self) -> &'static ErrorDescriptor {
        match self {
            LaunchError::InvalidParameters(_) => &INVALID_PARAMETERS_ERROR,
            LaunchError::ExecutableNotFound { .. } => &EXECUTABLE_NOT_FOUND_ERROR,
            LaunchError::Spawn { .. } => &SPAWN_FAILED_ERROR,
            LaunchError::SignalSetup { .. } | LaunchError::Wait { .. } => &SUPERVISION_ERROR,
            LaunchError::Exit { .. } => &EXIT_STATUS_ERROR,
            LaunchError::Timeout { .. } => &TIMEOUT_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        self.descriptor().code
    }

    pub fn suggestions(&self) -> &'static [&'static str] {
        self.descriptor().suggestions
    }

    /// Launch failures are terminal; the child is never restarted.
    pub fn retryable(&self) -> bool {
        false
    }

    /// Process exit code the binary should report for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::ExecutableNotFound { .. } => EXIT_CODE_NOT_FOUND,
            LaunchError::Exit { code, .. } => *code,
            _ => 1,
        }
    }
}

/// Code, summary and remediation shared by every error of one class.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDescriptor {
    pub code: &'static str,
    pub summary: &'static str,
    pub suggestions: &'static [&'static str],
}

impl ErrorDescriptor {
    pub const fn new(
        code: &'static str,
        summary: &'static str,
        suggestions: &'static [&'static str],
    ) -> Self {
        Self {
            code,
            summary,
            suggestions,
        }
    }
}

pub const INVALID_PARAMETERS_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    "invalid_parameters",
    "The launch request is incomplete or out of range",
    &[
        "Select an environment with --env or set launcher.default_environment.",
        "Pass the Claude Code arguments after `--`.",
        "Use a timeout between 1 second and 1 hour.",
    ],
);

pub const EXECUTABLE_NOT_FOUND_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    "executable_not_found",
    "Claude Code could not be located on PATH",
    &[
        "Install Claude Code: npm install -g @anthropic-ai/claude-code",
        "Make sure the directory containing `claude` is on PATH.",
        "Check launcher.executable and launcher.alternatives in the config file.",
    ],
);

pub const SPAWN_FAILED_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    "spawn_failed",
    "The Claude Code process could not be started",
    &[
        "Verify the resolved executable is runnable by the current user.",
        "Check that the working directory exists.",
    ],
);

pub const SUPERVISION_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    "supervision_failed",
    "The launcher lost track of the Claude Code process",
    &["Re-run with --verbose and RUST_LOG=debug to inspect the launch."],
);

pub const EXIT_STATUS_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    "exit_status",
    "Claude Code exited with a non-zero status",
    &["Review the Claude Code output above; the launcher itself succeeded."],
);

pub const TIMEOUT_ERROR: ErrorDescriptor = ErrorDescriptor::new(
    "timeout",
    "Claude Code ran longer than the configured timeout",
    &["Increase --timeout or launcher.timeout_secs, or omit it to run without a deadline."],
);

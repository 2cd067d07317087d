use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::config::Environment;

use super::{DelegationPlan, DelegationStrategy};

pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);
pub const MAX_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// One launch request, consumed by a single `Launcher::launch` call.
///
/// `timeout` of `None` runs without a deadline; `Some(Duration::ZERO)`
/// selects [`DEFAULT_TIMEOUT`] once [`LaunchParameters::with_defaults`] runs.
#[derive(Debug, Clone, Default)]
pub struct LaunchParameters {
    pub environment: Option<Environment>,
    pub arguments: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub variables: BTreeMap<String, String>,
    pub verbose: bool,
    pub dry_run: bool,
    pub passthrough_mode: bool,
    pub metrics_enabled: bool,
}

impl LaunchParameters {
    pub fn new(environment: Environment, arguments: Vec<String>) -> Self {
        Self {
            environment: Some(environment),
            arguments,
            metrics_enabled: true,
            ..Self::default()
        }
    }

    /// Adapt a delegation plan into launch parameters.
    pub fn from_plan(plan: &DelegationPlan) -> Self {
        let options = plan.options();
        Self {
            environment: Some(plan.environment().clone()),
            arguments: plan.claude_args().to_vec(),
            working_dir: options.working_dir.clone(),
            timeout: options.timeout,
            variables: plan.env_vars().clone(),
            verbose: options.verbose,
            dry_run: options.dry_run,
            passthrough_mode: plan.strategy() == DelegationStrategy::Passthrough,
            metrics_enabled: options.metrics_enabled,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn passthrough(mut self, passthrough: bool) -> Self {
        self.passthrough_mode = passthrough;
        self
    }

    /// Check the request before anything is resolved or spawned.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.environment.is_none() {
            return Err(ParameterError::MissingEnvironment);
        }
        if self.arguments.is_empty() {
            return Err(ParameterError::EmptyArguments);
        }
        if let Some(timeout) = self.timeout {
            if !timeout.is_zero() && timeout < MIN_TIMEOUT {
                return Err(ParameterError::TimeoutTooShort {
                    timeout_ms: timeout.as_millis(),
                });
            }
            if timeout > MAX_TIMEOUT {
                return Err(ParameterError::TimeoutTooLong {
                    timeout_secs: timeout.as_secs(),
                });
            }
        }
        Ok(())
    }

    /// Copy with a zero timeout replaced by the default.
    pub fn with_defaults(&self) -> Self {
        let mut params = self.clone();
        if params.timeout == Some(Duration::ZERO) {
            params.timeout = Some(DEFAULT_TIMEOUT);
        }
        params
    }
}

/// Launch request validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("environment is required")]
    MissingEnvironment,
    #[error("arguments must contain at least one entry")]
    EmptyArguments,
    #[error("timeout must be at least 1 second (got {timeout_ms} ms)")]
    TimeoutTooShort { timeout_ms: u128 },
    #[error("timeout must not exceed 1 hour (got {timeout_secs} s)")]
    TimeoutTooLong { timeout_secs: u64 },
}

impl ParameterError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            ParameterError::MissingEnvironment => "environment",
            ParameterError::EmptyArguments => "arguments",
            ParameterError::TimeoutTooShort { .. } | ParameterError::TimeoutTooLong { .. } => {
                "timeout"
            }
        }
    }
}

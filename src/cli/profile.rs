//! LaunchRequest and its conversion into a delegation plan.
use std::{collections::BTreeMap, env, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

use crate::{
    config::AppConfig,
    launcher::{DelegationPlan, DelegationStrategy, LaunchOptions},
    lib::{env_builder::MODEL_VAR, errors::ConfigError, paths},
};

/// Launch intent collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    pub environment: Option<String>,
    pub model: Option<String>,
    pub variables: BTreeMap<String, String>,
    pub claude_args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub verbose: bool,
    pub dry_run: bool,
    pub passthrough: bool,
    pub show_metrics: bool,
}

impl LaunchRequest {
    pub fn strategy(&self) -> DelegationStrategy {
        if self.passthrough {
            DelegationStrategy::Passthrough
        } else {
            DelegationStrategy::Direct
        }
    }

    /// Resolve the environment and flag-derived variables into a plan.
    ///
    /// `--model` lands in the plan variables so it wins over the profile model.
    /// A CLI timeout wins over `launcher.timeout_secs`.
    pub fn into_plan(self, config: &AppConfig) -> Result<DelegationPlan, ConfigError> {
        let environment = config.select_environment(self.environment.as_deref())?.clone();
        let strategy = self.strategy();

        let mut env_vars = self.variables;
        if let Some(model) = self.model {
            env_vars.insert(MODEL_VAR.to_string(), model);
        }

        let options = LaunchOptions {
            working_dir: self.working_dir,
            timeout: self.timeout.or(config.launcher.timeout),
            verbose: self.verbose,
            dry_run: self.dry_run,
            metrics_enabled: true,
        };

        Ok(DelegationPlan::new(environment, self.claude_args, env_vars, strategy)
            .with_options(options))
    }
}

/// Make an explicit config path absolute relative to the current directory.
pub fn resolve_config_path(path: PathBuf) -> Result<PathBuf> {
    if paths::is_nonempty_absolute(&path) {
        return Ok(path);
    }

    let cwd = env::current_dir().context("failed to obtain current directory")?;
    Ok(cwd.join(path))
}

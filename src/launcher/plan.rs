use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use serde::Serialize;

use crate::config::Environment;

/// Strategy label attached to a delegation plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStrategy {
    #[default]
    Direct,
    Passthrough,
}

impl DelegationStrategy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DelegationStrategy::Direct => "direct",
            DelegationStrategy::Passthrough => "passthrough",
        }
    }
}

/// Launch options carried alongside the plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub verbose: bool,
    pub dry_run: bool,
    pub metrics_enabled: bool,
}

/// Pre-resolved launch bundle produced by argument parsing.
#[derive(Debug, Clone)]
pub struct DelegationPlan {
    environment: Environment,
    claude_args: Vec<String>,
    env_vars: BTreeMap<String, String>,
    strategy: DelegationStrategy,
    options: LaunchOptions,
}

impl DelegationPlan {
    pub fn new(
        environment: Environment,
        claude_args: Vec<String>,
        env_vars: BTreeMap<String, String>,
        strategy: DelegationStrategy,
    ) -> Self {
        Self {
            environment,
            claude_args,
            env_vars,
            strategy,
            options: LaunchOptions {
                metrics_enabled: true,
                ..LaunchOptions::default()
            },
        }
    }

    pub fn with_options(mut self, options: LaunchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn claude_args(&self) -> &[String] {
        &self.claude_args
    }

    /// Extra variables computed from flags; layered above the profile.
    pub fn env_vars(&self) -> &BTreeMap<String, String> {
        &self.env_vars
    }

    pub fn strategy(&self) -> DelegationStrategy {
        self.strategy
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }
}

//! Launch-mode execution and exit reporting for the binary.
use std::process::ExitCode;

use anyhow::Error;
use tracing::info;

use crate::{
    config::AppConfig,
    launcher::{AnyLauncher, LaunchParameters, Launcher},
    lib::errors::LaunchError,
};

use super::LaunchRequest;

/// Failure carried back to `main`, printed once on stderr.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: u8,
    suggestions: Vec<&'static str>,
}

impl RuntimeExit {
    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:?}"),
            exit_code: 1,
            suggestions: Vec::new(),
        }
    }

    /// Mirror the child's status where there is one; 127 when Claude Code is missing.
    pub fn from_launch_error(err: LaunchError) -> Self {
        let exit_code = u8::try_from(err.exit_code()).unwrap_or(1);
        let suggestions = match err {
            LaunchError::Exit { .. } => Vec::new(),
            _ => err.suggestions().to_vec(),
        };
        Self {
            message: err.to_string(),
            exit_code,
            suggestions,
        }
    }

    pub fn report(self) -> ExitCode {
        eprintln!("ccenv: {}", self.message);
        for hint in &self.suggestions {
            eprintln!("  hint: {hint}");
        }
        ExitCode::from(self.exit_code)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Resolve the request against the config and run Claude Code once.
pub async fn run_launch(request: LaunchRequest, config: &AppConfig) -> Result<(), RuntimeExit> {
    let show_metrics = request.show_metrics;
    let launcher = AnyLauncher::for_mode(request.passthrough, &config.launcher);
    let plan = request
        .into_plan(config)
        .map_err(|err| RuntimeExit::from_error(Error::new(err)))?;

    info!(
        target: "ccenv::cli",
        environment = %plan.environment().name,
        strategy = launcher.strategy().as_str(),
        arguments = plan.claude_args().len(),
        "Dispatching launch"
    );

    let params = LaunchParameters::from_plan(&plan);
    let core = launcher.core();
    let strategy = core.strategy_for(&params);
    let outcome = core.run(params, strategy).await;

    // Settling a pass-through exit ends the process, so report first.
    if show_metrics {
        match serde_json::to_string_pretty(&launcher.metrics()) {
            Ok(json) => eprintln!("{json}"),
            Err(err) => eprintln!("ccenv: failed to serialize metrics: {err}"),
        }
    }

    outcome
        .and_then(|outcome| outcome.settle(strategy))
        .map_err(RuntimeExit::from_launch_error)
}

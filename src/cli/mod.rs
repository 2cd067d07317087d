//! CLI entrypoint module structure.
use anyhow::Result;
use serde_json::json;

use crate::{
    config::AppConfig,
    launcher::{DirectLauncher, Launcher},
};

pub mod args;
pub mod profile;
pub mod runtime;

pub use args::{CliCommand, Invocation, LaunchArgs, ParsedCommand};
pub use profile::{resolve_config_path, LaunchRequest};
pub use runtime::{run_launch, RuntimeExit};

/// Execute CLI command mode and return a user-facing JSON payload.
pub async fn execute_cli_command(command: CliCommand, config: &AppConfig) -> Result<String> {
    let payload = match command {
        CliCommand::List => {
            let environments = config
                .environments
                .iter()
                .map(|env| env.summary())
                .collect::<Vec<_>>();
            json!({
                "config_path": config.source_path,
                "default_environment": config.launcher.default_environment,
                "environments": environments,
            })
        }
        CliCommand::Check => {
            let launcher = DirectLauncher::new(&config.launcher);
            let path = launcher.claude_code_path().await?;
            json!({
                "status": "ok",
                "executable": path,
                "candidates": launcher.core().resolver().candidates().collect::<Vec<_>>(),
            })
        }
    };

    Ok(serde_json::to_string_pretty(&payload)?)
}

//! Entry point for ccenv.
use std::process::ExitCode;

use anyhow::Error;
use ccenv::{
    cli::{execute_cli_command, run_launch, CliCommand, LaunchArgs, ParsedCommand, RuntimeExit},
    config::AppConfig,
    lib::telemetry,
};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    match bootstrap().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(exit) => exit.report(),
    }
}

async fn bootstrap() -> Result<(), RuntimeExit> {
    let args = LaunchArgs::parse();
    telemetry::init_tracing(args.verbose).map_err(RuntimeExit::from_error)?;
    let invocation = args.into_invocation().map_err(RuntimeExit::from_error)?;

    let config = match invocation.config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load_from_env_or_default(),
    }
    .map_err(|err| RuntimeExit::from_error(Error::new(err)))?;

    match invocation.command {
        ParsedCommand::Launch(request) => run_launch(request, &config).await,
        ParsedCommand::Cli(command) => handle_cli_command(command, &config).await,
    }
}

async fn handle_cli_command(command: CliCommand, config: &AppConfig) -> Result<(), RuntimeExit> {
    let message = execute_cli_command(command, config)
        .await
        .map_err(RuntimeExit::from_error)?;
    println!("{message}");
    Ok(())
}

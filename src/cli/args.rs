//! CLI argument definitions and `LaunchRequest` construction.
use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::{resolve_config_path, LaunchRequest};

/// Parsed command intent from CLI.
#[derive(Debug, Clone)]
pub enum ParsedCommand {
    Launch(LaunchRequest),
    Cli(CliCommand),
}

/// Parsed command plus the config file it runs against.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Explicit `--config` path, made absolute. `None` defers to `CCENV_CONFIG_PATH` or the default.
    pub config_path: Option<PathBuf>,
    pub command: ParsedCommand,
}

/// Top-level optional CLI commands.
#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// List configured environments with masked API keys.
    List,
    /// Resolve the Claude Code executable and print its path.
    Check,
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ccenv",
    author,
    version,
    about = "Launch Claude Code with a selected API environment",
    long_about = None,
    after_help = "Arguments after `--` are passed to Claude Code unchanged, e.g. `ccenv -e work -- -p \"hello\"`."
)]
pub struct LaunchArgs {
    /// Path to the config file (overrides CCENV_CONFIG_PATH).
    #[arg(long = "config", global = true)]
    pub config_override: Option<PathBuf>,
    /// Environment to launch with (defaults to launcher.default_environment).
    #[arg(short = 'e', long = "env")]
    pub environment: Option<String>,
    /// Override ANTHROPIC_MODEL for this launch.
    #[arg(long)]
    pub model: Option<String>,
    /// Extra variable for Claude Code, as KEY=VALUE. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub variables: Vec<(String, String)>,
    /// Kill Claude Code after this many seconds (0 selects the 5 minute default).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    /// Working directory for Claude Code.
    #[arg(long = "cwd", value_name = "DIR")]
    pub working_dir: Option<PathBuf>,
    /// Print detailed launch info.
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,
    /// Resolve and report what would run without starting Claude Code.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
    /// Exit with Claude Code's exit status instead of reporting it as an error.
    #[arg(long, default_value_t = false)]
    pub passthrough: bool,
    /// Print launch metrics as JSON on stderr after the launch.
    #[arg(long, default_value_t = false)]
    pub show_metrics: bool,
    /// Optional CLI command mode.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
    /// Arguments passed through to Claude Code.
    #[arg(last = true, value_name = "CLAUDE_ARGS")]
    pub claude_args: Vec<String>,
}

impl LaunchArgs {
    /// Build a `LaunchRequest` from CLI args.
    pub fn build(self) -> LaunchRequest {
        LaunchRequest {
            environment: self.environment,
            model: self.model.filter(|model| !model.trim().is_empty()),
            variables: self.variables.into_iter().collect::<BTreeMap<_, _>>(),
            claude_args: self.claude_args,
            working_dir: self.working_dir,
            timeout: self.timeout.map(Duration::from_secs),
            verbose: self.verbose,
            dry_run: self.dry_run,
            passthrough: self.passthrough,
            show_metrics: self.show_metrics,
        }
    }

    /// Parse CLI args into either launch mode or utility command mode.
    pub fn into_invocation(self) -> Result<Invocation> {
        let config_path = self
            .config_override
            .clone()
            .map(resolve_config_path)
            .transpose()?;
        let command = match self.command.clone() {
            Some(command) => ParsedCommand::Cli(command),
            None => ParsedCommand::Launch(self.build()),
        };
        Ok(Invocation {
            config_path,
            command,
        })
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    if key.trim().is_empty() {
        return Err(format!("variable name is empty in `{raw}`"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

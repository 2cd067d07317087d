#![allow(dead_code)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ccenv::{
    config::Environment,
    launcher::{DirectLauncher, LaunchParameters},
};

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_ccenv");
pub const SECRET_KEY: &str = "sk-ant-REDACTED";

pub fn fixture(relative: &str) -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    root.join(relative).display().to_string()
}

/// Launcher that treats `/bin/sh` as Claude Code.
pub fn sh_launcher() -> DirectLauncher {
    DirectLauncher::with_executable("sh", Vec::new())
}

pub fn environment(name: &str) -> Environment {
    Environment::new(name, "https://api.example.com", SECRET_KEY)
}

/// `sh -c <script>` under the given environment.
pub fn script(env: Environment, script: &str) -> LaunchParameters {
    LaunchParameters::new(env, vec!["-c".to_string(), script.to_string()])
}

/// Write a config file whose launcher runs `executable` with a single `work` profile.
pub fn write_config(dir: &Path, executable: &str) -> Result<PathBuf> {
    let path = dir.join("ccenv.toml");
    let body = format!(
        r#"[launcher]
executable = "{executable}"
default_environment = "work"

[[environments]]
name = "work"
base_url = "https://api.example.com"
api_key = "{SECRET_KEY}"
model = "claude-sonnet-4"
"#
    );
    std::fs::write(&path, body)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

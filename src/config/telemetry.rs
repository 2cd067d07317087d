use tracing::{debug, info};

use super::{AppConfig, CONFIG_ENV_KEY};

pub fn log_env_source(path: &std::path::Path, from_env: bool) {
    if from_env {
        info!(
            target: "ccenv::config",
            path = %path.display(),
            "Loading configuration using CCENV_CONFIG_PATH environment variable"
        );
    } else {
        debug!(
            target: "ccenv::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            "CCENV_CONFIG_PATH not set; using the default config location"
        );
    }
}

pub fn log_loaded(config: &AppConfig) {
    info!(
        target: "ccenv::config",
        path = %config.source_path.display(),
        environments = config.environments.len(),
        executable = %config.launcher.executable,
        alternatives = ?config.launcher.alternatives,
        default_environment = config.launcher.default_environment.as_deref().unwrap_or(""),
        timeout_secs = config.launcher.timeout.map(|t| t.as_secs()),
        "Configuration file loaded successfully"
    );
}

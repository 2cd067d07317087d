//! Load and validate the profile configuration file.
use std::{env, path::PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::lib::{errors::ConfigError, paths};

pub mod environment;
pub mod launcher;
pub mod telemetry;

pub use environment::{parse_environments, Environment, EnvironmentSummary, RawEnvironment};
pub use launcher::{
    parse_launcher_section, LauncherSection, RawLauncherSection, DEFAULT_ALTERNATIVES,
    DEFAULT_EXECUTABLE, MAX_TIMEOUT_SECS,
};

pub const CONFIG_ENV_KEY: &str = "CCENV_CONFIG_PATH";

/// Top-level configuration container.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub launcher: LauncherSection,
    pub environments: Vec<Environment>,
    pub source_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawAppConfig {
    launcher: Option<RawLauncherSection>,
    environments: Option<Vec<RawEnvironment>>,
}

impl AppConfig {
    /// Prefer `CCENV_CONFIG_PATH` if set; otherwise read `$HOME/.ccenv/config.toml`.
    pub fn load_from_env_or_default() -> Result<Self, ConfigError> {
        let (path, from_env) = match env::var(CONFIG_ENV_KEY) {
            Ok(value) if !value.trim().is_empty() => (PathBuf::from(value), true),
            _ => (default_path(), false),
        };

        telemetry::log_env_source(&path, from_env);
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path. The format follows the file extension.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        info!(
            target: "ccenv::config",
            path = %path.display(),
            "Starting configuration load"
        );

        let builder = config::Config::builder().add_source(config::File::from(path.clone()));
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "ccenv::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let raw: RawAppConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "ccenv::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone()).map_err(|err| {
            error!(
                target: "ccenv::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(raw: RawAppConfig, path: PathBuf) -> Result<Self, ConfigError> {
        let launcher = parse_launcher_section(raw.launcher, &path)?;
        let environments = parse_environments(raw.environments, &path)?;

        if let Some(default) = &launcher.default_environment {
            if !environments.iter().any(|env| &env.name == default) {
                return Err(ConfigError::InvalidField {
                    path,
                    field: "launcher.default_environment",
                    message: format!("No environment named `{default}` is defined"),
                });
            }
        }

        Ok(Self {
            launcher,
            environments,
            source_path: path,
        })
    }

    pub fn environment_names(&self) -> Vec<String> {
        self.environments.iter().map(|env| env.name.clone()).collect()
    }

    /// Pick the environment to launch with.
    ///
    /// Resolution order: explicit name → `launcher.default_environment` →
    /// the single defined environment.
    pub fn select_environment(&self, name: Option<&str>) -> Result<&Environment, ConfigError> {
        let wanted = name.or(self.launcher.default_environment.as_deref());
        match wanted {
            Some(wanted) => self
                .environments
                .iter()
                .find(|env| env.name == wanted)
                .ok_or_else(|| ConfigError::UnknownEnvironment {
                    name: wanted.to_string(),
                    available: self.environment_names(),
                }),
            None => match self.environments.as_slice() {
                [only] => Ok(only),
                _ => Err(ConfigError::AmbiguousEnvironment {
                    available: self.environment_names(),
                }),
            },
        }
    }
}

fn default_path() -> PathBuf {
    paths::default_config_path(env::var_os("HOME"))
        .unwrap_or_else(|| PathBuf::from(paths::CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        path::{Path, PathBuf},
        time::Duration,
    };

    use crate::lib::errors::ConfigError;

    use super::AppConfig;

    fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn with_config_env<T>(path: &Path, test: impl FnOnce() -> T) -> T {
        let original = env::var(super::CONFIG_ENV_KEY).ok();
        env::set_var(super::CONFIG_ENV_KEY, path);
        let result = test();
        match original {
            Some(value) => env::set_var(super::CONFIG_ENV_KEY, value),
            None => env::remove_var(super::CONFIG_ENV_KEY),
        }
        result
    }

    #[test]
    fn load_valid_config() {
        let config = AppConfig::load_from_path(fixture_path("config_valid.toml"))
            .expect("config_valid.toml should load");

        assert_eq!(config.launcher.executable, "claude");
        assert_eq!(config.launcher.alternatives, vec!["claude-code".to_string()]);
        assert_eq!(config.launcher.default_environment.as_deref(), Some("work"));
        assert_eq!(config.launcher.timeout, None);
        assert_eq!(config.environments.len(), 2);

        let work = &config.environments[0];
        assert_eq!(work.name, "work");
        assert_eq!(work.base_url, "https://api.anthropic.com");
        assert_eq!(work.api_key, "sk-ant-work-0123456789");
        assert_eq!(work.model.as_deref(), Some("claude-sonnet-4"));
        assert_eq!(work.headers.len(), 1);

        let proxy = &config.environments[1];
        assert_eq!(proxy.model, None);
        assert!(proxy.headers.is_empty());
    }

    #[test]
    fn load_json_config() {
        let config = AppConfig::load_from_path(fixture_path("config_valid.json"))
            .expect("config_valid.json should load");

        assert_eq!(config.environments.len(), 1);
        assert_eq!(config.launcher.timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn missing_api_key_returns_error() {
        let error = AppConfig::load_from_path(fixture_path("config_missing_api_key.toml"))
            .expect_err("should error when api_key is missing");

        match error {
            ConfigError::MissingField { field, .. } => assert_eq!(field, "environments.api_key"),
            other => panic!("Unexpected error: {other:?}", other = other),
        }
    }

    #[test]
    fn duplicate_names_return_error() {
        let error = AppConfig::load_from_path(fixture_path("config_duplicate_names.toml"))
            .expect_err("should error on duplicate environment names");

        match error {
            ConfigError::InvalidField { field, .. } => assert_eq!(field, "environments.name"),
            other => panic!("Unexpected error: {other:?}", other = other),
        }
    }

    #[test]
    fn unknown_default_environment_returns_error() {
        let error = AppConfig::load_from_path(fixture_path("config_unknown_default.toml"))
            .expect_err("should error when default_environment is undefined");

        match error {
            ConfigError::InvalidField { field, .. } => {
                assert_eq!(field, "launcher.default_environment")
            }
            other => panic!("Unexpected error: {other:?}", other = other),
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let error = AppConfig::load_from_path(fixture_path("does_not_exist.toml"))
            .expect_err("missing file should fail");
        assert!(matches!(error, ConfigError::FileRead { .. }));
    }

    #[test]
    fn load_config_from_env_override() {
        let path = fixture_path("config_valid.toml");
        let config = with_config_env(&path, || {
            AppConfig::load_from_env_or_default().expect("should load via environment variable")
        });

        assert_eq!(config.source_path, path);
        assert_eq!(config.environment_names(), vec!["work", "proxy"]);
    }

    #[test]
    fn environment_selection_order() {
        let mut config = AppConfig::load_from_path(fixture_path("config_valid.toml"))
            .expect("config_valid.toml should load");

        assert_eq!(config.select_environment(Some("proxy")).unwrap().name, "proxy");
        assert_eq!(config.select_environment(None).unwrap().name, "work");

        config.launcher.default_environment = None;
        match config.select_environment(None) {
            Err(ConfigError::AmbiguousEnvironment { available }) => {
                assert_eq!(available, vec!["work", "proxy"])
            }
            other => panic!("Unexpected result: {other:?}"),
        }

        config.environments.truncate(1);
        assert_eq!(config.select_environment(None).unwrap().name, "work");
        assert!(matches!(
            config.select_environment(Some("missing")),
            Err(ConfigError::UnknownEnvironment { .. })
        ));
    }
}

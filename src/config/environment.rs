use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::lib::{env_builder::mask_secret, errors::ConfigError};

/// Named credential profile handed to the launcher.
#[derive(Clone, PartialEq, Eq)]
pub struct Environment {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub model: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl Environment {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Display-safe view with the API key masked.
    pub fn summary(&self) -> EnvironmentSummary {
        EnvironmentSummary {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            api_key: mask_secret(&self.api_key),
            model: self.model.clone(),
            headers: self.headers.keys().cloned().collect(),
        }
    }
}

// Keeps the API key out of `{:?}` output and therefore out of logs.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Serializable profile listing used by `ccenv list`.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentSummary {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub model: Option<String>,
    pub headers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawEnvironment {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

pub fn parse_environments(
    raw: Option<Vec<RawEnvironment>>,
    path: &Path,
) -> Result<Vec<Environment>, ConfigError> {
    let raw = raw.ok_or(ConfigError::MissingField {
        path: path.to_path_buf(),
        field: "environments",
    })?;

    let mut seen = BTreeSet::new();
    let mut environments = Vec::with_capacity(raw.len());
    for entry in raw {
        let environment = parse_environment(entry, path)?;
        if !seen.insert(environment.name.clone()) {
            return Err(ConfigError::InvalidField {
                path: path.to_path_buf(),
                field: "environments.name",
                message: format!("Duplicate environment name: {}", environment.name),
            });
        }
        environments.push(environment);
    }
    Ok(environments)
}

fn parse_environment(raw: RawEnvironment, path: &Path) -> Result<Environment, ConfigError> {
    let name = raw
        .name
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingField {
            path: path.to_path_buf(),
            field: "environments.name",
        })?;

    let base_url = raw
        .base_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingField {
            path: path.to_path_buf(),
            field: "environments.base_url",
        })?;
    validate_base_url(path, &name, &base_url)?;

    let api_key = raw
        .api_key
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingField {
            path: path.to_path_buf(),
            field: "environments.api_key",
        })?;

    let model = raw
        .model
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    Ok(Environment {
        name,
        base_url,
        api_key,
        model,
        headers: raw.headers,
    })
}

fn validate_base_url(path: &Path, name: &str, base_url: &str) -> Result<(), ConfigError> {
    if base_url.starts_with("https://") || base_url.starts_with("http://") {
        return Ok(());
    }
    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "environments.base_url",
        message: format!("Environment `{name}` needs an http:// or https:// URL"),
    })
}

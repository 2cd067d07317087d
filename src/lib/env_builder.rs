//! Layered assembly of the environment handed to the Claude Code process.
//!
//! Layers, lowest to highest precedence: the base environment, the profile
//! variables, then explicit overrides. Keys are reduced to `[A-Za-z0-9_]`
//! and `\n`/`\r` in values become spaces when the final set is built.

use std::{collections::BTreeMap, env};

use crate::config::Environment;

pub const BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const MODEL_VAR: &str = "ANTHROPIC_MODEL";
pub const HEADER_VAR_PREFIX: &str = "ANTHROPIC_HEADER_";

const MASK: &str = "***";
const MASK_VISIBLE_CHARS: usize = 4;
const MASK_MIN_LEN: usize = 8;

/// Accumulates variable layers. Reusable: `build` may be called again after further mutation.
#[derive(Debug, Clone, Default)]
pub struct EnvVarBuilder {
    base: Vec<String>,
    overrides: BTreeMap<String, String>,
}

impl EnvVarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the base layer with `KEY=VALUE` entries.
    pub fn set_base<I, S>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base = vars.into_iter().map(Into::into).collect();
        self
    }

    /// Use a snapshot of the current process environment as the base layer.
    pub fn set_current_process_environment(&mut self) -> &mut Self {
        let snapshot = env::vars_os().filter_map(|(key, value)| {
            let key = key.into_string().ok()?;
            let value = value.into_string().ok()?;
            Some(format!("{key}={value}"))
        });
        self.set_base(snapshot.collect::<Vec<_>>())
    }

    /// Layer the profile variables. `None` leaves the builder untouched.
    pub fn apply_profile(&mut self, environment: Option<&Environment>) -> &mut Self {
        let Some(environment) = environment else {
            return self;
        };

        self.set_variable(BASE_URL_VAR, environment.base_url.as_str());
        self.set_variable(API_KEY_VAR, environment.api_key.as_str());
        if let Some(model) = environment.model.as_deref().filter(|m| !m.is_empty()) {
            self.set_variable(MODEL_VAR, model);
        }
        for (name, value) in &environment.headers {
            self.set_variable(format!("{HEADER_VAR_PREFIX}{name}"), value.as_str());
        }
        self
    }

    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    pub fn set_variables<I, K, V>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in vars {
            self.set_variable(key, value);
        }
        self
    }

    /// Override layer as accumulated, before sanitization.
    pub fn overrides(&self) -> &BTreeMap<String, String> {
        &self.overrides
    }

    /// Final `KEY=VALUE` list: base entries first, overrides after.
    pub fn build(&self) -> Vec<String> {
        self.parsed_base()
            .chain(
                self.overrides
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            )
            .filter_map(|(key, value)| sanitize_entry(key, value))
            .map(|(key, value)| format!("{key}={value}"))
            .collect()
    }

    /// Final set as a mapping; an override replaces a base entry with the same key.
    pub fn build_map(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        for (key, value) in self.parsed_base() {
            if let Some((key, value)) = sanitize_entry(key, value) {
                vars.insert(key, value);
            }
        }
        for (key, value) in &self.overrides {
            if let Some((key, value)) = sanitize_entry(key, value) {
                vars.insert(key, value);
            }
        }
        vars
    }

    /// Override layer for display, with the API key masked.
    pub fn masked(&self) -> BTreeMap<String, String> {
        self.overrides
            .iter()
            .map(|(key, value)| {
                let shown = if key == API_KEY_VAR {
                    mask_secret(value)
                } else {
                    value.clone()
                };
                (key.clone(), shown)
            })
            .collect()
    }

    fn parsed_base(&self) -> impl Iterator<Item = (&str, &str)> {
        self.base.iter().filter_map(|entry| entry.split_once('='))
    }
}

/// `first4***last4` for values longer than 8 characters, `***` otherwise.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= MASK_MIN_LEN {
        return MASK.to_string();
    }
    let head: String = chars[..MASK_VISIBLE_CHARS].iter().collect();
    let tail: String = chars[chars.len() - MASK_VISIBLE_CHARS..].iter().collect();
    format!("{head}{MASK}{tail}")
}

/// Strip every character outside `[A-Za-z0-9_]`.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Replace each `\n` and `\r` with a space.
pub fn sanitize_value(value: &str) -> String {
    value.replace(['\n', '\r'], " ")
}

fn sanitize_entry(key: &str, value: &str) -> Option<(String, String)> {
    let key = sanitize_key(key);
    if key.is_empty() {
        return None;
    }
    Some((key, sanitize_value(value)))
}

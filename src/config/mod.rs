//! Plugin configuration.
//!
//! The configuration is an optional JSON document looked up in the project
//! first and in the user's OpenCode config directory second. Any problem with it
//! (unreadable, empty, malformed, schema violation) is logged and the documented
//! defaults are used instead.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use jsonschema::JSONSchema;
use mode_core::Mode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "opencode-cline-mode.json";

/// Bundled JSON Schema for the configuration file.
pub const CONFIG_SCHEMA: &str = include_str!("../../schema/opencode-cline-mode.schema.json");

/// Where prompts come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptSource {
    /// Prompt files shipped with the plugin.
    #[default]
    Local,
    /// Built from the Cline repository on every load.
    Github,
    /// Cache, then GitHub, then local files.
    Auto,
}

impl std::fmt::Display for PromptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Github => "github",
            Self::Auto => "auto",
        })
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exists but is empty.
    #[error("config file is empty")]
    Empty,

    /// File is not valid JSON.
    #[error("invalid JSON at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// Document violates the schema.
    #[error("invalid config:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

/// Plugin configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Replace the host's agents instead of adding alongside them.
    pub replace_default_agents: bool,

    /// Agent selected when the host starts.
    pub default_agent: Mode,

    /// Model for the plan agent (empty inherits the host model).
    pub plan_model: String,

    /// Model for the act agent (empty inherits the host model).
    pub act_model: String,

    /// Sampling temperature for plan mode.
    pub plan_temperature: f64,

    /// Sampling temperature for act mode.
    pub act_temperature: f64,

    /// Ask the host to show a toast when a plan completes.
    pub show_completion_toast: bool,

    /// Register the `execute-plan` and `start-act` tools and mention `/start-act` in banners.
    pub enable_execute_command: bool,

    /// Require `/approve-plan` before a plan may be executed.
    pub enable_plan_approval: bool,

    /// Prompt source.
    pub prompt_source: PromptSource,

    /// Cline revision to build prompts from (`latest` resolves to the newest commit).
    pub cline_version: String,

    /// Prompt cache lifetime in hours.
    pub cache_ttl: f64,

    /// Fall back to local prompts when fetching fails.
    pub fallback_to_local: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            replace_default_agents: true,
            default_agent: Mode::Plan,
            plan_model: String::new(),
            act_model: String::new(),
            plan_temperature: 0.1,
            act_temperature: 0.3,
            show_completion_toast: true,
            enable_execute_command: true,
            enable_plan_approval: true,
            prompt_source: PromptSource::Local,
            cline_version: "latest".to_string(),
            cache_ttl: 24.0,
            fallback_to_local: true,
        }
    }
}

static COMPILED_SCHEMA: LazyLock<Option<JSONSchema>> = LazyLock::new(|| {
    let schema: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA).ok()?;
    JSONSchema::options().compile(&schema).ok()
});

/// Validate a configuration document, returning one message per violation.
#[must_use]
pub fn validate(value: &serde_json::Value) -> Vec<String> {
    let Some(compiled) = COMPILED_SCHEMA.as_ref() else {
        tracing::warn!("config schema failed to compile, skipping validation");
        return Vec::new();
    };

    match compiled.validate(value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path} {e}")
                }
            })
            .collect(),
    }
}

impl PluginConfig {
    /// Load the configuration for a project directory.
    ///
    /// Never fails: problems are logged and defaults returned.
    #[must_use]
    pub fn load(directory: &Path) -> Self {
        let Some(path) = Self::resolve_path(directory) else {
            tracing::debug!(directory = %directory.display(), "no config file, using defaults");
            return Self::default();
        };

        match Self::load_from_path(&path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "using default config");
                Self::default()
            }
        }
    }

    /// Read and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is empty, is not valid JSON
    /// or violates the schema.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is empty, is not valid JSON or violates
    /// the schema.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let contents = contents.trim();
        if contents.is_empty() {
            return Err(ConfigError::Empty);
        }

        let value: serde_json::Value =
            serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                line: e.line(),
                column: e.column(),
                message: e.to_string(),
            })?;

        let violations = validate(&value);
        if !violations.is_empty() {
            return Err(ConfigError::Invalid(violations));
        }

        serde_json::from_value(value).map_err(|e| ConfigError::Invalid(vec![e.to_string()]))
    }

    /// First existing config file for a project directory.
    #[must_use]
    pub fn resolve_path(directory: &Path) -> Option<PathBuf> {
        Self::candidate_paths(directory)
            .into_iter()
            .find(|path| path.exists())
    }

    /// Config file locations in lookup order.
    #[must_use]
    pub fn candidate_paths(directory: &Path) -> Vec<PathBuf> {
        let mut paths = vec![Self::project_config_path(directory)];
        if let Ok(global) = Self::global_config_path() {
            paths.push(global);
        }
        paths
    }

    /// Project-local config file (`<dir>/.opencode/opencode-cline-mode.json`).
    #[must_use]
    pub fn project_config_path(directory: &Path) -> PathBuf {
        directory.join(".opencode").join(CONFIG_FILE_NAME)
    }

    /// Global config file (`~/.config/opencode/opencode-cline-mode.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn global_config_path() -> anyhow::Result<PathBuf> {
        Ok(opencode_config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Model for a mode, falling back to `default_model` when unset.
    #[must_use]
    pub fn model_for<'a>(&'a self, mode: Mode, default_model: &'a str) -> &'a str {
        let model = match mode {
            Mode::Plan => &self.plan_model,
            Mode::Act => &self.act_model,
        };
        if model.is_empty() { default_model } else { model }
    }

    /// Temperature for a mode.
    #[must_use]
    pub const fn temperature_for(&self, mode: Mode) -> f64 {
        match mode {
            Mode::Plan => self.plan_temperature,
            Mode::Act => self.act_temperature,
        }
    }

    /// Cache lifetime as a duration.
    ///
    /// Lifetimes too large to represent saturate to [`Duration::MAX`](std::time::Duration::MAX).
    #[must_use]
    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::try_from_secs_f64(self.cache_ttl.max(0.0) * 3600.0)
            .unwrap_or(std::time::Duration::MAX)
    }
}

/// OpenCode's config directory (`~/.config/opencode`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn opencode_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config_home).join("opencode"));
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("could not determine home directory"))?;
    Ok(home.join(".config").join("opencode"))
}

/// Directory for state that is not tied to a project (`~/.local/share/opencode-cline-mode`).
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn data_dir() -> anyhow::Result<PathBuf> {
    let base = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("could not determine data directory"))?;

    Ok(base.data_dir().join("opencode-cline-mode"))
}

/// Plans directory for a project.
#[must_use]
pub fn plans_dir(directory: &Path) -> PathBuf {
    directory.join(".opencode").join("plans")
}

/// Prompt cache directory for a project.
#[must_use]
pub fn cache_dir(directory: &Path) -> PathBuf {
    directory.join(".cline-cache")
}

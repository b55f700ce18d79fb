//! Application configuration.
//!
//! Loaded once at startup from the embedded defaults, an optional user file
//! and `WEBPILOT__*` environment variables, then shared read-only.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_primitives::ChromiumConfig;
use agent_core::AgentLoopConfig;
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const DEFAULT_CONFIG: &str = include_str!("../config/default.yaml");
const ENV_PREFIX: &str = "WEBPILOT";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Settings for the OpenAI-compatible plan generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub model: String,
    /// Tried in order; the next key is used when one is rate limited
    pub api_keys: Vec<String>,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_keys: Vec::new(),
            temperature: 0.2,
            timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Built-in tools to register; empty registers all of them
    pub enabled: Vec<String>,
    pub artifacts_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentLoopConfig,
    pub browser: ChromiumConfig,
    pub llm: LlmConfig,
    pub tools: ToolsConfig,
}

impl AppConfig {
    /// Load configuration, layering `path` (or the per-user file) and the
    /// environment over the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Arc<Self>> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Yaml));

        match path {
            Some(path) => {
                if !path.exists() {
                    bail!("configuration file {} does not exist", path.display());
                }
                info!("Loading configuration from: {}", path.display());
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(user) = user_config_path().filter(|p| p.exists()) {
                    info!("Loading configuration from: {}", user.display());
                    builder = builder.add_source(File::from(user).required(false));
                } else {
                    debug!("no user configuration file; using defaults");
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("llm.api_keys")
                .with_list_parse_key("tools.enabled")
                .with_list_parse_key("agent.completion_phrases")
                .try_parsing(true),
        );

        let mut config: AppConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;
        config.apply_fallbacks();
        config.validate()?;
        Ok(Arc::new(config))
    }

    fn apply_fallbacks(&mut self) {
        if self.llm.api_keys.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                let key = key.trim().to_string();
                if !key.is_empty() {
                    self.llm.api_keys.push(key);
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent.max_iterations == 0 {
            bail!("agent.max_iterations must be at least 1");
        }
        if self.llm.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!("llm.temperature must be between 0 and 2");
        }
        Ok(())
    }

    /// Configuration rendered for display, with API keys masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.llm.api_keys = copy
            .llm
            .api_keys
            .iter()
            .map(|key| mask_key(key))
            .collect();
        copy
    }
}

/// `$XDG_CONFIG_HOME/webpilot/config.yaml` or the platform equivalent.
pub fn user_config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("webpilot");
    path.push("config.yaml");
    Some(path)
}

fn mask_key(key: &str) -> String {
    let visible: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{}", visible)
}

//! Configuration loaded from `config.toml`.
//!
//! Resolution order for the config directory: explicit `--config-dir`
//! override → `LECTERN_DIR` env → `~/.lectern`. A missing file yields the
//! defaults; the API key may come from `LECTERN_API_KEY` or
//! `OPENAI_API_KEY` instead of the file.

use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed, not serialized.
    #[serde(skip)]
    pub config_path: PathBuf,
    /// Provider ID (only `"openai"` is currently supported).
    pub provider: Option<String>,
    /// Model routed through the provider.
    pub model: Option<String>,
    /// API key. Overridden by `LECTERN_API_KEY` or `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Base URL override (e.g. a local OpenAI-compatible server).
    pub api_url: Option<String>,
    /// Embedding model used for titles, chunks, and queries.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Retrieval settings (`[search]`).
    #[serde(default)]
    pub search: SearchConfig,

    /// Session history settings (`[session]`).
    #[serde(default)]
    pub session: SessionConfig,

    /// Generation settings (`[agent]`).
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Retrieval settings (`[search]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Results returned per search. Default: `5`.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Minimum cosine similarity for course-name resolution. `None` (the
    /// default) accepts the nearest catalog title unconditionally.
    #[serde(default)]
    pub min_similarity: Option<f32>,
}

/// Session history settings (`[session]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum exchanges retained per session. Default: `10`.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

/// Generation settings (`[agent]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Sampling temperature. Default: `0.0` (deterministic).
    #[serde(default)]
    pub temperature: f64,
    /// Output token cap per generation call. Default: `800`.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn default_max_results() -> usize {
    5
}

fn default_max_history() -> usize {
    10
}

fn default_max_tokens() -> u32 {
    800
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            min_similarity: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            provider: Some("openai".into()),
            model: Some("gpt-4o-mini".into()),
            api_key: None,
            api_url: None,
            embedding_model: default_embedding_model(),
            search: SearchConfig::default(),
            session: SessionConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl Config {
    /// Resolve the config directory from an optional CLI override.
    pub fn resolve_dir(config_dir: Option<&str>) -> Result<PathBuf> {
        if let Some(dir) = config_dir {
            let expanded = shellexpand::tilde(dir);
            return Ok(PathBuf::from(expanded.as_ref()));
        }
        if let Ok(dir) = std::env::var("LECTERN_DIR") {
            if !dir.trim().is_empty() {
                let expanded = shellexpand::tilde(dir.trim());
                return Ok(PathBuf::from(expanded.as_ref()));
            }
        }
        let dirs = UserDirs::new().context("could not determine home directory")?;
        Ok(dirs.home_dir().join(".lectern"))
    }

    /// Load config from `<dir>/config.toml`, falling back to defaults when
    /// the file does not exist.
    pub fn load(config_dir: Option<&str>) -> Result<Self> {
        let dir = Self::resolve_dir(config_dir)?;
        let path = dir.join("config.toml");

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<Config>(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Config::default()
        };
        config.config_path = path;
        Ok(config)
    }

    /// Write the config back to its path, creating the directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = &self.config_path;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Write a default config file under `dir` and return it.
    pub fn init_at(dir: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.config_path = dir.join("config.toml");
        config.save()?;
        Ok(config)
    }
}

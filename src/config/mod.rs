#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
pub const DEFAULT_DEBOUNCE_MS: u64 = 3000;
pub const DEFAULT_MIN_SCORE: f32 = 0.15;
pub const DEFAULT_CHUNK_LINES: usize = 250;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Connection settings for the embedding backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub url: String,
    pub model: String,
    pub headers: HashMap<String, String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/api/embed".to_string(),
            model: "nomic-embed-text:latest".to_string(),
            headers: HashMap::new(),
        }
    }
}

/// Connection and pacing settings for the completion backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionConfig {
    pub url: String,
    pub model: String,
    pub headers: HashMap<String, String>,
    /// Attempts spent re-requesting when the reply fails JSON validation.
    pub retry_attempts: u32,
    /// Quiet period after the last edit before a request fires.
    pub debounce_ms: u64,
    /// Extra system instruction added at most once per session lifetime.
    pub custom_instruction: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/v1/chat/completions".to_string(),
            model: "qwen2.5-coder:latest".to_string(),
            headers: HashMap::new(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            custom_instruction: None,
        }
    }
}

/// Settings for similarity retrieval used to augment prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub enabled: bool,
    /// Minimum absolute similarity score a stored snippet must clear.
    pub min_score: f32,
    /// Line-window size used when embedding large files.
    pub chunk_lines: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_score: DEFAULT_MIN_SCORE,
            chunk_lines: DEFAULT_CHUNK_LINES,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid retry attempts: {0} (must be between 1 and 20)")]
    InvalidRetryAttempts(u32),
    #[error("Invalid debounce delay: {0}ms (must be between 100 and 60000)")]
    InvalidDebounce(u64),
    #[error("Invalid minimum score: {0} (must be between 0.0 and 1.0)")]
    InvalidMinScore(f32),
    #[error("Invalid chunk size: {0} (must be between 1 and 10000 lines)")]
    InvalidChunkLines(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from `config.toml` under the given directory.
    /// A missing file yields the defaults rather than an error.
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                embedding: EmbeddingConfig::default(),
                completion: CompletionConfig::default(),
                retrieval: RetrievalConfig::default(),
                base_dir: config_dir.as_ref().to_path_buf(),
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.base_dir.display()
            )
        })?;

        let config_path = self.base_dir.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint(&self.embedding.url, &self.embedding.model)?;
        validate_endpoint(&self.completion.url, &self.completion.model)?;

        if self.completion.retry_attempts == 0 || self.completion.retry_attempts > 20 {
            return Err(ConfigError::InvalidRetryAttempts(
                self.completion.retry_attempts,
            ));
        }

        if !(100..=60_000).contains(&self.completion.debounce_ms) {
            return Err(ConfigError::InvalidDebounce(self.completion.debounce_ms));
        }

        if !(0.0..=1.0).contains(&self.retrieval.min_score) {
            return Err(ConfigError::InvalidMinScore(self.retrieval.min_score));
        }

        if self.retrieval.chunk_lines == 0 || self.retrieval.chunk_lines > 10_000 {
            return Err(ConfigError::InvalidChunkLines(self.retrieval.chunk_lines));
        }

        Ok(())
    }

    /// Path of the persisted vector index snapshot.
    #[inline]
    pub fn index_path(&self) -> PathBuf {
        self.base_dir.join("vectors").join("index.json")
    }
}

fn validate_endpoint(url: &str, model: &str) -> Result<(), ConfigError> {
    Url::parse(url).map_err(|_| ConfigError::InvalidUrl(url.to_string()))?;

    if model.trim().is_empty() {
        return Err(ConfigError::InvalidModel(model.to_string()));
    }

    Ok(())
}

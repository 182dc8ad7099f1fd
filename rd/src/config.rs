//! Configuration types and loading
//!
//! The credential is named by an environment variable in config, checked
//! once at startup via [`Config::validate`], and resolved into the client
//! constructor. Nothing reads the environment mid-run.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pipeline::PipelineConfig;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Per-stage pipeline limits
    pub pipeline: StageLimitsConfig,

    /// Reference corpus configuration
    pub retrieval: RetrievalConfig,

    /// Memory store configuration
    pub memory: MemoryConfig,

    /// Outline output configuration
    pub outline: OutlineConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key environment variable is set. Call this early
    /// in startup so a missing credential fails before any pipeline run.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config
        let local_config = PathBuf::from(".rfpdraft.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("rfpdraft").join("rfpdraft.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("openai" or "anthropic")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Resolve the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .context(format!("Environment variable {} is not set", self.api_key_env))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 300_000,
        }
    }
}

/// Per-stage limits for the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageLimitsConfig {
    /// Max tokens per stage response
    #[serde(rename = "stage-max-tokens")]
    pub stage_max_tokens: u32,

    /// Bound on one stage call in milliseconds
    #[serde(rename = "stage-timeout-ms")]
    pub stage_timeout_ms: u64,
}

impl Default for StageLimitsConfig {
    fn default() -> Self {
        Self {
            stage_max_tokens: 4096,
            stage_timeout_ms: 300_000,
        }
    }
}

impl From<&StageLimitsConfig> for PipelineConfig {
    fn from(config: &StageLimitsConfig) -> Self {
        Self {
            stage_max_tokens: config.stage_max_tokens,
            stage_timeout: Duration::from_millis(config.stage_timeout_ms),
        }
    }
}

/// Reference corpus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// JSONL corpus of precedent cases
    #[serde(rename = "case-corpus")]
    pub case_corpus: Option<PathBuf>,

    /// JSONL corpus of evaluation criteria
    #[serde(rename = "criteria-corpus")]
    pub criteria_corpus: Option<PathBuf>,

    /// Passages retrieved per corpus
    #[serde(rename = "top-k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            case_corpus: None,
            criteria_corpus: None,
            top_k: 3,
        }
    }
}

/// Memory store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Root directory for memory data
    pub dir: PathBuf,

    /// Interactions kept in short-term memory
    #[serde(rename = "max-history")]
    pub max_history: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rfpdraft")
                .join("memory"),
            max_history: memstore::DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Outline output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Directory outline files are written to
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outlines"),
        }
    }
}

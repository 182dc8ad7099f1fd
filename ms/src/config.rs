//! Configuration for memstore

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for all memory data
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Number of interactions kept in short-term memory
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Bound on the long-term in-memory pattern cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rfpdraft")
        .join("memory")
}

fn default_history_capacity() -> usize {
    crate::DEFAULT_HISTORY_CAPACITY
}

fn default_cache_capacity() -> usize {
    crate::DEFAULT_CACHE_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            history_capacity: default_history_capacity(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            return Ok(config);
        }

        let default_paths = [
            dirs::config_dir().map(|p| p.join("memstore").join("config.yml")),
            Some(PathBuf::from("memstore.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.history_capacity, crate::DEFAULT_HISTORY_CAPACITY);
        assert_eq!(config.cache_capacity, crate::DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("store_dir: /tmp/mem").unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/tmp/mem"));
        assert_eq!(config.history_capacity, crate::DEFAULT_HISTORY_CAPACITY);
    }
}

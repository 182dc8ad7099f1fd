//! Long-term memory - file-backed store of successful drafting patterns
//!
//! Patterns live as individual JSON files under `<dir>/patterns/`, with a
//! bounded in-memory cache in front of them and aggregate counts in
//! `<dir>/stats/pattern_stats.json`.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One remembered drafting outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    /// Key the pattern is filed under (slug-safe)
    pub key: String,
    /// The request that produced this outcome
    pub request: String,
    /// Core purpose identified for the request
    pub core_purpose: String,
    /// IDs of the tasks the pipeline produced
    pub task_ids: Vec<String>,
    /// Path of the written outline, if one was produced
    pub outline_file: Option<String>,
    /// When the pattern was recorded
    pub created_at: DateTime<Utc>,
}

/// Aggregate statistics across all saved patterns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternStats {
    /// Total number of saves (including overwrites)
    pub total_patterns: u64,
    /// Save count per pattern key
    pub pattern_counts: BTreeMap<String, u64>,
    /// Timestamp of the most recent save
    pub last_updated: Option<DateTime<Utc>>,
}

/// File-backed pattern store with a bounded cache
pub struct LongTermMemory {
    patterns_path: PathBuf,
    stats_path: PathBuf,
    cache: HashMap<String, PatternRecord>,
    cache_order: VecDeque<String>,
    cache_capacity: usize,
}

impl LongTermMemory {
    /// Open or create a store rooted at `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let patterns_path = dir.join("patterns");
        let stats_path = dir.join("stats");

        for path in [&patterns_path, &stats_path] {
            fs::create_dir_all(path).context("Failed to create long-term memory directory")?;
        }

        debug!(?dir, "opened long-term memory");
        Ok(Self {
            patterns_path,
            stats_path,
            cache: HashMap::new(),
            cache_order: VecDeque::new(),
            cache_capacity: crate::DEFAULT_CACHE_CAPACITY,
        })
    }

    /// Save a pattern, overwriting any existing record under the same key
    pub fn save_pattern(&mut self, record: &PatternRecord) -> Result<()> {
        if record.key.is_empty() || record.key.contains(['/', '\\']) {
            bail!("Invalid pattern key: '{}'", record.key);
        }

        let file_path = self.patterns_path.join(format!("{}.json", record.key));
        let content = serde_json::to_string_pretty(record)?;
        fs::write(&file_path, content).context("Failed to write pattern file")?;

        self.cache_insert(record.clone());
        self.update_stats(&record.key)?;

        info!(key = %record.key, "pattern saved");
        Ok(())
    }

    /// Fetch a pattern by key: cache first, file second
    pub fn get_pattern(&mut self, key: &str) -> Result<Option<PatternRecord>> {
        if let Some(record) = self.cache.get(key) {
            debug!(%key, "pattern cache hit");
            return Ok(Some(record.clone()));
        }

        let file_path = self.patterns_path.join(format!("{key}.json"));
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&file_path).context("Failed to read pattern file")?;
        let record: PatternRecord = serde_json::from_str(&content).context("Failed to parse pattern file")?;

        self.cache_insert(record.clone());
        Ok(Some(record))
    }

    /// Search stored patterns by regex over their serialized content
    ///
    /// The match is case-insensitive and capped at `limit` results.
    pub fn search_patterns(&self, pattern: &str, limit: usize) -> Result<Vec<PatternRecord>> {
        let regex = regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .context("Invalid search pattern")?;

        let mut results = Vec::new();

        for entry in fs::read_dir(&self.patterns_path)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let content = fs::read_to_string(&path)?;
                if regex.is_match(&content) {
                    let record: PatternRecord =
                        serde_json::from_str(&content).context("Failed to parse pattern file")?;
                    results.push(record);
                    if results.len() >= limit {
                        break;
                    }
                }
            }
        }

        debug!(%pattern, count = results.len(), "pattern search complete");
        Ok(results)
    }

    /// Read the aggregate statistics
    pub fn stats(&self) -> Result<PatternStats> {
        let stats_file = self.stats_path.join("pattern_stats.json");
        if !stats_file.exists() {
            return Ok(PatternStats::default());
        }

        let content = fs::read_to_string(&stats_file).context("Failed to read pattern stats")?;
        serde_json::from_str(&content).context("Failed to parse pattern stats")
    }

    /// Drop the in-memory cache, forcing fresh reads
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.cache_order.clear();
    }

    /// Delete every stored pattern and the stats file
    pub fn clear(&mut self) -> Result<()> {
        for entry in fs::read_dir(&self.patterns_path)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                fs::remove_file(&path)?;
            }
        }

        let stats_file = self.stats_path.join("pattern_stats.json");
        if stats_file.exists() {
            fs::remove_file(&stats_file)?;
        }

        self.clear_cache();
        info!("long-term memory cleared");
        Ok(())
    }

    fn cache_insert(&mut self, record: PatternRecord) {
        if !self.cache.contains_key(&record.key) {
            if self.cache.len() >= self.cache_capacity
                && let Some(evicted) = self.cache_order.pop_front()
            {
                self.cache.remove(&evicted);
            }
            self.cache_order.push_back(record.key.clone());
        }
        self.cache.insert(record.key.clone(), record);
    }

    fn update_stats(&self, key: &str) -> Result<()> {
        let mut stats = self.stats()?;

        stats.total_patterns += 1;
        *stats.pattern_counts.entry(key.to_string()).or_insert(0) += 1;
        stats.last_updated = Some(Utc::now());

        let stats_file = self.stats_path.join("pattern_stats.json");
        let content = serde_json::to_string_pretty(&stats)?;
        fs::write(&stats_file, content).context("Failed to write pattern stats")?;

        Ok(())
    }
}

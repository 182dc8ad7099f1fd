//! Short-term memory - recent interactions and temporary context

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// One request/reply exchange with the assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Unique interaction ID
    pub id: String,
    /// When the exchange happened
    pub timestamp: DateTime<Utc>,
    /// What the user asked for
    pub request: String,
    /// What the assistant replied (or a summary of it)
    pub reply: String,
}

impl Interaction {
    /// Create a new interaction stamped with the current time
    pub fn new(request: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            request: request.into(),
            reply: reply.into(),
        }
    }
}

/// Bounded ring of recent interactions
///
/// Oldest entries are evicted once the capacity is reached. The ring can be
/// persisted to a JSON file so conversational context survives process
/// restarts.
#[derive(Debug, Clone)]
pub struct ShortTermMemory {
    history: VecDeque<Interaction>,
    capacity: usize,
}

impl Default for ShortTermMemory {
    fn default() -> Self {
        Self::new(crate::DEFAULT_HISTORY_CAPACITY)
    }
}

impl ShortTermMemory {
    /// Create an empty store keeping at most `capacity` interactions
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Load a store from a JSON file, keeping at most `capacity` entries
    ///
    /// A missing file yields an empty store - the first run has no history.
    pub fn load(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let path = path.as_ref();
        let mut store = Self::new(capacity);

        if !path.exists() {
            debug!(?path, "no short-term memory file, starting empty");
            return Ok(store);
        }

        let content = fs::read_to_string(path).context("Failed to read short-term memory file")?;
        let entries: Vec<Interaction> =
            serde_json::from_str(&content).context("Failed to parse short-term memory file")?;

        for entry in entries {
            store.add(entry);
        }

        debug!(?path, count = store.len(), "loaded short-term memory");
        Ok(store)
    }

    /// Persist the ring to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create memory directory")?;
        }

        let entries: Vec<&Interaction> = self.history.iter().collect();
        let content = serde_json::to_string_pretty(&entries)?;
        fs::write(path, content).context("Failed to write short-term memory file")?;

        debug!(?path, count = self.len(), "saved short-term memory");
        Ok(())
    }

    /// Record an interaction, evicting the oldest entry if at capacity
    pub fn add(&mut self, interaction: Interaction) {
        if self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(interaction);
    }

    /// Iterate over retained interactions, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &Interaction> {
        self.history.iter()
    }

    /// Drop entries older than the default maximum age (one hour)
    pub fn prune_expired(&mut self) {
        self.prune_older_than(Duration::seconds(crate::DEFAULT_MAX_AGE_SECS));
    }

    /// Drop entries older than `max_age`
    pub fn prune_older_than(&mut self, max_age: Duration) {
        let cutoff = Utc::now() - max_age;
        let before = self.history.len();
        self.history.retain(|i| i.timestamp >= cutoff);
        if self.history.len() != before {
            debug!(removed = before - self.history.len(), "pruned short-term memory");
        }
    }

    /// Render the retained exchanges as conversational context text
    ///
    /// Returns an empty string when there is no history.
    pub fn context_text(&self) -> String {
        let mut out = String::new();
        for interaction in &self.history {
            out.push_str(&format!("> {}\n{}\n", interaction.request, interaction.reply));
        }
        out.trim_end().to_string()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_recent() {
        let mut mem = ShortTermMemory::new(5);
        mem.add(Interaction::new("first request", "first reply"));
        mem.add(Interaction::new("second request", "second reply"));

        let requests: Vec<&str> = mem.recent().map(|i| i.request.as_str()).collect();
        assert_eq!(requests, vec!["first request", "second request"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut mem = ShortTermMemory::new(3);
        for n in 0..5 {
            mem.add(Interaction::new(format!("request {n}"), "reply"));
        }

        assert_eq!(mem.len(), 3);
        let first = mem.recent().next().unwrap();
        assert_eq!(first.request, "request 2");
    }

    #[test]
    fn test_prune_older_than() {
        let mut mem = ShortTermMemory::new(10);
        let mut old = Interaction::new("stale", "reply");
        old.timestamp = Utc::now() - Duration::hours(2);
        mem.add(old);
        mem.add(Interaction::new("fresh", "reply"));

        mem.prune_older_than(Duration::hours(1));

        assert_eq!(mem.len(), 1);
        assert_eq!(mem.recent().next().unwrap().request, "fresh");
    }

    #[test]
    fn test_prune_expired_uses_default_age() {
        let mut mem = ShortTermMemory::new(10);
        let mut old = Interaction::new("stale", "reply");
        old.timestamp = Utc::now() - Duration::seconds(crate::DEFAULT_MAX_AGE_SECS + 60);
        mem.add(old);
        mem.add(Interaction::new("fresh", "reply"));

        mem.prune_expired();
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn test_context_text() {
        let mut mem = ShortTermMemory::new(5);
        assert!(mem.context_text().is_empty());

        mem.add(Interaction::new("hello", "world"));
        let text = mem.context_text();
        assert!(text.contains("> hello"));
        assert!(text.contains("world"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("recent.json");

        let mut mem = ShortTermMemory::new(5);
        mem.add(Interaction::new("persisted", "reply"));
        mem.save(&path).unwrap();

        let loaded = ShortTermMemory::load(&path, 5).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.recent().next().unwrap().request, "persisted");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = tempfile::TempDir::new().unwrap();
        let mem = ShortTermMemory::load(temp.path().join("nope.json"), 5).unwrap();
        assert!(mem.is_empty());
    }
}

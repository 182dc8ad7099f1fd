//! Working memory - state of the task currently being worked on

use chrono::{DateTime, Utc};
use eyre::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Lifecycle status of a tracked task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" | "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown task status: {}", s)),
        }
    }
}

/// The task currently (or previously) tracked by working memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTask {
    pub task_id: String,
    pub description: String,
    pub status: TaskStatus,
    /// Completion fraction in 0.0..=1.0
    pub progress: f32,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Tracks the in-flight task and the history of finished ones
#[derive(Debug, Default)]
pub struct WorkingMemory {
    current: Option<ActiveTask>,
    history: Vec<ActiveTask>,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a task, replacing any previous one
    ///
    /// A still-running previous task is archived as failed (superseded).
    pub fn begin(&mut self, task_id: impl Into<String>, description: impl Into<String>) -> Result<()> {
        let task_id = task_id.into();
        if task_id.is_empty() {
            bail!("Task id must not be empty");
        }

        if let Some(mut previous) = self.current.take()
            && previous.status == TaskStatus::InProgress
        {
            previous.status = TaskStatus::Failed;
            previous.error = Some("superseded by a new task".to_string());
            previous.finished_at = Some(Utc::now());
            self.history.push(previous);
        }

        debug!(%task_id, "working memory: task started");
        self.current = Some(ActiveTask {
            task_id,
            description: description.into(),
            status: TaskStatus::InProgress,
            progress: 0.0,
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        });
        Ok(())
    }

    /// Update the progress fraction; reaching 1.0 completes the task
    pub fn update_progress(&mut self, progress: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&progress) {
            bail!("Progress must be between 0.0 and 1.0, got {progress}");
        }

        let Some(task) = self.current.as_mut() else {
            bail!("No active task");
        };

        task.progress = progress;
        debug!(task_id = %task.task_id, progress, "working memory: progress updated");

        if progress >= 1.0 {
            self.complete()?;
        }
        Ok(())
    }

    /// Mark the active task completed and move it to history
    pub fn complete(&mut self) -> Result<()> {
        let Some(mut task) = self.current.take() else {
            bail!("No active task");
        };

        task.status = TaskStatus::Completed;
        task.progress = 1.0;
        task.finished_at = Some(Utc::now());

        info!(task_id = %task.task_id, "working memory: task completed");
        self.history.push(task);
        Ok(())
    }

    /// Mark the active task failed and move it to history
    pub fn fail(&mut self, error: impl Into<String>) -> Result<()> {
        let Some(mut task) = self.current.take() else {
            bail!("No active task");
        };

        task.status = TaskStatus::Failed;
        task.error = Some(error.into());
        task.finished_at = Some(Utc::now());

        info!(task_id = %task.task_id, "working memory: task failed");
        self.history.push(task);
        Ok(())
    }

    pub fn current(&self) -> Option<&ActiveTask> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[ActiveTask] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

//! Task records produced by the task-creation stage

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Task priority in the range 1 (highest) to 5 (lowest)
///
/// Values outside the range fail deserialization, so an out-of-range
/// priority in model output is a schema violation, not a silent clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Create a priority, rejecting values outside 1..=5
    pub fn new(value: u8) -> Result<Self, String> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "priority must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            ))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One structured work item in the RFP breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Unique task ID
    pub task_id: String,
    /// Kind of work (e.g. analysis, implementation, procurement)
    pub task_type: String,
    /// What the task accomplishes
    pub description: String,
    /// Priority, 1 = highest
    pub priority: Priority,
    /// IDs of tasks this one depends on
    pub dependencies: Vec<String>,
}

/// The full task list returned by the task-creation stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSet {
    pub tasks: Vec<TaskSpec>,
}

/// Check a task list for graph problems, reporting them as warnings
///
/// Duplicate ids, unknown dependency ids, self-references and cycles do not
/// fail the pipeline; downstream consumers decide what to do with them.
pub fn validate_task_graph(tasks: &[TaskSpec]) -> Vec<String> {
    let mut warnings = Vec::new();

    let mut ids = HashSet::new();
    for task in tasks {
        if !ids.insert(task.task_id.as_str()) {
            warnings.push(format!("duplicate task id '{}'", task.task_id));
        }
    }

    for task in tasks {
        for dep in &task.dependencies {
            if dep == &task.task_id {
                warnings.push(format!("task '{}' depends on itself", task.task_id));
            } else if !ids.contains(dep.as_str()) {
                warnings.push(format!("task '{}' depends on unknown task '{}'", task.task_id, dep));
            }
        }
    }

    if let Some(cycle) = find_cycle(tasks) {
        warnings.push(format!("dependency cycle detected: {}", cycle.join(" -> ")));
    }

    warnings
}

/// Find a dependency cycle via DFS, if one exists
///
/// Self-references are excluded here since they are already reported above.
fn find_cycle(tasks: &[TaskSpec]) -> Option<Vec<String>> {
    let graph: HashMap<&str, &TaskSpec> = tasks.iter().map(|t| (t.task_id.as_str(), t)).collect();

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for task_id in graph.keys() {
        if !visited.contains(task_id) && cycle_dfs(task_id, &graph, &mut visited, &mut rec_stack, &mut path) {
            return Some(path);
        }
    }

    None
}

fn cycle_dfs<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, &'a TaskSpec>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<String>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node.to_string());

    if let Some(task) = graph.get(node) {
        for dep in &task.dependencies {
            if dep == node {
                continue;
            }
            if !visited.contains(dep.as_str()) {
                if graph.contains_key(dep.as_str()) && cycle_dfs(dep.as_str(), graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(dep.as_str()) {
                path.push(dep.clone());
                return true;
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    false
}

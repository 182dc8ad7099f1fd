//! Embedded prompt templates
//!
//! These are compiled into the binary from .pmt files at build time.

/// Purpose-analysis stage template
pub const PURPOSE: &str = include_str!("../../prompts/purpose.pmt");

/// Scope-definition stage template
pub const SCOPE: &str = include_str!("../../prompts/scope.pmt");

/// Case-study stage template
pub const CASES: &str = include_str!("../../prompts/cases.pmt");

/// Evaluation-criteria stage template
pub const CRITERIA: &str = include_str!("../../prompts/criteria.pmt");

/// Task-creation stage template
pub const TASKS: &str = include_str!("../../prompts/tasks.pmt");

/// Get an embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "purpose" => Some(PURPOSE),
        "scope" => Some(SCOPE),
        "cases" => Some(CASES),
        "criteria" => Some(CRITERIA),
        "tasks" => Some(TASKS),
        _ => None,
    }
}

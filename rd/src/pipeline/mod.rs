//! The staged decomposition pipeline
//!
//! Five schema-constrained model calls in fixed order, each consuming the
//! full outputs of the stages before it:
//!
//! 1. [`stages::analyze_purpose`] - purpose analysis
//! 2. [`stages::define_scope`] - scope definition
//! 3. [`stages::study_cases`] - precedent case study
//! 4. [`stages::define_criteria`] - evaluation criteria
//! 5. [`stages::create_tasks`] - structured task creation
//!
//! [`Pipeline`] sequences them and returns the full [`PipelineRun`] trace.

pub mod stages;

mod runner;

pub use runner::{Pipeline, PipelineConfig, PipelineError, PipelineRun};
pub use stages::{StageContext, StageError, StageOptions, StageOutput};

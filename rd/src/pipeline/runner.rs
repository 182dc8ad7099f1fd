//! Pipeline sequencer
//!
//! Runs the five stage chains in fixed order - purpose analysis, scope
//! definition, case study, evaluation criteria, task creation - threading
//! each stage's full output into every later stage. The first stage failure
//! aborts the run; no partial results are substituted and no stage is
//! skipped.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::stages::{self, StageError, StageOptions};
use crate::llm::{LlmClient, TokenUsage};
use crate::prompts::PromptLoader;
use crate::schema::{CaseStudy, EvaluationCriteria, PurposeAnalysis, ScopeDefinition, TaskSpec, validate_task_graph};

/// Errors from a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("request must not be empty")]
    EmptyRequest,

    #[error(transparent)]
    Stage(#[from] StageError),
}

/// Limits applied to every stage call
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Max tokens per stage response
    pub stage_max_tokens: u32,
    /// Bound on one stage call
    pub stage_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_max_tokens: 4096,
            stage_timeout: Duration::from_secs(300),
        }
    }
}

/// The full trace of one pipeline run
///
/// Every intermediate record is kept so callers can display or persist the
/// whole decomposition, not just the final task list.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub run_id: String,
    pub request: String,
    pub context: String,
    pub purpose: PurposeAnalysis,
    pub scope: ScopeDefinition,
    pub cases: CaseStudy,
    pub criteria: EvaluationCriteria,
    pub tasks: Vec<TaskSpec>,
    /// Task-graph problems (cycles, duplicate or unknown ids)
    pub warnings: Vec<String>,
    /// Token usage summed across all five stages
    pub usage: TokenUsage,
}

/// Sequences the five stage chains over one model client
///
/// Holds no mutable state: concurrent runs are independent and results are
/// never cached across runs.
pub struct Pipeline {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    opts: StageOptions,
}

impl Pipeline {
    /// Create a pipeline from an explicit client and configuration
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader, config: PipelineConfig) -> Self {
        Self {
            llm,
            prompts,
            opts: StageOptions {
                max_tokens: config.stage_max_tokens,
                timeout: config.stage_timeout,
            },
        }
    }

    /// Run all five stages for one request
    ///
    /// `context` may be empty; `request` must not be.
    pub async fn run(&self, request: &str, context: &str) -> Result<PipelineRun, PipelineError> {
        if request.trim().is_empty() {
            return Err(PipelineError::EmptyRequest);
        }

        let run_id = Uuid::now_v7().to_string();
        info!(%run_id, request_len = request.len(), "starting pipeline run");

        let mut usage = TokenUsage::default();

        let purpose = stages::analyze_purpose(&self.llm, &self.prompts, &self.opts, request, context).await?;
        usage.accumulate(&purpose.usage);
        info!(%run_id, stage = "purpose-analysis", "stage complete");

        let scope =
            stages::define_scope(&self.llm, &self.prompts, &self.opts, request, context, &purpose.record).await?;
        usage.accumulate(&scope.usage);
        info!(%run_id, stage = "scope-definition", "stage complete");

        let cases = stages::study_cases(
            &self.llm,
            &self.prompts,
            &self.opts,
            request,
            context,
            &purpose.record,
            &scope.record,
        )
        .await?;
        usage.accumulate(&cases.usage);
        info!(%run_id, stage = "case-study", "stage complete");

        let criteria = stages::define_criteria(
            &self.llm,
            &self.prompts,
            &self.opts,
            request,
            context,
            &purpose.record,
            &scope.record,
            &cases.record,
        )
        .await?;
        usage.accumulate(&criteria.usage);
        info!(%run_id, stage = "evaluation-criteria", "stage complete");

        let tasks = stages::create_tasks(
            &self.llm,
            &self.prompts,
            &self.opts,
            request,
            context,
            &purpose.record,
            &scope.record,
            &cases.record,
            &criteria.record,
        )
        .await?;
        usage.accumulate(&tasks.usage);
        info!(%run_id, stage = "task-creation", task_count = tasks.record.tasks.len(), "stage complete");

        let warnings = validate_task_graph(&tasks.record.tasks);
        for warning in &warnings {
            warn!(%run_id, %warning, "task graph warning");
        }

        Ok(PipelineRun {
            run_id,
            request: request.to_string(),
            context: context.to_string(),
            purpose: purpose.record,
            scope: scope.record,
            cases: cases.record,
            criteria: criteria.record,
            tasks: tasks.record.tasks,
            warnings,
            usage,
        })
    }
}

//! Stage chains - one schema-constrained model call per stage
//!
//! Each stage pairs a fixed system prompt and a Handlebars user template
//! with a single tool definition whose input schema is the stage's output
//! record. The model's tool call is decoded strictly into the record type;
//! anything that does not match the schema fails the stage.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, TokenUsage, ToolDefinition};
use crate::prompts::PromptLoader;
use crate::schema::{CaseStudy, EvaluationCriteria, PurposeAnalysis, ScopeDefinition, TaskSet};

/// Errors from a single stage chain
#[derive(Debug, Error)]
pub enum StageError {
    /// Model output failed schema validation
    #[error("{stage} output failed schema validation: {reason}")]
    Schema { stage: &'static str, reason: String },

    /// Model returned neither the expected tool call nor parseable JSON
    #[error("{stage} produced no structured output")]
    MissingOutput { stage: &'static str },

    /// The user prompt template could not be rendered
    #[error("failed to render {stage} prompt: {reason}")]
    Template { stage: &'static str, reason: String },

    /// A predecessor record could not be serialized into the prompt
    #[error("failed to encode stage inputs: {0}")]
    Encode(#[from] serde_json::Error),

    /// Endpoint failure (network, auth, rate limit, timeout)
    #[error(transparent)]
    Upstream(#[from] LlmError),
}

impl StageError {
    /// Name of the stage the error belongs to, where known
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::Schema { stage, .. } | Self::MissingOutput { stage } | Self::Template { stage, .. } => Some(stage),
            Self::Encode(_) | Self::Upstream(_) => None,
        }
    }
}

/// Per-call limits shared by all stages
#[derive(Debug, Clone)]
pub struct StageOptions {
    /// Max tokens per stage response
    pub max_tokens: u32,
    /// Bound on one stage call; expiry surfaces as an upstream timeout
    pub timeout: Duration,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Output of one stage: the decoded record plus its token usage
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub record: T,
    pub usage: TokenUsage,
}

/// Input bundle rendered into a stage's user template
///
/// Later stages carry the full JSON of every earlier record; nothing is
/// summarized or dropped between stages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageContext {
    pub request: String,
    pub context: String,
    pub purpose_analysis: Option<String>,
    pub scope_definition: Option<String>,
    pub case_study: Option<String>,
    pub evaluation_criteria: Option<String>,
}

impl StageContext {
    pub fn new(request: &str, context: &str) -> Self {
        Self {
            request: request.to_string(),
            context: context.to_string(),
            ..Self::default()
        }
    }

    pub fn with_purpose(mut self, purpose: &PurposeAnalysis) -> Result<Self, serde_json::Error> {
        self.purpose_analysis = Some(serde_json::to_string_pretty(purpose)?);
        Ok(self)
    }

    pub fn with_scope(mut self, scope: &ScopeDefinition) -> Result<Self, serde_json::Error> {
        self.scope_definition = Some(serde_json::to_string_pretty(scope)?);
        Ok(self)
    }

    pub fn with_cases(mut self, cases: &CaseStudy) -> Result<Self, serde_json::Error> {
        self.case_study = Some(serde_json::to_string_pretty(cases)?);
        Ok(self)
    }

    pub fn with_criteria(mut self, criteria: &EvaluationCriteria) -> Result<Self, serde_json::Error> {
        self.evaluation_criteria = Some(serde_json::to_string_pretty(criteria)?);
        Ok(self)
    }
}

/// Identity of one stage: template, tool and system prompt
struct StageDef {
    name: &'static str,
    tool_name: &'static str,
    template: &'static str,
    system_prompt: &'static str,
}

const PURPOSE_STAGE: StageDef = StageDef {
    name: "purpose-analysis",
    tool_name: "analyze_purpose",
    template: "purpose",
    system_prompt: "You are an expert at analyzing project purposes and objectives. \
         Your task is to analyze the given request and context to identify the core purpose, \
         problem statement, final goal, and key objectives. \
         Also analyze the conversation to determine the next topic and extract relevant information. \
         Call analyze_purpose exactly once with every field populated.",
};

const SCOPE_STAGE: StageDef = StageDef {
    name: "scope-definition",
    tool_name: "define_scope",
    template: "scope",
    system_prompt: "You are an expert at defining project scope and requirements. \
         Your task is to analyze the given request, context, and purpose analysis to define the project scope. \
         Make sure to include timeline estimates for each major phase of the project. \
         Call define_scope exactly once with every field populated.",
};

const CASES_STAGE: StageDef = StageDef {
    name: "case-study",
    tool_name: "analyze_cases",
    template: "cases",
    system_prompt: "You are an expert at analyzing project case studies and lessons learned. \
         Your task is to analyze the given request and identify relevant cases. \
         Call analyze_cases exactly once with every field populated.",
};

const CRITERIA_STAGE: StageDef = StageDef {
    name: "evaluation-criteria",
    tool_name: "define_criteria",
    template: "criteria",
    system_prompt: "You are an expert at defining project evaluation criteria. \
         Your task is to analyze the given information and define evaluation criteria. \
         Call define_criteria exactly once with every field populated.",
};

const TASKS_STAGE: StageDef = StageDef {
    name: "task-creation",
    tool_name: "create_tasks",
    template: "tasks",
    system_prompt: "You are an expert at breaking down projects into structured tasks. \
         Your task is to analyze the given information and create structured tasks \
         with unique ids, priorities and dependencies. \
         Call create_tasks exactly once with the complete task list.",
};

fn purpose_tool() -> ToolDefinition {
    ToolDefinition::new(
        PURPOSE_STAGE.tool_name,
        "Analyze project purpose and objectives",
        serde_json::json!({
            "type": "object",
            "properties": {
                "core_purpose": { "type": "string" },
                "problem_statement": { "type": "string" },
                "final_goal": { "type": "string" },
                "key_objectives": { "type": "array", "items": { "type": "string" } },
                "next_topic": { "type": "string" },
                "conversation_context": { "type": "string" },
                "extracted_info": {
                    "type": "object",
                    "description": "Extracted facts as string key/value pairs"
                },
                "missing_info": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["core_purpose", "problem_statement", "final_goal", "key_objectives",
                         "next_topic", "conversation_context", "extracted_info", "missing_info"]
        }),
    )
}

fn scope_tool() -> ToolDefinition {
    ToolDefinition::new(
        SCOPE_STAGE.tool_name,
        "Define project scope and requirements",
        serde_json::json!({
            "type": "object",
            "properties": {
                "required_features": { "type": "array", "items": { "type": "string" } },
                "constraints": { "type": "array", "items": { "type": "string" } },
                "required_resources": { "type": "array", "items": { "type": "string" } },
                "timeline_estimates": {
                    "type": "object",
                    "description": "Estimated duration per major phase, as strings"
                }
            },
            "required": ["required_features", "constraints", "required_resources", "timeline_estimates"]
        }),
    )
}

fn cases_tool() -> ToolDefinition {
    ToolDefinition::new(
        CASES_STAGE.tool_name,
        "Analyze project case studies",
        serde_json::json!({
            "type": "object",
            "properties": {
                "similar_cases": { "type": "array", "items": { "type": "string" } },
                "effective_approaches": { "type": "array", "items": { "type": "string" } },
                "failure_cases": { "type": "array", "items": { "type": "string" } },
                "lessons_learned": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["similar_cases", "effective_approaches", "failure_cases", "lessons_learned"]
        }),
    )
}

fn criteria_tool() -> ToolDefinition {
    ToolDefinition::new(
        CRITERIA_STAGE.tool_name,
        "Define project evaluation criteria",
        serde_json::json!({
            "type": "object",
            "properties": {
                "success_metrics": { "type": "array", "items": { "type": "string" } },
                "quality_standards": { "type": "array", "items": { "type": "string" } },
                "performance_indicators": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["success_metrics", "quality_standards", "performance_indicators"]
        }),
    )
}

fn tasks_tool() -> ToolDefinition {
    ToolDefinition::new(
        TASKS_STAGE.tool_name,
        "Create structured project tasks. Call this once with all tasks.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "tasks": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "task_id": { "type": "string", "description": "Unique id for the task" },
                            "task_type": { "type": "string" },
                            "description": { "type": "string" },
                            "priority": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "dependencies": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "Ids of tasks this one depends on"
                            }
                        },
                        "required": ["task_id", "task_type", "description", "priority", "dependencies"]
                    }
                }
            },
            "required": ["tasks"]
        }),
    )
}

/// Stage 1: analyze the request's purpose and objectives
pub async fn analyze_purpose(
    llm: &Arc<dyn LlmClient>,
    prompts: &PromptLoader,
    opts: &StageOptions,
    request: &str,
    context: &str,
) -> Result<StageOutput<PurposeAnalysis>, StageError> {
    let ctx = StageContext::new(request, context);
    run_stage(llm, prompts, opts, &PURPOSE_STAGE, purpose_tool(), &ctx).await
}

/// Stage 2: define the project scope
pub async fn define_scope(
    llm: &Arc<dyn LlmClient>,
    prompts: &PromptLoader,
    opts: &StageOptions,
    request: &str,
    context: &str,
    purpose: &PurposeAnalysis,
) -> Result<StageOutput<ScopeDefinition>, StageError> {
    let ctx = StageContext::new(request, context).with_purpose(purpose)?;
    run_stage(llm, prompts, opts, &SCOPE_STAGE, scope_tool(), &ctx).await
}

/// Stage 3: study relevant precedent cases
pub async fn study_cases(
    llm: &Arc<dyn LlmClient>,
    prompts: &PromptLoader,
    opts: &StageOptions,
    request: &str,
    context: &str,
    purpose: &PurposeAnalysis,
    scope: &ScopeDefinition,
) -> Result<StageOutput<CaseStudy>, StageError> {
    let ctx = StageContext::new(request, context)
        .with_purpose(purpose)?
        .with_scope(scope)?;
    run_stage(llm, prompts, opts, &CASES_STAGE, cases_tool(), &ctx).await
}

/// Stage 4: define evaluation criteria
pub async fn define_criteria(
    llm: &Arc<dyn LlmClient>,
    prompts: &PromptLoader,
    opts: &StageOptions,
    request: &str,
    context: &str,
    purpose: &PurposeAnalysis,
    scope: &ScopeDefinition,
    cases: &CaseStudy,
) -> Result<StageOutput<EvaluationCriteria>, StageError> {
    let ctx = StageContext::new(request, context)
        .with_purpose(purpose)?
        .with_scope(scope)?
        .with_cases(cases)?;
    run_stage(llm, prompts, opts, &CRITERIA_STAGE, criteria_tool(), &ctx).await
}

/// Stage 5: break the project into structured tasks
pub async fn create_tasks(
    llm: &Arc<dyn LlmClient>,
    prompts: &PromptLoader,
    opts: &StageOptions,
    request: &str,
    context: &str,
    purpose: &PurposeAnalysis,
    scope: &ScopeDefinition,
    cases: &CaseStudy,
    criteria: &EvaluationCriteria,
) -> Result<StageOutput<TaskSet>, StageError> {
    let ctx = StageContext::new(request, context)
        .with_purpose(purpose)?
        .with_scope(scope)?
        .with_cases(cases)?
        .with_criteria(criteria)?;

    let output: StageOutput<TaskSet> = run_stage(llm, prompts, opts, &TASKS_STAGE, tasks_tool(), &ctx).await?;

    if output.record.tasks.is_empty() {
        return Err(StageError::Schema {
            stage: TASKS_STAGE.name,
            reason: "task list is empty".to_string(),
        });
    }

    Ok(output)
}

/// Run one stage: render, call, decode
async fn run_stage<T: DeserializeOwned>(
    llm: &Arc<dyn LlmClient>,
    prompts: &PromptLoader,
    opts: &StageOptions,
    stage: &StageDef,
    tool: ToolDefinition,
    ctx: &StageContext,
) -> Result<StageOutput<T>, StageError> {
    let user_prompt = prompts.render(stage.template, ctx).map_err(|e| StageError::Template {
        stage: stage.name,
        reason: e.to_string(),
    })?;

    let request = CompletionRequest {
        system_prompt: stage.system_prompt.to_string(),
        messages: vec![Message::user(user_prompt)],
        tools: vec![tool],
        max_tokens: opts.max_tokens,
    };

    info!(stage = stage.name, "invoking model");
    let response = tokio::time::timeout(opts.timeout, llm.complete(request))
        .await
        .map_err(|_| StageError::Upstream(LlmError::Timeout(opts.timeout)))??;

    parse_stage_response(stage, response)
}

/// Decode the expected tool call into the stage's record type
fn parse_stage_response<T: DeserializeOwned>(
    stage: &StageDef,
    response: CompletionResponse,
) -> Result<StageOutput<T>, StageError> {
    for call in &response.tool_calls {
        if call.name == stage.tool_name {
            debug!(stage = stage.name, "parse_stage_response: found tool call");
            let record = serde_json::from_value(call.input.clone()).map_err(|e| StageError::Schema {
                stage: stage.name,
                reason: e.to_string(),
            })?;
            return Ok(StageOutput {
                record,
                usage: response.usage,
            });
        }
    }

    // Some models answer with bare JSON text instead of calling the tool
    if let Some(content) = &response.content
        && let Ok(record) = serde_json::from_str::<T>(content)
    {
        debug!(stage = stage.name, "parse_stage_response: parsed content as JSON");
        return Ok(StageOutput {
            record,
            usage: response.usage,
        });
    }

    Err(StageError::MissingOutput { stage: stage.name })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{StopReason, ToolCall};

    pub(crate) fn tool_response(name: &str, input: serde_json::Value) -> CompletionResponse {
        CompletionResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: name.to_string(),
                input,
            }],
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
        }
    }

    pub(crate) fn purpose_input() -> serde_json::Value {
        serde_json::json!({
            "core_purpose": "의료 정보 시스템의 보안 강화",
            "problem_statement": "환자 데이터 유출 위험이 높다",
            "final_goal": "규정을 충족하는 안전한 시스템",
            "key_objectives": ["접근 제어 개선", "감사 로그 도입"],
            "next_topic": "예산 범위",
            "conversation_context": "보안 중심 초기 요청",
            "extracted_info": { "domain": "healthcare" },
            "missing_info": ["예산"]
        })
    }

    fn llm_with(responses: Vec<CompletionResponse>) -> Arc<dyn LlmClient> {
        Arc::new(MockLlmClient::new(responses))
    }

    #[tokio::test]
    async fn test_analyze_purpose_pass_through() {
        let llm = llm_with(vec![tool_response("analyze_purpose", purpose_input())]);
        let prompts = PromptLoader::embedded_only();

        let output = analyze_purpose(
            &llm,
            &prompts,
            &StageOptions::default(),
            "의료 정보 시스템 보안 강화 프로젝트",
            "",
        )
        .await
        .unwrap();

        assert_eq!(output.record.core_purpose, "의료 정보 시스템의 보안 강화");
        assert_eq!(output.record.key_objectives.len(), 2);
        assert_eq!(output.usage.input_tokens, 100);
    }

    #[tokio::test]
    async fn test_missing_required_field_is_schema_error() {
        let mut input = purpose_input();
        input.as_object_mut().unwrap().remove("key_objectives");
        let llm = llm_with(vec![tool_response("analyze_purpose", input)]);
        let prompts = PromptLoader::embedded_only();

        let result = analyze_purpose(&llm, &prompts, &StageOptions::default(), "request", "").await;

        match result {
            Err(StageError::Schema { stage, .. }) => assert_eq!(stage, "purpose-analysis"),
            other => panic!("Expected schema error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_tool_name_is_missing_output() {
        let llm = llm_with(vec![tool_response("some_other_tool", purpose_input())]);
        let prompts = PromptLoader::embedded_only();

        let result = analyze_purpose(&llm, &prompts, &StageOptions::default(), "request", "").await;
        assert!(matches!(result, Err(StageError::MissingOutput { .. })));
    }

    #[tokio::test]
    async fn test_json_content_fallback() {
        let llm = llm_with(vec![CompletionResponse {
            content: Some(purpose_input().to_string()),
            tool_calls: vec![],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }]);
        let prompts = PromptLoader::embedded_only();

        let output = analyze_purpose(&llm, &prompts, &StageOptions::default(), "request", "")
            .await
            .unwrap();
        assert_eq!(output.record.missing_info, vec!["예산"]);
    }

    #[tokio::test]
    async fn test_create_tasks_rejects_empty_list() {
        let purpose: PurposeAnalysis = serde_json::from_value(purpose_input()).unwrap();
        let scope = ScopeDefinition {
            required_features: vec![],
            constraints: vec![],
            required_resources: vec![],
            timeline_estimates: Default::default(),
        };
        let cases = CaseStudy {
            similar_cases: vec![],
            effective_approaches: vec![],
            failure_cases: vec![],
            lessons_learned: vec![],
        };
        let criteria = EvaluationCriteria {
            success_metrics: vec![],
            quality_standards: vec![],
            performance_indicators: vec![],
        };

        let llm = llm_with(vec![tool_response("create_tasks", serde_json::json!({ "tasks": [] }))]);
        let prompts = PromptLoader::embedded_only();

        let result = create_tasks(
            &llm,
            &prompts,
            &StageOptions::default(),
            "request",
            "",
            &purpose,
            &scope,
            &cases,
            &criteria,
        )
        .await;

        match result {
            Err(StageError::Schema { reason, .. }) => assert!(reason.contains("empty")),
            other => panic!("Expected schema error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        // Exhausted mock yields an upstream error
        let llm = llm_with(vec![]);
        let prompts = PromptLoader::embedded_only();

        let result = analyze_purpose(&llm, &prompts, &StageOptions::default(), "request", "").await;
        assert!(matches!(result, Err(StageError::Upstream(_))));
    }
}

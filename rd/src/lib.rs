//! rfpdraft - conversational RFP drafting assistant
//!
//! Collects project information through dialogue, enriches it with retrieved
//! precedent passages, and runs a five-stage decomposition pipeline - purpose
//! analysis, scope definition, case study, evaluation criteria, task
//! creation - where every stage is a single schema-constrained model call
//! consuming the full outputs of the stages before it. The final trace is
//! composed into a structured RFP outline.
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait and OpenAI/Anthropic implementations
//! - [`schema`] - the structured records each stage produces
//! - [`pipeline`] - the five stage chains and their sequencer
//! - [`prompts`] - Handlebars prompt templates with override chain
//! - [`retrieval`] - retriever trait and corpus-backed context enrichment
//! - [`session`] - interactive interview that refines a project brief
//! - [`outline`] - outline composition and markdown rendering
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod llm;
pub mod outline;
pub mod pipeline;
pub mod prompts;
pub mod retrieval;
pub mod schema;
pub mod session;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient};
pub use outline::{OutlineSection, OutlineStatus, RfpOutline};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineRun, StageError};
pub use prompts::PromptLoader;
pub use retrieval::{CorpusRetriever, DoubleRetriever, Passage, Retriever};
pub use schema::{CaseStudy, EvaluationCriteria, Priority, PurposeAnalysis, ScopeDefinition, TaskSet, TaskSpec};
pub use session::{InterviewSession, ProjectBrief, SessionConfig, SessionState};

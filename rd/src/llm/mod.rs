//! LLM client module
//!
//! Provides the provider-agnostic completion types, the client trait and
//! the OpenAI/Anthropic implementations.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod openai;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
#[allow(unused_imports)]
pub use types::Role;
pub use types::{CompletionRequest, CompletionResponse, Message, StopReason, TokenUsage, ToolCall, ToolDefinition};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Supports "openai" and "anthropic" providers.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIClient::from_config(config)?)),
        "anthropic" => Ok(Arc::new(AnthropicClient::from_config(config)?)),
        other => Err(LlmError::InvalidResponse(format!(
            "Unknown LLM provider: '{}'. Supported: openai, anthropic",
            other
        ))),
    }
}

/// Generate a short title for an outline from its request text
///
/// Returns a 3-6 word title like "Medical Information System Security Uplift".
/// Falls back to None when the model call fails; callers should derive a
/// title from the request instead.
pub async fn name_outline(llm: &Arc<dyn LlmClient>, text: &str) -> Option<String> {
    debug!(text_len = text.len(), "name_outline: called");

    let system_prompt = "Generate a 3-6 word document title for this project request. \
                         Output ONLY the title, nothing else. \
                         Answer in the same language as the request.";

    let request = CompletionRequest {
        system_prompt: system_prompt.to_string(),
        messages: vec![Message::user(text.to_string())],
        max_tokens: 50,
        tools: vec![],
    };

    match llm.complete(request).await {
        Ok(response) => {
            let title = response
                .content
                .map(|t| t.trim().trim_matches('"').to_string())
                .filter(|t| !t.is_empty());
            debug!(?title, "name_outline: generated");
            title
        }
        Err(e) => {
            debug!(error = %e, "name_outline: LLM call failed");
            None
        }
    }
}

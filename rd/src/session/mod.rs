//! Interview session - multi-turn collection of project information
//!
//! The session runs a conversation with the user to refine a vague project
//! idea into a concrete brief. The model maintains the brief through two
//! tools (`update_brief`, `finalize_brief`); once finalized, the brief
//! yields the request and context handed to the drafting pipeline.

use std::io::{self, BufRead, Write as IoWrite};
use std::sync::Arc;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, Message, ToolDefinition};

/// Configuration for an interview session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum conversation turns before forcing completion
    pub max_turns: usize,

    /// System prompt for the interviewer
    pub system_prompt: String,

    /// Max tokens per conversational reply
    pub max_tokens: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: 20,
            system_prompt: DEFAULT_INTERVIEW_PROMPT.to_string(),
            max_tokens: 2048,
        }
    }
}

/// State of the interview session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Gathering project information via conversation
    Interviewing,
    /// Brief has been finalized
    BriefFinalized,
    /// Session was cancelled by user
    Cancelled,
    /// Session hit max turns without completing
    MaxTurnsReached,
}

/// Project brief being refined during conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectBrief {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub goals: Vec<String>,
    pub constraints: Vec<String>,
    pub background: Option<String>,
}

impl ProjectBrief {
    /// Check if the brief has the minimum required fields
    pub fn is_complete(&self) -> bool {
        self.title.is_some() && !self.goals.is_empty()
    }

    /// Merge an update into this brief; present fields win
    pub fn merge(&mut self, update: ProjectBrief) {
        if update.title.is_some() {
            self.title = update.title;
        }
        if update.summary.is_some() {
            self.summary = update.summary;
        }
        if !update.goals.is_empty() {
            self.goals = update.goals;
        }
        if !update.constraints.is_empty() {
            self.constraints = update.constraints;
        }
        if update.background.is_some() {
            self.background = update.background;
        }
    }

    /// Render the brief as the pipeline request text
    pub fn request_text(&self) -> String {
        let mut out = String::new();
        if let Some(title) = &self.title {
            out.push_str(title);
            out.push('\n');
        }
        if let Some(summary) = &self.summary {
            out.push_str(summary);
            out.push('\n');
        }
        if !self.goals.is_empty() {
            out.push_str("목표:\n");
            for goal in &self.goals {
                out.push_str(&format!("- {goal}\n"));
            }
        }
        out.trim_end().to_string()
    }

    /// Render the brief's supporting detail as the pipeline context text
    pub fn context_text(&self) -> String {
        let mut out = String::new();
        if !self.constraints.is_empty() {
            out.push_str("제약사항:\n");
            for constraint in &self.constraints {
                out.push_str(&format!("- {constraint}\n"));
            }
        }
        if let Some(background) = &self.background {
            out.push_str(background);
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}

/// Parsed response from one interview turn
#[derive(Debug, Clone)]
struct InterviewResponse {
    /// Text content to show the user
    content: String,
    /// Whether the model considers the brief complete
    brief_complete: bool,
    /// Updated brief if provided
    brief_update: Option<ProjectBrief>,
}

/// Orchestrates the multi-turn interview
pub struct InterviewSession {
    llm: Arc<dyn LlmClient>,
    conversation: Vec<Message>,
    session_state: SessionState,
    brief: ProjectBrief,
    config: SessionConfig,
    turn_count: usize,
}

impl InterviewSession {
    /// Create a new session
    pub fn new(llm: Arc<dyn LlmClient>, config: SessionConfig) -> Self {
        Self {
            llm,
            conversation: Vec::new(),
            session_state: SessionState::Interviewing,
            brief: ProjectBrief::default(),
            config,
            turn_count: 0,
        }
    }

    /// Run the interactive session (reads from stdin, writes to stdout)
    ///
    /// Returns the finalized brief, or None if the session was cancelled.
    pub async fn run_interactive(&mut self, initial_request: &str) -> Result<Option<ProjectBrief>> {
        info!("starting interview session");

        self.conversation.push(Message::user(initial_request));

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            if self.turn_count >= self.config.max_turns {
                self.session_state = SessionState::MaxTurnsReached;
                warn!(max_turns = self.config.max_turns, "max turns reached");
                return Ok(self.force_finalize());
            }

            let response = self.get_llm_response().await?;
            self.turn_count += 1;

            println!("\n{}\n", response.content);

            if let Some(update) = response.brief_update {
                self.brief.merge(update);
            }

            if response.brief_complete {
                self.session_state = SessionState::BriefFinalized;
                info!("brief finalized");
                return Ok(Some(self.brief.clone()));
            }

            print!("> ");
            stdout.flush()?;

            let input = match stdin.lock().lines().next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Err(e.into()),
                None => {
                    self.session_state = SessionState::Cancelled;
                    println!("\nSession cancelled.");
                    return Ok(None);
                }
            };

            let input = input.trim();

            match input.to_lowercase().as_str() {
                "quit" | "exit" | "/quit" | "/exit" | "q" => {
                    self.session_state = SessionState::Cancelled;
                    println!("Session cancelled.");
                    return Ok(None);
                }
                "/done" | "/finalize" => {
                    if self.brief.is_complete() {
                        self.session_state = SessionState::BriefFinalized;
                        return Ok(Some(self.brief.clone()));
                    }
                    println!("Brief is incomplete - a title and at least one goal are needed.");
                    continue;
                }
                "/brief" => {
                    self.show_brief();
                    continue;
                }
                "/help" => {
                    self.show_help();
                    continue;
                }
                "" => continue,
                _ => {}
            }

            self.conversation.push(Message::user(input));
        }
    }

    /// Get one conversational turn from the model
    async fn get_llm_response(&mut self) -> Result<InterviewResponse> {
        let request = CompletionRequest {
            system_prompt: self.build_system_prompt(),
            messages: self.conversation.clone(),
            tools: self.build_tools(),
            max_tokens: self.config.max_tokens,
        };

        let response = self.llm.complete(request).await.context("Failed to get LLM response")?;

        self.parse_response(response)
    }

    /// Build the system prompt with the current brief injected
    fn build_system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if self.brief.title.is_some() || !self.brief.goals.is_empty() {
            prompt.push_str("\n\n## Current Brief\n");
            if let Some(title) = &self.brief.title {
                prompt.push_str(&format!("Title: {title}\n"));
            }
            if let Some(summary) = &self.brief.summary {
                prompt.push_str(&format!("Summary: {summary}\n"));
            }
            if !self.brief.goals.is_empty() {
                prompt.push_str("Goals:\n");
                for goal in &self.brief.goals {
                    prompt.push_str(&format!("- {goal}\n"));
                }
            }
            if !self.brief.constraints.is_empty() {
                prompt.push_str("Constraints:\n");
                for constraint in &self.brief.constraints {
                    prompt.push_str(&format!("- {constraint}\n"));
                }
            }
        }

        prompt
    }

    /// Tools available to the interviewer
    fn build_tools(&self) -> Vec<ToolDefinition> {
        let brief_schema = serde_json::json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Short title for the project"
                },
                "summary": {
                    "type": "string",
                    "description": "One-paragraph summary of what is being procured"
                },
                "goals": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Outcomes the project should achieve"
                },
                "constraints": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Budget, timeline or regulatory constraints"
                },
                "background": {
                    "type": "string",
                    "description": "Organizational background and context"
                }
            }
        });

        vec![
            ToolDefinition::new(
                "update_brief",
                "Update the project brief with information gathered from the conversation. \
                 Call this as you learn new facts.",
                brief_schema.clone(),
            ),
            ToolDefinition::new(
                "finalize_brief",
                "Call this when the brief has a title, clear goals and key constraints, \
                 and the user has agreed it is complete.",
                serde_json::json!({
                    "type": "object",
                    "properties": brief_schema["properties"],
                    "required": ["title", "goals"]
                }),
            ),
        ]
    }

    /// Parse the model response into content plus brief updates
    fn parse_response(&mut self, response: CompletionResponse) -> Result<InterviewResponse> {
        let mut content = response.content.unwrap_or_default();
        let mut brief_complete = false;
        let mut brief_update: Option<ProjectBrief> = None;

        for tool_call in &response.tool_calls {
            match tool_call.name.as_str() {
                "update_brief" => {
                    let update: ProjectBrief = serde_json::from_value(tool_call.input.clone())
                        .context("Invalid update_brief payload")?;
                    brief_update = Some(update);
                }
                "finalize_brief" => {
                    let update: ProjectBrief = serde_json::from_value(tool_call.input.clone())
                        .context("Invalid finalize_brief payload")?;
                    brief_update = Some(update);
                    brief_complete = true;
                }
                other => {
                    debug!(tool = other, "ignoring unknown tool call");
                }
            }
        }

        if content.is_empty() && brief_update.is_some() {
            content = if brief_complete {
                "I have enough information - finalizing the brief.".to_string()
            } else {
                "I've updated the brief with that information.".to_string()
            };
        }

        self.conversation.push(Message::assistant(&content));

        Ok(InterviewResponse {
            content,
            brief_complete,
            brief_update,
        })
    }

    /// Finalize with whatever is in the brief when max turns is hit
    fn force_finalize(&mut self) -> Option<ProjectBrief> {
        if self.brief.is_complete() {
            warn!("force-finalizing brief after max turns");
            return Some(self.brief.clone());
        }

        println!("\nMax conversation turns reached without completing the brief.");
        println!("Please restart with a more specific project description.");
        None
    }

    fn show_brief(&self) {
        println!("\n--- Current Brief ---");
        match &self.brief.title {
            Some(title) => println!("Title: {title}"),
            None => println!("Title: (not set)"),
        }
        if let Some(summary) = &self.brief.summary {
            println!("Summary: {summary}");
        }
        if self.brief.goals.is_empty() {
            println!("Goals: (none)");
        } else {
            println!("Goals:");
            for goal in &self.brief.goals {
                println!("  - {goal}");
            }
        }
        if !self.brief.constraints.is_empty() {
            println!("Constraints:");
            for constraint in &self.brief.constraints {
                println!("  - {constraint}");
            }
        }
        println!("---------------------\n");
    }

    fn show_help(&self) {
        println!("\n--- Interview Commands ---");
        println!("  /brief    - Show current brief");
        println!("  /done     - Finalize with current brief");
        println!("  /help     - Show this help");
        println!("  quit      - Cancel session");
        println!("--------------------------\n");
    }

    /// Current session state
    pub fn state(&self) -> &SessionState {
        &self.session_state
    }

    /// Current brief
    pub fn brief(&self) -> &ProjectBrief {
        &self.brief
    }
}

/// Default system prompt for interview sessions
const DEFAULT_INTERVIEW_PROMPT: &str = r#"You are an intake assistant helping refine a project idea into a brief for an RFP (Request for Proposal).

Your job is to:
1. Understand what the user wants to procure or build
2. Ask clarifying questions to fill in gaps (purpose, scope, constraints, timeline, budget)
3. Build a clear, complete project brief

Guidelines:
- Ask ONE focused question at a time
- Don't ask about things the user has already explained
- Answer in the same language the user writes in
- Use the update_brief tool as you gather information
- Use the finalize_brief tool when the brief has a title, clear goals and key constraints

Keep responses concise and focused. Avoid lengthy explanations.

When you call finalize_brief, the conversation ends and drafting begins.
"#;

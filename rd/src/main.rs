//! rfpdraft CLI entry point

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use tracing::info;

use memstore::{Interaction, LongTermMemory, PatternRecord, ShortTermMemory, WorkingMemory};
use rfpdraft::cli::{Cli, Command, OutputFormat};
use rfpdraft::config::{Config, RetrievalConfig};
use rfpdraft::llm::{LlmClient, create_client, name_outline};
use rfpdraft::outline;
use rfpdraft::pipeline::Pipeline;
use rfpdraft::prompts::PromptLoader;
use rfpdraft::retrieval::{CorpusRetriever, DoubleRetriever, Retriever, build_context};
use rfpdraft::session::{InterviewSession, SessionConfig};

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rfpdraft")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("rfpdraft.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "rfpdraft loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );

    match cli.command {
        Command::Draft {
            request,
            context,
            title,
            format,
            output_dir,
        } => cmd_draft(&config, &request, context.as_deref(), title, format, output_dir).await,
        Command::Interview { initial } => cmd_interview(&config, initial.as_deref()).await,
        Command::Retrieve { query, top_k } => cmd_retrieve(&config, &query, top_k).await,
    }
}

/// Build a retriever from the configured corpora, if any
fn build_retriever(config: &RetrievalConfig) -> Result<Option<Box<dyn Retriever>>> {
    match (&config.case_corpus, &config.criteria_corpus) {
        (Some(cases), Some(criteria)) => Ok(Some(Box::new(DoubleRetriever::new(
            CorpusRetriever::open(cases)?,
            CorpusRetriever::open(criteria)?,
        )))),
        (Some(path), None) | (None, Some(path)) => Ok(Some(Box::new(CorpusRetriever::open(path)?))),
        (None, None) => Ok(None),
    }
}

/// Run one draft: enrich context, run the pipeline, compose and persist
async fn run_draft(
    config: &Config,
    llm: Arc<dyn LlmClient>,
    request: &str,
    conversation: &str,
    title: Option<String>,
    format: OutputFormat,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    // Enrich the context with retrieved reference passages
    let passages = match build_retriever(&config.retrieval)? {
        Some(retriever) => retriever.retrieve(request, config.retrieval.top_k).await?,
        None => Vec::new(),
    };
    let context = build_context(conversation, &passages);

    let pipeline = Pipeline::new(llm.clone(), PromptLoader::new("."), (&config.pipeline).into());

    let mut working = WorkingMemory::new();
    working.begin("draft", request)?;

    let run = match pipeline.run(request, &context).await {
        Ok(run) => {
            working.complete()?;
            run
        }
        Err(e) => {
            working.fail(e.to_string())?;
            return Err(e.into());
        }
    };

    let title = match title {
        Some(title) => title,
        None => name_outline(&llm, request)
            .await
            .unwrap_or_else(|| request.chars().take(60).collect()),
    };

    let outline = outline::compose(&title, &run);
    let dir = output_dir.unwrap_or_else(|| config.outline.output_dir.clone());
    let path = outline.write_to(&dir)?;

    // Record the run in memory
    let recent_path = config.memory.dir.join("recent.json");
    let mut recent = ShortTermMemory::load(&recent_path, config.memory.max_history)?;
    recent.prune_expired();
    recent.add(Interaction::new(request, &run.purpose.core_purpose));
    recent.save(&recent_path)?;

    let mut patterns = LongTermMemory::open(&config.memory.dir)?;
    patterns.save_pattern(&PatternRecord {
        key: run.run_id.clone(),
        request: request.to_string(),
        core_purpose: run.purpose.core_purpose.clone(),
        task_ids: run.tasks.iter().map(|t| t.task_id.clone()).collect(),
        outline_file: Some(path.display().to_string()),
        created_at: chrono::Utc::now(),
    })?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        OutputFormat::Text => {
            println!("{} {}", "✓".green(), title.bold());
            println!("  Purpose:  {}", run.purpose.core_purpose);
            println!("  Sections: {}", outline.sections.len());
            println!("  Tasks:    {}", run.tasks.len());
            for warning in &run.warnings {
                println!("  {} {}", "warning:".yellow(), warning);
            }
            if !run.purpose.missing_info.is_empty() {
                println!("  {} {}", "open:".yellow(), run.purpose.missing_info.join(", "));
            }
            println!(
                "  Usage:    {} in / {} out (~${:.4})",
                run.usage.input_tokens,
                run.usage.output_tokens,
                run.usage.cost_usd(&config.llm.model)
            );
            println!("  Outline:  {}", path.display().to_string().cyan());
        }
    }

    Ok(())
}

/// One-shot draft from a request string
async fn cmd_draft(
    config: &Config,
    request: &str,
    context: Option<&str>,
    title: Option<String>,
    format: OutputFormat,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    config.validate()?;
    let llm = create_client(&config.llm)?;

    run_draft(
        config,
        llm,
        request,
        context.unwrap_or_default(),
        title,
        format,
        output_dir,
    )
    .await
}

/// Interactive interview followed by a draft
async fn cmd_interview(config: &Config, initial: Option<&str>) -> Result<()> {
    config.validate()?;
    let llm = create_client(&config.llm)?;

    // Seed the opening message with recent conversational context
    let recent_path = config.memory.dir.join("recent.json");
    let recent = ShortTermMemory::load(&recent_path, config.memory.max_history)?;

    let initial = match initial {
        Some(text) => text.to_string(),
        None => {
            println!("Describe the project you need an RFP for:");
            print!("> ");
            use std::io::{BufRead, Write};
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim().to_string()
        }
    };

    if initial.is_empty() {
        bail!("No project description given");
    }

    let mut session = InterviewSession::new(llm.clone(), SessionConfig::default());
    let Some(brief) = session.run_interactive(&initial).await? else {
        return Ok(());
    };

    let request = brief.request_text();
    let mut conversation = brief.context_text();
    let history = recent.context_text();
    if !history.is_empty() {
        conversation = format!("{history}\n\n{conversation}");
    }

    run_draft(
        config,
        llm,
        &request,
        &conversation,
        brief.title.clone(),
        OutputFormat::Text,
        None,
    )
    .await
}

/// Query the reference corpora directly
async fn cmd_retrieve(config: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    let Some(retriever) = build_retriever(&config.retrieval)? else {
        bail!("No reference corpus configured. Set retrieval.case-corpus or retrieval.criteria-corpus.");
    };

    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let passages = retriever.retrieve(query, top_k).await?;

    if passages.is_empty() {
        println!("No matching passages");
    } else {
        for passage in passages {
            println!(
                "{} {} {}",
                format!("{:.2}", passage.score).dimmed(),
                passage.source.yellow(),
                passage.text
            );
        }
    }

    Ok(())
}

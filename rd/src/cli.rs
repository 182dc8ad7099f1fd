//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rfpdraft - conversational RFP drafting assistant
#[derive(Parser)]
#[command(
    name = "rfp",
    about = "Drafts structured RFP outlines through a staged decomposition pipeline",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/rfpdraft/logs/rfpdraft.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Draft an RFP outline from a one-shot request
    Draft {
        /// The project request text
        request: String,

        /// Additional free-text context
        #[arg(short = 'x', long)]
        context: Option<String>,

        /// Outline title (generated from the request when omitted)
        #[arg(short, long)]
        title: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Directory outline files are written to (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Interview the user to build a brief, then draft from it
    Interview {
        /// Opening description of the project
        initial: Option<String>,
    },

    /// Query the reference corpora without running the pipeline
    Retrieve {
        /// Query text
        query: String,

        /// Passages per corpus
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
}

/// Output format for the draft command
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

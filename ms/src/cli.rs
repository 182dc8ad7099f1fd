//! CLI argument parsing for memstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ms")]
#[command(author, version, about = "Memory stores for the RFP drafting agent", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the memory directory
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show aggregate pattern statistics
    Stats,

    /// Search stored patterns (regex, case-insensitive)
    Search {
        /// Search pattern
        #[arg(required = true)]
        pattern: String,

        /// Maximum results to return
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show the recent interaction log
    Recent,

    /// Delete all stored patterns and the interaction log
    Clear,
}

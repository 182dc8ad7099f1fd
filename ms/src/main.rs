use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::info;

use memstore::cli::{Cli, Command};
use memstore::config::Config;
use memstore::{LongTermMemory, ShortTermMemory};

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.dir {
        config.store_dir = dir;
    }

    info!(dir = %config.store_dir.display(), "memstore starting");

    match cli.command {
        Command::Stats => {
            let mem = LongTermMemory::open(&config.store_dir)?;
            let stats = mem.stats()?;
            println!("Patterns saved: {}", stats.total_patterns.to_string().cyan());
            if let Some(updated) = stats.last_updated {
                println!("Last updated:   {}", updated.to_rfc3339());
            }
            for (key, count) in &stats.pattern_counts {
                println!("  {} {}", key.yellow(), count.to_string().dimmed());
            }
        }
        Command::Search { pattern, limit } => {
            let mem = LongTermMemory::open(&config.store_dir)?;
            let hits = mem.search_patterns(&pattern, limit)?;
            if hits.is_empty() {
                println!("No matching patterns");
            } else {
                for record in hits {
                    println!(
                        "{} {} ({} tasks)",
                        record.key.yellow(),
                        record.core_purpose,
                        record.task_ids.len().to_string().dimmed()
                    );
                }
            }
        }
        Command::Recent => {
            let path = config.store_dir.join("recent.json");
            let mem = ShortTermMemory::load(&path, config.history_capacity)?;
            if mem.is_empty() {
                println!("No recent interactions");
            } else {
                for interaction in mem.recent() {
                    println!(
                        "{} {}",
                        interaction.timestamp.to_rfc3339().dimmed(),
                        interaction.request
                    );
                    println!("  {}", interaction.reply);
                }
            }
        }
        Command::Clear => {
            let mut mem = LongTermMemory::open(&config.store_dir)?;
            mem.clear()?;
            let recent = config.store_dir.join("recent.json");
            if recent.exists() {
                std::fs::remove_file(&recent)?;
            }
            println!("{} Memory cleared", "✓".green());
        }
    }

    Ok(())
}

//! Redyce CLI - Command-line interface for requirement extraction.

use anyhow::Context;
use clap::Parser;
use redyce_cli::commands::{self, Extractor};
use redyce_cli::{Cli, Command, Config, Formatter};
use redyce_llm::OllamaProvider;
use redyce_scheduler::PriorityManager;
use redyce_store::SqliteStore;
use redyce_text::DocumentTextExtractor;
use std::fs;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing (log to stderr, stdout carries command output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }
    let store = SqliteStore::new(&config.database.path).with_context(|| {
        format!("Failed to open database {}", config.database.path.display())
    })?;

    let llm = OllamaProvider::from_config(&config.llm)?;
    let extractor = Arc::new(Extractor::new(
        llm,
        DocumentTextExtractor::new(),
        store,
        config.extractor.clone(),
    ));

    // Handle commands
    match cli.command {
        Command::Import(args) => {
            commands::execute_import(args, extractor.store(), &formatter)?;
        }
        Command::Enqueue(args) => {
            commands::execute_enqueue(args, &extractor, &formatter)?;
        }
        Command::Retry(args) => {
            commands::execute_retry(args, &extractor, &formatter)?;
        }
        Command::Extract(args) => {
            commands::execute_extract(args, &extractor, &formatter).await?;
        }
        Command::Backfill(args) => {
            commands::execute_backfill(args, &extractor, &config.backfill, &formatter).await?;
        }
        Command::Status(args) => {
            commands::execute_status(args, extractor.store(), &formatter)?;
        }
        Command::Requirements(args) => {
            commands::execute_requirements(args, extractor.store(), &formatter)?;
        }
        Command::Run(args) => {
            let manager = open_manager(&config)?;
            commands::execute_run(args, &extractor, &manager, &formatter).await?;
        }
        Command::Jobs(args) => {
            let manager = open_manager(&config)?;
            commands::execute_jobs(args, &manager, &formatter)?;
        }
    }

    Ok(())
}

/// Priority manager backed by the job ledger in the same database
fn open_manager(config: &Config) -> anyhow::Result<Arc<PriorityManager<SqliteStore>>> {
    let ledger = SqliteStore::new(&config.database.path)?;
    let manager = PriorityManager::with_ledger(config.scheduler.clone(), ledger)
        .context("Failed to restore jobs")?;
    Ok(Arc::new(manager))
}

//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Redyce CLI - Extract requirements from tender documents.
#[derive(Debug, Parser)]
#[command(name = "redyce")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "REDYCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a document into a project
    Import(ImportArgs),

    /// Queue a document for requirement extraction
    Enqueue(DocumentArgs),

    /// Put a failed document back in the queue
    Retry(DocumentArgs),

    /// Extract requirements from one document now
    Extract(ExtractArgs),

    /// Extract requirements from every pending document
    Backfill(BackfillArgs),

    /// Run extraction over a project as a background job
    Run(RunArgs),

    /// List coordinated jobs
    Jobs(JobsArgs),

    /// Show document extraction statuses
    Status(StatusArgs),

    /// List the requirements extracted from a document
    Requirements(DocumentArgs),
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// Project the document belongs to
    pub project: String,

    /// File to import
    pub file: PathBuf,

    /// Document type (RC, CCTP, CCAP, DPGF, AE)
    #[arg(short = 't', long)]
    pub doc_type: Option<String>,

    /// Document id (defaults to <project>/<file name>)
    #[arg(long)]
    pub id: Option<String>,

    /// Override the MIME type guessed from the extension
    #[arg(long)]
    pub mime: Option<String>,
}

/// Arguments naming a single document.
#[derive(Debug, Parser)]
pub struct DocumentArgs {
    /// Document id
    pub document: String,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Document id
    pub document: String,

    /// User the usage is attributed to
    #[arg(short, long, default_value = "system")]
    pub user: String,
}

/// Arguments for the backfill command.
#[derive(Debug, Parser)]
pub struct BackfillArgs {
    /// Restrict to one project
    #[arg(short, long)]
    pub project: Option<String>,

    /// Also retry documents that failed
    #[arg(long)]
    pub include_failed: bool,

    /// Documents extracted concurrently (overrides config)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Project to process
    pub project: String,

    /// User the usage is attributed to
    #[arg(short, long, default_value = "system")]
    pub user: String,
}

/// Arguments for the jobs command.
#[derive(Debug, Parser)]
pub struct JobsArgs {
    /// Restrict to one project
    #[arg(short, long)]
    pub project: Option<String>,

    /// Evict finished jobs older than the retention period
    #[arg(long)]
    pub cleanup: bool,
}

/// Arguments for the status command.
#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Restrict to one project
    #[arg(short, long)]
    pub project: Option<String>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

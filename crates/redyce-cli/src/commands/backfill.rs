//! Backfill command implementation.

use super::Extractor;
use crate::cli::BackfillArgs;
use crate::error::Result;
use crate::output::Formatter;
use redyce_domain::traits::CompletionClient;
use redyce_domain::ProjectId;
use redyce_extractor::{
    BackfillConfig, BackfillOrchestrator, BackfillReport, BackfillScope, ExtractionOutcome,
};
use std::fmt::Display;
use std::sync::Arc;
use tracing::info;

/// Execute the backfill command.
///
/// The process would drop the background batches on exit, so the command
/// waits for all of them before printing the report.
pub async fn execute_backfill<L>(
    args: BackfillArgs,
    extractor: &Arc<Extractor<L>>,
    config: &BackfillConfig,
    formatter: &Formatter,
) -> Result<()>
where
    L: CompletionClient + Send + Sync + 'static,
    L::Error: Display,
{
    let (first_batch, report) = run_backfill(args, extractor, config).await?;
    println!("{}", formatter.format_backfill(&first_batch, &report)?);
    Ok(())
}

async fn run_backfill<L>(
    args: BackfillArgs,
    extractor: &Arc<Extractor<L>>,
    config: &BackfillConfig,
) -> Result<(Vec<ExtractionOutcome>, BackfillReport)>
where
    L: CompletionClient + Send + Sync + 'static,
    L::Error: Display,
{
    let mut config = config.clone();
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }

    let scope = match args.project {
        Some(project) => BackfillScope::Project(ProjectId::new(project)),
        None => BackfillScope::All,
    };

    let orchestrator = BackfillOrchestrator::new(Arc::clone(extractor), config);
    let mut handle = orchestrator.run(&scope, args.include_failed).await?;
    let first_batch = std::mem::take(&mut handle.first_batch);

    if !handle.is_finished() {
        let progress = handle.progress();
        info!(
            processed = progress.processed,
            remaining = progress.remaining(),
            "First batch done, waiting for background batches"
        );
    }

    let report = handle.wait().await;
    Ok((first_batch, report))
}

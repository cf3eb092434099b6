//! Batch extraction over every pending document

use crate::config::BackfillConfig;
use crate::error::ExtractorError;
use crate::extractor::RequirementExtractor;
use crate::types::{BackfillReport, ExtractionOutcome};
use redyce_domain::traits::{CompletionClient, ExtractionStore, TextExtractor};
use redyce_domain::{DocumentId, ProjectId, UserId};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Which documents a backfill covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillScope {
    /// Documents of one project
    Project(ProjectId),
    /// Every document
    All,
}

impl BackfillScope {
    fn project(&self) -> Option<&ProjectId> {
        match self {
            BackfillScope::Project(project_id) => Some(project_id),
            BackfillScope::All => None,
        }
    }
}

/// Handle on a running backfill
///
/// The first batch has already run when the handle is returned; later
/// batches run in a background task whose progress can be polled or awaited.
#[derive(Debug)]
pub struct BackfillHandle {
    /// Outcomes of the first batch, in queue order
    pub first_batch: Vec<ExtractionOutcome>,
    report: Arc<Mutex<BackfillReport>>,
    task: Option<JoinHandle<()>>,
}

impl BackfillHandle {
    /// Snapshot of the running totals
    pub fn progress(&self) -> BackfillReport {
        self.report.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether every batch has run
    pub fn is_finished(&self) -> bool {
        self.progress().finished
    }

    /// Wait for the background batches and return the final totals
    pub async fn wait(self) -> BackfillReport {
        if let Some(task) = self.task {
            if let Err(e) = task.await {
                error!(error = %e, "Backfill task failed");
            }
        }
        self.report.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Runs extraction over pending documents with bounded concurrency
///
/// Documents are split into batches of `concurrency`. Documents within a
/// batch run concurrently, batches run one after the other.
pub struct BackfillOrchestrator<L, T, S>
where
    L: CompletionClient,
    T: TextExtractor,
    S: ExtractionStore,
{
    extractor: Arc<RequirementExtractor<L, T, S>>,
    config: BackfillConfig,
}

impl<L, T, S> BackfillOrchestrator<L, T, S>
where
    L: CompletionClient + Send + Sync + 'static,
    T: TextExtractor + Send + Sync + 'static,
    S: ExtractionStore + Send + 'static,
    L::Error: Display,
    T::Error: Display,
    S::Error: Display,
{
    /// Create an orchestrator over a shared extractor
    pub fn new(extractor: Arc<RequirementExtractor<L, T, S>>, config: BackfillConfig) -> Self {
        Self { extractor, config }
    }

    /// Get the configuration
    pub fn config(&self) -> &BackfillConfig {
        &self.config
    }

    /// Start a backfill
    ///
    /// Selects never-processed and WAITING documents (plus ERROR ones when
    /// `include_failed`), marks them WAITING, runs the first batch to
    /// completion and hands the rest to a background task.
    pub async fn run(
        &self,
        scope: &BackfillScope,
        include_failed: bool,
    ) -> Result<BackfillHandle, ExtractorError> {
        self.config.validate()?;

        let candidates = self
            .extractor
            .with_store(|s| s.find_extraction_candidates(scope.project(), include_failed))?;

        let mut queued = Vec::with_capacity(candidates.len());
        for document_id in candidates {
            match self.extractor.enqueue_document(&document_id) {
                Ok(true) => queued.push(document_id),
                Ok(false) => debug!(document_id = %document_id, "Skipping document no longer pending"),
                Err(e) => warn!(document_id = %document_id, error = %e, "Failed to enqueue document"),
            }
        }

        let report = Arc::new(Mutex::new(BackfillReport {
            total: queued.len(),
            ..BackfillReport::default()
        }));

        info!(
            ?scope,
            include_failed,
            documents = queued.len(),
            concurrency = self.config.concurrency,
            "Starting backfill"
        );

        let user_id = UserId::new(self.config.user_id.as_str());
        let mut batches = queued
            .chunks(self.config.concurrency)
            .map(<[DocumentId]>::to_vec)
            .collect::<Vec<_>>()
            .into_iter();

        let first_batch = match batches.next() {
            Some(batch) => run_batch(&self.extractor, batch, &user_id).await,
            None => Vec::new(),
        };
        record_all(&report, &first_batch);

        let remaining: Vec<Vec<DocumentId>> = batches.collect();
        if remaining.is_empty() {
            finish(&report);
            return Ok(BackfillHandle {
                first_batch,
                report,
                task: None,
            });
        }

        let extractor = Arc::clone(&self.extractor);
        let shared = Arc::clone(&report);
        let delay = self.config.batch_delay();
        let task = tokio::spawn(async move {
            let count = remaining.len();
            for (index, batch) in remaining.into_iter().enumerate() {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                debug!(batch = index + 2, size = batch.len(), "Running backfill batch");
                let outcomes = run_batch(&extractor, batch, &user_id).await;
                record_all(&shared, &outcomes);
            }
            finish(&shared);
            debug!(batches = count, "Background backfill batches done");
        });

        Ok(BackfillHandle {
            first_batch,
            report,
            task: Some(task),
        })
    }
}

/// Run one batch concurrently; outcomes come back in batch order
async fn run_batch<L, T, S>(
    extractor: &Arc<RequirementExtractor<L, T, S>>,
    batch: Vec<DocumentId>,
    user_id: &UserId,
) -> Vec<ExtractionOutcome>
where
    L: CompletionClient + Send + Sync + 'static,
    T: TextExtractor + Send + Sync + 'static,
    S: ExtractionStore + Send + 'static,
    L::Error: Display,
    T::Error: Display,
    S::Error: Display,
{
    let mut set = JoinSet::new();
    let mut tasks = HashMap::with_capacity(batch.len());

    for (position, document_id) in batch.into_iter().enumerate() {
        let extractor = Arc::clone(extractor);
        let user_id = user_id.clone();
        let id = document_id.clone();
        let handle = set.spawn(async move { extractor.extract_for_document(&id, &user_id).await });
        tasks.insert(handle.id(), (position, document_id));
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((task_id, outcome)) => {
                if let Some((position, _)) = tasks.remove(&task_id) {
                    outcomes.push((position, outcome));
                }
            }
            Err(e) => {
                let Some((position, document_id)) = tasks.remove(&e.id()) else {
                    error!(error = %e, "Unknown extraction task failed");
                    continue;
                };
                let message = format!("extraction task failed: {}", e);
                error!(document_id = %document_id, error = %e, "Extraction task failed");
                extractor.record_failure(&document_id, &message);
                outcomes.push((position, ExtractionOutcome::failed(document_id, message)));
            }
        }
    }

    outcomes.sort_by_key(|(position, _)| *position);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

fn record_all(report: &Mutex<BackfillReport>, outcomes: &[ExtractionOutcome]) {
    let mut report = report.lock().unwrap_or_else(|e| e.into_inner());
    for outcome in outcomes {
        if let Some(error) = &outcome.error {
            warn!(document_id = %outcome.document_id, %error, "Backfill document failed");
        }
        report.record(outcome);
    }
}

fn finish(report: &Mutex<BackfillReport>) {
    let mut report = report.lock().unwrap_or_else(|e| e.into_inner());
    report.finished = true;
    info!(
        processed = report.processed,
        succeeded = report.succeeded,
        failed = report.failed,
        created = report.requirements_created,
        skipped = report.requirements_skipped,
        "Backfill finished"
    );
}

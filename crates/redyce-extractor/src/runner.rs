//! Project extraction under the priority manager
//!
//! A project run is a LOW priority job over the project's pending documents.
//! The runner checks the job status before every document, so an interactive
//! job preempting the project stops the run at the next document boundary
//! and the cursor is kept for [`ProjectRunner::resume`].

use crate::error::ExtractorError;
use crate::extractor::RequirementExtractor;
use crate::types::ExtractionOutcome;
use redyce_domain::traits::{CompletionClient, ExtractionStore, JobLedger, TextExtractor};
use redyce_domain::{Job, JobId, JobStatus, JobType, ProjectId, UserId};
use redyce_scheduler::{NullLedger, PriorityManager, StartDecision};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{info, warn};

/// How a project run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerOutcome {
    /// Every document was processed
    Completed {
        /// The job
        job_id: JobId,
        /// Outcomes of the documents processed by this call
        outcomes: Vec<ExtractionOutcome>,
    },
    /// The job was paused (usually preempted); resume from `cursor`
    Paused {
        /// The job
        job_id: JobId,
        /// Index of the next document
        cursor: usize,
    },
    /// The job was cancelled
    Cancelled {
        /// The job
        job_id: JobId,
        /// Index of the next document
        cursor: usize,
    },
    /// Another job holds the project lock
    Waiting {
        /// The job
        job_id: JobId,
        /// Current lock holder
        holder: JobId,
    },
}

impl RunnerOutcome {
    /// The job this outcome is about
    pub fn job_id(&self) -> JobId {
        match self {
            RunnerOutcome::Completed { job_id, .. }
            | RunnerOutcome::Paused { job_id, .. }
            | RunnerOutcome::Cancelled { job_id, .. }
            | RunnerOutcome::Waiting { job_id, .. } => *job_id,
        }
    }
}

/// Runs requirement extraction over a project as a LOW priority job
pub struct ProjectRunner<L, T, S, J = NullLedger>
where
    L: CompletionClient,
    T: TextExtractor,
    S: ExtractionStore,
    J: JobLedger,
{
    extractor: Arc<RequirementExtractor<L, T, S>>,
    manager: Arc<PriorityManager<J>>,
    user_id: UserId,
}

impl<L, T, S, J> ProjectRunner<L, T, S, J>
where
    L: CompletionClient + Send + Sync + 'static,
    T: TextExtractor + Send + Sync + 'static,
    S: ExtractionStore + Send + 'static,
    J: JobLedger,
    L::Error: Display,
    T::Error: Display,
    S::Error: Display,
    J::Error: Display,
{
    /// Create a runner; usage is attributed to the `system` user
    pub fn new(
        extractor: Arc<RequirementExtractor<L, T, S>>,
        manager: Arc<PriorityManager<J>>,
    ) -> Self {
        Self {
            extractor,
            manager,
            user_id: UserId::new("system"),
        }
    }

    /// Attribute usage to another user
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = user_id;
        self
    }

    /// The priority manager
    pub fn manager(&self) -> &Arc<PriorityManager<J>> {
        &self.manager
    }

    /// Register a job over the project's pending documents and run it
    pub async fn start(&self, project_id: &ProjectId) -> Result<RunnerOutcome, ExtractorError> {
        let candidates = self
            .extractor
            .with_store(|s| s.find_extraction_candidates(Some(project_id), false))?;

        let mut documents = Vec::with_capacity(candidates.len());
        for document_id in candidates {
            if self.extractor.enqueue_document(&document_id)? {
                documents.push(document_id);
            }
        }

        let job_id = self.manager.register_job(
            project_id.clone(),
            JobType::RequirementExtraction,
            documents,
        );
        info!(%job_id, project_id = %project_id, "Project extraction job registered");
        self.drive(job_id).await
    }

    /// Continue a paused or pending job from its saved cursor
    pub async fn resume(&self, job_id: JobId) -> Result<RunnerOutcome, ExtractorError> {
        self.drive(job_id).await
    }

    async fn drive(&self, job_id: JobId) -> Result<RunnerOutcome, ExtractorError> {
        match self.manager.start_job(job_id) {
            StartDecision::Started | StartDecision::Preempted { .. } => {}
            StartDecision::MustWait { holder } => {
                info!(%job_id, %holder, "Project busy, job must wait");
                return Ok(RunnerOutcome::Waiting { job_id, holder });
            }
            StartDecision::Finished => {
                let job = self.job(job_id)?;
                return Ok(match job.status {
                    JobStatus::Cancelled => RunnerOutcome::Cancelled {
                        job_id,
                        cursor: job.current_document_index,
                    },
                    _ => RunnerOutcome::Completed {
                        job_id,
                        outcomes: Vec::new(),
                    },
                });
            }
            StartDecision::NotFound => {
                return Err(ExtractorError::NotFound(format!("job {}", job_id)));
            }
        }

        let job = self.job(job_id)?;
        let mut cursor = job.current_document_index;
        let mut outcomes = Vec::new();

        info!(
            %job_id,
            cursor,
            documents = job.document_ids.len(),
            "Running project extraction"
        );

        while let Some(document_id) = job.document_ids.get(cursor) {
            match self.job(job_id)?.status {
                JobStatus::Running => {}
                JobStatus::Cancelled => {
                    info!(%job_id, cursor, "Job cancelled, stopping");
                    return Ok(RunnerOutcome::Cancelled { job_id, cursor });
                }
                status => {
                    info!(%job_id, cursor, %status, "Job no longer running, stopping");
                    return Ok(RunnerOutcome::Paused { job_id, cursor });
                }
            }

            let outcome = self
                .extractor
                .extract_for_document(document_id, &self.user_id)
                .await;
            cursor += 1;
            self.manager.update_progress(job_id, cursor);
            outcomes.push(outcome);
        }

        if self.job(job_id)?.status == JobStatus::Cancelled {
            return Ok(RunnerOutcome::Cancelled { job_id, cursor });
        }

        let failed = outcomes.iter().filter(|o| !o.success).count();
        let error = (failed > 0).then(|| format!("{} of {} documents failed", failed, outcomes.len()));
        if let Some(message) = &error {
            warn!(%job_id, %message, "Project extraction finished with failures");
        }
        self.manager.complete_job(job_id, failed == 0, error);
        info!(%job_id, processed = outcomes.len(), "Project extraction job completed");

        Ok(RunnerOutcome::Completed { job_id, outcomes })
    }

    fn job(&self, job_id: JobId) -> Result<Job, ExtractorError> {
        self.manager
            .get_job(job_id)
            .ok_or_else(|| ExtractorError::NotFound(format!("job {}", job_id)))
    }
}

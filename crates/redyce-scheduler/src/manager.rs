//! Per-project job arbitration with priority preemption
//!
//! Each project has at most one lock. A HIGH job asking for a lock held by a
//! RUNNING LOW job pauses that job and takes the lock; every other contended
//! request has to wait. When a HIGH job completes, the oldest LOW job it (or
//! any other HIGH job) paused on the same project is handed back as PENDING
//! with its document cursor intact.

use crate::events::JobEvent;
use crate::ledger::NullLedger;
use crate::{SchedulerConfig, SchedulerError};
use redyce_domain::traits::JobLedger;
use redyce_domain::{
    current_timestamp, DocumentId, Job, JobId, JobPriority, JobStatus, JobType, ProjectId,
};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Result of asking for a project's lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDecision {
    /// The lock was free (or stale) and is now held by the job
    Started,
    /// The lock was taken from a RUNNING LOW job, which is now PAUSED
    Preempted {
        /// The job that was paused
        paused: JobId,
    },
    /// Another job holds the lock and cannot be preempted
    MustWait {
        /// Current lock holder
        holder: JobId,
    },
    /// The job already reached a terminal status
    Finished,
    /// No such job
    NotFound,
}

impl StartDecision {
    /// Whether the caller now holds the lock
    pub fn acquired(&self) -> bool {
        matches!(self, StartDecision::Started | StartDecision::Preempted { .. })
    }
}

struct State<L> {
    jobs: HashMap<JobId, Job>,
    locks: HashMap<ProjectId, JobId>,
    ledger: L,
}

/// Arbitrates project locks between jobs
///
/// Shareable via `Arc`; all operations take `&self` and hold an internal
/// mutex only for the duration of the call.
///
/// # Examples
///
/// ```
/// use redyce_scheduler::{PriorityManager, SchedulerConfig, StartDecision};
/// use redyce_domain::{JobType, ProjectId};
///
/// let manager = PriorityManager::new(SchedulerConfig::default());
/// let project = ProjectId::new("ao-2024-17");
///
/// let background = manager.register_job(project.clone(), JobType::RequirementExtraction, vec![]);
/// assert_eq!(manager.start_job(background), StartDecision::Started);
///
/// let interactive = manager.register_job(project, JobType::AnswerGeneration, vec![]);
/// assert_eq!(
///     manager.start_job(interactive),
///     StartDecision::Preempted { paused: background }
/// );
///
/// let resumed = manager.complete_job(interactive, true, None).unwrap();
/// assert_eq!(resumed.id, background);
/// ```
pub struct PriorityManager<L: JobLedger = NullLedger> {
    config: SchedulerConfig,
    state: Mutex<State<L>>,
    events: broadcast::Sender<JobEvent>,
}

impl PriorityManager<NullLedger> {
    /// Create an in-memory manager
    pub fn new(config: SchedulerConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            state: Mutex::new(State {
                jobs: HashMap::new(),
                locks: HashMap::new(),
                ledger: NullLedger,
            }),
            events,
        }
    }

    /// Create an in-memory manager with default configuration
    pub fn default_config() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl<L> PriorityManager<L>
where
    L: JobLedger,
    L::Error: Display,
{
    /// Create a manager that writes every job mutation through to `ledger`
    ///
    /// Jobs found in the ledger are restored. A job that was RUNNING when the
    /// process stopped comes back PAUSED with its cursor intact, and no lock
    /// is held after restore.
    pub fn with_ledger(config: SchedulerConfig, mut ledger: L) -> Result<Self, SchedulerError> {
        let stored = ledger
            .load_jobs()
            .map_err(|e| SchedulerError::Ledger(e.to_string()))?;

        let now = current_timestamp();
        let mut jobs = HashMap::with_capacity(stored.len());
        let mut interrupted = 0;

        for mut job in stored {
            if job.status == JobStatus::Running {
                job.status = JobStatus::Paused;
                job.paused_at = Some(now);
                ledger
                    .save_job(&job)
                    .map_err(|e| SchedulerError::Ledger(e.to_string()))?;
                interrupted += 1;
            }
            jobs.insert(job.id, job);
        }

        info!(
            restored = jobs.len(),
            interrupted, "Restored jobs from ledger"
        );

        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Ok(Self {
            config,
            state: Mutex::new(State {
                jobs,
                locks: HashMap::new(),
                ledger,
            }),
            events,
        })
    }

    fn state(&self) -> MutexGuard<'_, State<L>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: JobEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }

    fn persist(ledger: &mut L, job: &Job) {
        if let Err(e) = ledger.save_job(job) {
            warn!(job_id = %job.id, error = %e, "Failed to write job to ledger");
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Subscribe to job lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Register a PENDING job; priority is derived from the job type
    pub fn register_job(
        &self,
        project_id: ProjectId,
        job_type: JobType,
        document_ids: Vec<DocumentId>,
    ) -> JobId {
        let job = Job::new(project_id.clone(), job_type, document_ids);
        let job_id = job.id;

        {
            let mut guard = self.state();
            let State { jobs, ledger, .. } = &mut *guard;
            Self::persist(ledger, &job);
            jobs.insert(job_id, job);
        }

        debug!(%job_id, project_id = %project_id, %job_type, "Job registered");
        self.emit(JobEvent::Registered {
            job_id,
            project_id,
            job_type,
        });
        job_id
    }

    /// Ask for the job's project lock
    pub fn start_job(&self, job_id: JobId) -> StartDecision {
        let mut guard = self.state();
        let State {
            jobs,
            locks,
            ledger,
        } = &mut *guard;

        let Some(job) = jobs.get(&job_id) else {
            warn!(%job_id, "start_job: unknown job");
            return StartDecision::NotFound;
        };
        if job.status.is_terminal() {
            debug!(%job_id, status = %job.status, "start_job: job already finished");
            return StartDecision::Finished;
        }
        let project_id = job.project_id.clone();
        let priority = job.priority;
        let now = current_timestamp();

        let mut decision = StartDecision::Started;
        let mut events = Vec::new();

        if let Some(holder) = locks.get(&project_id).copied() {
            let holder_state = jobs.get(&holder).map(|h| (h.status, h.priority));
            match holder_state {
                _ if holder == job_id => {}
                Some((JobStatus::Running, holder_priority)) => {
                    if holder_priority == JobPriority::Low && priority == JobPriority::High {
                        if let Some(paused) = jobs.get_mut(&holder) {
                            paused.status = JobStatus::Paused;
                            paused.paused_at = Some(now);
                            Self::persist(ledger, paused);
                        }
                        info!(
                            %job_id,
                            paused = %holder,
                            project_id = %project_id,
                            "Preempting LOW priority job"
                        );
                        events.push(JobEvent::Paused {
                            job_id: holder,
                            project_id: project_id.clone(),
                            preempted_by: Some(job_id),
                        });
                        decision = StartDecision::Preempted { paused: holder };
                    } else {
                        debug!(%job_id, %holder, "Project lock busy");
                        return StartDecision::MustWait { holder };
                    }
                }
                _ => {
                    debug!(%holder, project_id = %project_id, "Reclaiming stale project lock");
                }
            }
        }

        locks.insert(project_id.clone(), job_id);
        if let Some(job) = jobs.get_mut(&job_id) {
            job.status = JobStatus::Running;
            job.started_at = Some(now);
            Self::persist(ledger, job);
        }
        drop(guard);

        events.push(JobEvent::Started { job_id, project_id });
        for event in events {
            self.emit(event);
        }
        decision
    }

    /// Advance a job's document cursor
    ///
    /// Returns `false` for unknown jobs.
    pub fn update_progress(&self, job_id: JobId, current_document_index: usize) -> bool {
        let mut guard = self.state();
        let State { jobs, ledger, .. } = &mut *guard;

        match jobs.get_mut(&job_id) {
            Some(job) => {
                job.current_document_index = current_document_index;
                Self::persist(ledger, job);
                true
            }
            None => {
                warn!(%job_id, "update_progress: unknown job");
                false
            }
        }
    }

    /// Finish a job and release its lock
    ///
    /// When the finished job is HIGH priority, the oldest PAUSED LOW job of
    /// the same project is marked PENDING and returned so the caller can
    /// resume it from its cursor.
    pub fn complete_job(&self, job_id: JobId, success: bool, error: Option<String>) -> Option<Job> {
        let mut guard = self.state();
        let State {
            jobs,
            locks,
            ledger,
        } = &mut *guard;

        let Some(job) = jobs.get_mut(&job_id) else {
            warn!(%job_id, "complete_job: unknown job");
            return None;
        };
        if job.status.is_terminal() {
            debug!(%job_id, status = %job.status, "complete_job: already finished");
            return None;
        }

        let now = current_timestamp();
        job.status = if success {
            JobStatus::Completed
        } else {
            JobStatus::Error
        };
        job.error = error;
        job.completed_at = Some(now);
        Self::persist(ledger, job);

        let project_id = job.project_id.clone();
        let priority = job.priority;

        if locks.get(&project_id) == Some(&job_id) {
            locks.remove(&project_id);
        }

        let mut events = vec![JobEvent::Completed {
            job_id,
            project_id: project_id.clone(),
            success,
        }];

        let mut resumed = None;
        if priority == JobPriority::High {
            let candidate = jobs
                .values()
                .filter(|j| {
                    j.project_id == project_id
                        && j.priority == JobPriority::Low
                        && j.status == JobStatus::Paused
                })
                .min_by_key(|j| (j.paused_at, j.created_at))
                .map(|j| j.id);

            if let Some(paused_id) = candidate {
                if let Some(paused) = jobs.get_mut(&paused_id) {
                    paused.status = JobStatus::Pending;
                    Self::persist(ledger, paused);
                    info!(
                        job_id = %paused_id,
                        cursor = paused.current_document_index,
                        "Handing paused job back for resumption"
                    );
                    events.push(JobEvent::Resumed {
                        job_id: paused_id,
                        project_id: project_id.clone(),
                        current_document_index: paused.current_document_index,
                    });
                    resumed = Some(paused.clone());
                }
            }
        }
        drop(guard);

        for event in events {
            self.emit(event);
        }
        resumed
    }

    /// Cancel a job; a lock it holds is released
    ///
    /// Returns `false` for unknown or already finished jobs. An extraction
    /// in flight is not interrupted; runners observe the status between
    /// documents.
    pub fn cancel_job(&self, job_id: JobId) -> bool {
        let mut guard = self.state();
        let State {
            jobs,
            locks,
            ledger,
        } = &mut *guard;

        let Some(job) = jobs.get_mut(&job_id) else {
            warn!(%job_id, "cancel_job: unknown job");
            return false;
        };
        if job.status.is_terminal() {
            return false;
        }

        job.status = JobStatus::Cancelled;
        job.completed_at = Some(current_timestamp());
        Self::persist(ledger, job);
        let project_id = job.project_id.clone();

        if locks.get(&project_id) == Some(&job_id) {
            locks.remove(&project_id);
        }
        drop(guard);

        self.emit(JobEvent::Cancelled { job_id, project_id });
        true
    }

    /// Pause a PENDING or RUNNING job; a lock it holds is released
    pub fn pause_job(&self, job_id: JobId) -> bool {
        let mut guard = self.state();
        let State {
            jobs,
            locks,
            ledger,
        } = &mut *guard;

        let Some(job) = jobs.get_mut(&job_id) else {
            warn!(%job_id, "pause_job: unknown job");
            return false;
        };
        if !matches!(job.status, JobStatus::Pending | JobStatus::Running) {
            return false;
        }

        job.status = JobStatus::Paused;
        job.paused_at = Some(current_timestamp());
        Self::persist(ledger, job);
        let project_id = job.project_id.clone();

        if locks.get(&project_id) == Some(&job_id) {
            locks.remove(&project_id);
        }
        drop(guard);

        self.emit(JobEvent::Paused {
            job_id,
            project_id,
            preempted_by: None,
        });
        true
    }

    /// Snapshot of a job
    pub fn get_job(&self, job_id: JobId) -> Option<Job> {
        self.state().jobs.get(&job_id).cloned()
    }

    /// The RUNNING job holding a project's lock, if any
    pub fn active_job(&self, project_id: &ProjectId) -> Option<Job> {
        let guard = self.state();
        guard
            .locks
            .get(project_id)
            .and_then(|id| guard.jobs.get(id))
            .filter(|job| job.status == JobStatus::Running)
            .cloned()
    }

    /// All known jobs of a project, oldest first
    pub fn jobs_for_project(&self, project_id: &ProjectId) -> Vec<Job> {
        self.list_jobs(Some(project_id))
    }

    /// All known jobs, optionally restricted to a project, oldest first
    pub fn list_jobs(&self, project_id: Option<&ProjectId>) -> Vec<Job> {
        let guard = self.state();
        let mut jobs: Vec<Job> = guard
            .jobs
            .values()
            .filter(|job| project_id.map_or(true, |p| &job.project_id == p))
            .cloned()
            .collect();
        jobs.sort_by_key(|job| (job.created_at, job.id));
        jobs
    }

    /// Evict finished jobs older than the retention period
    pub fn cleanup_completed_jobs(&self) -> usize {
        self.cleanup_completed_jobs_at(current_timestamp())
    }

    /// Evict finished jobs whose `completed_at` is at least the retention
    /// period before `now`
    pub fn cleanup_completed_jobs_at(&self, now: u64) -> usize {
        let retention = self.config.retention_secs;
        let mut guard = self.state();
        let State {
            jobs,
            locks,
            ledger,
        } = &mut *guard;

        let expired: Vec<JobId> = jobs
            .values()
            .filter(|job| job.status.is_terminal())
            .filter(|job| {
                job.completed_at
                    .is_some_and(|at| now.saturating_sub(at) >= retention)
            })
            .map(|job| job.id)
            .collect();

        for id in &expired {
            jobs.remove(id);
            if let Err(e) = ledger.delete_job(*id) {
                warn!(job_id = %id, error = %e, "Failed to delete job from ledger");
            }
        }
        locks.retain(|_, holder| !expired.contains(holder));

        if !expired.is_empty() {
            debug!(evicted = expired.len(), "Evicted finished jobs");
        }
        expired.len()
    }
}

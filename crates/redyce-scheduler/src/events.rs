//! Job lifecycle events broadcast by the priority manager

use redyce_domain::{JobId, JobType, ProjectId};

/// A job state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// A job was registered (PENDING)
    Registered {
        /// Job
        job_id: JobId,
        /// Project
        project_id: ProjectId,
        /// Kind of work
        job_type: JobType,
    },
    /// A job acquired its project's lock
    Started {
        /// Job
        job_id: JobId,
        /// Project
        project_id: ProjectId,
    },
    /// A job was paused, either explicitly or by preemption
    Paused {
        /// Job
        job_id: JobId,
        /// Project
        project_id: ProjectId,
        /// HIGH job that took the lock, if this was a preemption
        preempted_by: Option<JobId>,
    },
    /// A paused job was handed back for resumption (now PENDING)
    Resumed {
        /// Job
        job_id: JobId,
        /// Project
        project_id: ProjectId,
        /// Cursor the job resumes from
        current_document_index: usize,
    },
    /// A job finished
    Completed {
        /// Job
        job_id: JobId,
        /// Project
        project_id: ProjectId,
        /// `false` when the job ended in ERROR
        success: bool,
    },
    /// A job was cancelled
    Cancelled {
        /// Job
        job_id: JobId,
        /// Project
        project_id: ProjectId,
    },
}

impl JobEvent {
    /// Job the event is about
    pub fn job_id(&self) -> JobId {
        match self {
            JobEvent::Registered { job_id, .. }
            | JobEvent::Started { job_id, .. }
            | JobEvent::Paused { job_id, .. }
            | JobEvent::Resumed { job_id, .. }
            | JobEvent::Completed { job_id, .. }
            | JobEvent::Cancelled { job_id, .. } => *job_id,
        }
    }

    /// Project the event is about
    pub fn project_id(&self) -> &ProjectId {
        match self {
            JobEvent::Registered { project_id, .. }
            | JobEvent::Started { project_id, .. }
            | JobEvent::Paused { project_id, .. }
            | JobEvent::Resumed { project_id, .. }
            | JobEvent::Completed { project_id, .. }
            | JobEvent::Cancelled { project_id, .. } => project_id,
        }
    }
}

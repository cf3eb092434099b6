//! Jobs coordinated per project by priority

use crate::ids::{DocumentId, JobId, ProjectId};
use std::fmt;

/// Kind of work a job performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobType {
    /// Background extraction of requirements from project documents
    RequirementExtraction,
    /// Interactive extraction of questions
    QuestionExtraction,
    /// Interactive answer generation
    AnswerGeneration,
}

impl JobType {
    /// Priority derived from the job type
    pub fn priority(&self) -> JobPriority {
        match self {
            JobType::RequirementExtraction => JobPriority::Low,
            JobType::QuestionExtraction | JobType::AnswerGeneration => JobPriority::High,
        }
    }

    /// Get the type name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::RequirementExtraction => "REQUIREMENT_EXTRACTION",
            JobType::QuestionExtraction => "QUESTION_EXTRACTION",
            JobType::AnswerGeneration => "ANSWER_GENERATION",
        }
    }

    /// Parse a stored type name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "REQUIREMENT_EXTRACTION" => Some(JobType::RequirementExtraction),
            "QUESTION_EXTRACTION" => Some(JobType::QuestionExtraction),
            "ANSWER_GENERATION" => Some(JobType::AnswerGeneration),
            _ => None,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling priority; HIGH may preempt LOW, never the reverse
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobPriority {
    /// Background work
    Low,
    /// Interactive work
    High,
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Registered, not holding the lock
    Pending,
    /// Holding the project lock
    Running,
    /// Preempted or paused; resumable from its cursor
    Paused,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Error,
    /// Cancelled by the caller
    Cancelled,
}

impl JobStatus {
    /// Get the status name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Paused => "PAUSED",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Error => "ERROR",
            JobStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parse a stored status name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(JobStatus::Pending),
            "RUNNING" => Some(JobStatus::Running),
            "PAUSED" => Some(JobStatus::Paused),
            "COMPLETED" => Some(JobStatus::Completed),
            "ERROR" => Some(JobStatus::Error),
            "CANCELLED" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether the job has reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Error | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work arbitrated by the priority manager
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Unique identifier
    pub id: JobId,
    /// Project whose lock the job competes for
    pub project_id: ProjectId,
    /// Kind of work
    pub job_type: JobType,
    /// Priority derived from `job_type`
    pub priority: JobPriority,
    /// Current status
    pub status: JobStatus,
    /// Documents the job walks through, if any
    pub document_ids: Vec<DocumentId>,
    /// Index of the next document to process
    pub current_document_index: usize,
    /// Failure message for jobs that ended in error
    pub error: Option<String>,
    /// Registration time (seconds since epoch)
    pub created_at: u64,
    /// Last time the job acquired the lock
    pub started_at: Option<u64>,
    /// Last time the job was paused
    pub paused_at: Option<u64>,
    /// Time the job reached a terminal state
    pub completed_at: Option<u64>,
}

impl Job {
    /// Create a pending job; priority is derived from the type
    pub fn new(project_id: ProjectId, job_type: JobType, document_ids: Vec<DocumentId>) -> Self {
        Self {
            id: JobId::new(),
            project_id,
            job_type,
            priority: job_type.priority(),
            status: JobStatus::Pending,
            document_ids,
            current_document_index: 0,
            error: None,
            created_at: crate::current_timestamp(),
            started_at: None,
            paused_at: None,
            completed_at: None,
        }
    }

    /// Documents not yet processed, starting at the cursor
    pub fn remaining_documents(&self) -> &[DocumentId] {
        let start = self.current_document_index.min(self.document_ids.len());
        &self.document_ids[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_derived_from_type() {
        assert_eq!(JobType::RequirementExtraction.priority(), JobPriority::Low);
        assert_eq!(JobType::QuestionExtraction.priority(), JobPriority::High);
        assert_eq!(JobType::AnswerGeneration.priority(), JobPriority::High);
        assert!(JobPriority::High > JobPriority::Low);
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::new(ProjectId::new("p"), JobType::AnswerGeneration, Vec::new());
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.priority, JobPriority::High);
        assert_eq!(job.current_document_index, 0);
    }

    #[test]
    fn test_remaining_documents_follow_cursor() {
        let docs = vec![DocumentId::new("a"), DocumentId::new("b"), DocumentId::new("c")];
        let mut job = Job::new(ProjectId::new("p"), JobType::RequirementExtraction, docs);
        job.current_document_index = 1;
        assert_eq!(job.remaining_documents().len(), 2);
        job.current_document_index = 10;
        assert!(job.remaining_documents().is_empty());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Paused.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }
}

//! Priority manager backed by the SQLite job ledger
//!
//! These tests verify that jobs survive a restart of the manager.

use redyce_domain::traits::JobLedger;
use redyce_domain::{DocumentId, JobStatus, JobType, ProjectId};
use redyce_scheduler::{PriorityManager, SchedulerConfig, StartDecision};
use redyce_store::SqliteStore;

#[test]
fn test_interrupted_job_restored_as_paused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.db");
    let project = ProjectId::new("ao-42");
    let docs = vec![DocumentId::new("rc"), DocumentId::new("cctp"), DocumentId::new("ccap")];

    let job_id = {
        let store = SqliteStore::new(&path).unwrap();
        let manager = PriorityManager::with_ledger(SchedulerConfig::default(), store).unwrap();
        let id = manager.register_job(project.clone(), JobType::RequirementExtraction, docs.clone());
        assert_eq!(manager.start_job(id), StartDecision::Started);
        manager.update_progress(id, 2);
        id
    };

    let store = SqliteStore::new(&path).unwrap();
    let manager = PriorityManager::with_ledger(SchedulerConfig::default(), store).unwrap();

    let job = manager.get_job(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Paused);
    assert_eq!(job.current_document_index, 2);
    assert_eq!(job.document_ids, docs);
    assert!(manager.active_job(&project).is_none());
    assert_eq!(manager.start_job(job_id), StartDecision::Started);
}

#[test]
fn test_cleanup_deletes_from_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.db");

    let store = SqliteStore::new(&path).unwrap();
    let config = SchedulerConfig {
        retention_secs: 0,
        ..SchedulerConfig::default()
    };
    let manager = PriorityManager::with_ledger(config, store).unwrap();
    let id = manager.register_job(ProjectId::new("p"), JobType::AnswerGeneration, vec![]);
    manager.start_job(id);
    manager.complete_job(id, true, None);
    assert_eq!(manager.cleanup_completed_jobs(), 1);
    drop(manager);

    let store = SqliteStore::new(&path).unwrap();
    assert!(store.load_jobs().unwrap().is_empty());
}

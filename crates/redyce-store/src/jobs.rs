//! `JobLedger` implementation backed by the `jobs` table

use crate::{SqliteStore, StoreError};
use redyce_domain::traits::JobLedger;
use redyce_domain::{DocumentId, Job, JobId, JobStatus, JobType, ProjectId};
use rusqlite::{params, Row};

const JOB_COLUMNS: &str = "id, project_id, job_type, status, document_ids, \
     current_document_index, error, created_at, started_at, paused_at, completed_at";

fn row_to_job(row: &Row<'_>) -> rusqlite::Result<Job> {
    use rusqlite::types::Type;

    let id_bytes: Vec<u8> = row.get(0)?;
    let id = SqliteStore::bytes_to_id(&id_bytes)
        .map(JobId::from_value)
        .map_err(|e| SqliteStore::conversion_error(0, Type::Blob, e))?;

    let job_type: String = row.get(2)?;
    let job_type = JobType::parse(&job_type).ok_or_else(|| {
        SqliteStore::conversion_error(
            2,
            Type::Text,
            StoreError::InvalidData(format!("Unknown job type: {}", job_type)),
        )
    })?;

    let status: String = row.get(3)?;
    let status = JobStatus::parse(&status).ok_or_else(|| {
        SqliteStore::conversion_error(
            3,
            Type::Text,
            StoreError::InvalidData(format!("Unknown job status: {}", status)),
        )
    })?;

    let document_ids: String = row.get(4)?;
    let document_ids: Vec<String> = serde_json::from_str(&document_ids).map_err(|e| {
        SqliteStore::conversion_error(
            4,
            Type::Text,
            StoreError::InvalidData(format!("Malformed document list: {}", e)),
        )
    })?;

    Ok(Job {
        id,
        project_id: ProjectId::from(row.get::<_, String>(1)?),
        job_type,
        priority: job_type.priority(),
        status,
        document_ids: document_ids.into_iter().map(DocumentId::from).collect(),
        current_document_index: SqliteStore::get_unsigned(row, 5)?,
        error: row.get(6)?,
        created_at: SqliteStore::get_unsigned(row, 7)?,
        started_at: SqliteStore::get_unsigned_opt(row, 8)?,
        paused_at: SqliteStore::get_unsigned_opt(row, 9)?,
        completed_at: SqliteStore::get_unsigned_opt(row, 10)?,
    })
}

impl JobLedger for SqliteStore {
    type Error = StoreError;

    fn save_job(&mut self, job: &Job) -> Result<(), Self::Error> {
        let document_ids: Vec<&str> = job.document_ids.iter().map(|d| d.as_str()).collect();
        let document_ids = serde_json::to_string(&document_ids)
            .map_err(|e| StoreError::InvalidData(format!("Cannot encode document list: {}", e)))?;

        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO jobs ({})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                JOB_COLUMNS
            ),
            params![
                SqliteStore::id_to_bytes(job.id.value()),
                job.project_id.as_str(),
                job.job_type.as_str(),
                job.status.as_str(),
                document_ids,
                job.current_document_index as i64,
                &job.error,
                job.created_at as i64,
                job.started_at.map(|t| t as i64),
                job.paused_at.map(|t| t as i64),
                job.completed_at.map(|t| t as i64),
            ],
        )?;
        Ok(())
    }

    fn delete_job(&mut self, id: JobId) -> Result<(), Self::Error> {
        self.conn.execute(
            "DELETE FROM jobs WHERE id = ?1",
            params![SqliteStore::id_to_bytes(id.value())],
        )?;
        Ok(())
    }

    fn load_jobs(&self) -> Result<Vec<Job>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM jobs ORDER BY created_at, id",
            JOB_COLUMNS
        ))?;

        let jobs = stmt
            .query_map([], row_to_job)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_job() {
        let mut store = SqliteStore::in_memory().unwrap();
        let mut job = Job::new(
            ProjectId::new("p1"),
            JobType::RequirementExtraction,
            vec![DocumentId::new("d1"), DocumentId::new("d2")],
        );
        job.status = JobStatus::Paused;
        job.current_document_index = 1;
        job.paused_at = Some(42);

        store.save_job(&job).unwrap();
        let loaded = store.load_jobs().unwrap();

        assert_eq!(loaded, vec![job]);
    }

    #[test]
    fn test_save_job_replaces_snapshot() {
        let mut store = SqliteStore::in_memory().unwrap();
        let mut job = Job::new(ProjectId::new("p1"), JobType::AnswerGeneration, Vec::new());
        store.save_job(&job).unwrap();

        job.status = JobStatus::Completed;
        job.completed_at = Some(100);
        store.save_job(&job).unwrap();

        let loaded = store.load_jobs().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].status, JobStatus::Completed);
    }

    #[test]
    fn test_delete_job() {
        let mut store = SqliteStore::in_memory().unwrap();
        let job = Job::new(ProjectId::new("p1"), JobType::QuestionExtraction, Vec::new());
        store.save_job(&job).unwrap();
        store.delete_job(job.id).unwrap();
        assert!(store.load_jobs().unwrap().is_empty());
    }

    #[test]
    fn test_negative_cursor_is_rejected() {
        let mut store = SqliteStore::in_memory().unwrap();
        let job = Job::new(ProjectId::new("p1"), JobType::RequirementExtraction, Vec::new());
        store.save_job(&job).unwrap();
        store
            .conn
            .execute("UPDATE jobs SET current_document_index = -3", [])
            .unwrap();

        assert!(store.load_jobs().is_err());
    }
}

//! Redyce Storage Layer
//!
//! Implements the `ExtractionStore` and `JobLedger` traits on SQLite.
//!
//! # Architecture
//!
//! - `documents` carries the requirement-extraction status of each upload
//! - `document_analyses` caches extracted text so retries skip parsing
//! - `requirements` enforces the `(project_id, document_id, content_hash)`
//!   uniqueness key that makes extraction idempotent
//! - `usage_records` receives token counts for cost attribution
//! - `jobs` is the durable ledger behind the priority manager
//!
//! # Examples
//!
//! ```no_run
//! use redyce_store::SqliteStore;
//!
//! let store = SqliteStore::new("redyce.db").unwrap();
//! // Store is now ready for extraction operations
//! ```

#![warn(missing_docs)]

mod jobs;

use redyce_domain::traits::ExtractionStore;
use redyce_domain::{
    Document, DocumentId, DocumentKind, DocumentSummary, ExtractionStatus, InsertOutcome,
    ProjectId, Requirement, RequirementId, RequirementPriority, RequirementStatus, StatusUpdate,
    UsageRecord,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of the Redyce stores
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store across tasks behind
/// a mutex, or open one store per thread on the same database file.
pub struct SqliteStore {
    conn: Connection,
}

const DOCUMENT_COLUMNS: &str = "id, project_id, name, mime_type, kind, content, \
     requirement_status, requirement_processed_at, requirement_error_message, created_at";

const REQUIREMENT_COLUMNS: &str = "id, project_id, document_id, code, title, description, \
     category, priority, status, source_page, source_quote, content_hash, created_at";

impl SqliteStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open a fresh in-memory store
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    /// Number of requirements extracted from a document
    pub fn count_requirements(&self, document_id: &DocumentId) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM requirements WHERE document_id = ?1",
            params![document_id.as_str()],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("Invalid count: {}", count)))
    }

    /// All recorded usage, oldest first
    pub fn usage_records(&self) -> Result<Vec<UsageRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, project_id, operation, model, input_tokens, output_tokens, created_at
             FROM usage_records ORDER BY id",
        )?;

        let records = stmt
            .query_map([], |row| {
                Ok(UsageRecord {
                    user_id: row.get::<_, String>(0)?.into(),
                    project_id: row.get::<_, Option<String>>(1)?.map(ProjectId::from),
                    operation: row.get(2)?,
                    model: row.get(3)?,
                    input_tokens: Self::get_unsigned_opt(row, 4)?,
                    output_tokens: Self::get_unsigned_opt(row, 5)?,
                    created_at: Self::get_unsigned(row, 6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Convert a UUID-backed id to bytes for storage
    pub(crate) fn id_to_bytes(value: u128) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    /// Convert stored bytes back to a UUID value
    pub(crate) fn bytes_to_id(bytes: &[u8]) -> Result<u128, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for id, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(u128::from_be_bytes(arr))
    }

    /// Wrap a decoding failure so it can leave a rusqlite row closure
    pub(crate) fn conversion_error(
        column: usize,
        kind: rusqlite::types::Type,
        err: StoreError,
    ) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(column, kind, Box::new(err))
    }

    /// Read an integer column into an unsigned type, rejecting negative or
    /// oversized values
    pub(crate) fn get_unsigned<T: TryFrom<i64>>(
        row: &Row<'_>,
        column: usize,
    ) -> rusqlite::Result<T> {
        let value: i64 = row.get(column)?;
        Self::unsigned(value, column)
    }

    /// Nullable variant of [`Self::get_unsigned`]
    pub(crate) fn get_unsigned_opt<T: TryFrom<i64>>(
        row: &Row<'_>,
        column: usize,
    ) -> rusqlite::Result<Option<T>> {
        row.get::<_, Option<i64>>(column)?
            .map(|value| Self::unsigned(value, column))
            .transpose()
    }

    fn unsigned<T: TryFrom<i64>>(value: i64, column: usize) -> rusqlite::Result<T> {
        T::try_from(value).map_err(|_| {
            Self::conversion_error(
                column,
                rusqlite::types::Type::Integer,
                StoreError::InvalidData(format!("Value out of range: {}", value)),
            )
        })
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let status: Option<String> = row.get(6)?;
        let requirement_status = match status {
            Some(s) => Some(ExtractionStatus::parse(&s).ok_or_else(|| {
                Self::conversion_error(
                    6,
                    rusqlite::types::Type::Text,
                    StoreError::InvalidData(format!("Unknown extraction status: {}", s)),
                )
            })?),
            None => None,
        };

        Ok(Document {
            id: row.get::<_, String>(0)?.into(),
            project_id: row.get::<_, String>(1)?.into(),
            name: row.get(2)?,
            mime_type: row.get(3)?,
            kind: row
                .get::<_, Option<String>>(4)?
                .map(|k| DocumentKind::parse(&k)),
            content: row.get(5)?,
            requirement_status,
            requirement_processed_at: Self::get_unsigned_opt(row, 7)?,
            requirement_error_message: row.get(8)?,
            created_at: Self::get_unsigned(row, 9)?,
        })
    }

    fn row_to_requirement(row: &Row<'_>) -> rusqlite::Result<Requirement> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_id(&id_bytes)
            .map(RequirementId::from_value)
            .map_err(|e| Self::conversion_error(0, rusqlite::types::Type::Blob, e))?;

        let priority: String = row.get(7)?;
        let priority = RequirementPriority::parse(&priority).ok_or_else(|| {
            Self::conversion_error(
                7,
                rusqlite::types::Type::Text,
                StoreError::InvalidData(format!("Unknown priority: {}", priority)),
            )
        })?;

        let status: String = row.get(8)?;
        let status = RequirementStatus::parse(&status).ok_or_else(|| {
            Self::conversion_error(
                8,
                rusqlite::types::Type::Text,
                StoreError::InvalidData(format!("Unknown requirement status: {}", status)),
            )
        })?;

        Ok(Requirement {
            id,
            project_id: row.get::<_, String>(1)?.into(),
            document_id: row.get::<_, String>(2)?.into(),
            code: row.get(3)?,
            title: row.get(4)?,
            description: row.get(5)?,
            category: row.get(6)?,
            priority,
            status,
            source_page: Self::get_unsigned_opt(row, 9)?,
            source_quote: row.get(10)?,
            content_hash: row.get(11)?,
            created_at: Self::get_unsigned(row, 12)?,
        })
    }
}

/// Whether an error is a violation of a UNIQUE or PRIMARY KEY constraint
fn is_uniqueness_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

impl ExtractionStore for SqliteStore {
    type Error = StoreError;

    fn insert_document(&mut self, document: &Document) -> Result<(), Self::Error> {
        let tx = self.conn.transaction()?;

        let same_content: Option<bool> = tx
            .query_row(
                "SELECT content = ?2 FROM documents WHERE id = ?1",
                params![document.id.as_str(), &document.content],
                |row| row.get(0),
            )
            .optional()?;

        // Status columns are only written on first insert; requirements and
        // the cached analysis hang off the row and must survive a re-import
        tx.execute(
            &format!(
                "INSERT INTO documents ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                     project_id = excluded.project_id,
                     name = excluded.name,
                     mime_type = excluded.mime_type,
                     kind = excluded.kind,
                     content = excluded.content",
                DOCUMENT_COLUMNS
            ),
            params![
                document.id.as_str(),
                document.project_id.as_str(),
                &document.name,
                &document.mime_type,
                document.kind.map(|k| k.as_str()),
                &document.content,
                document.requirement_status.map(|s| s.as_str()),
                document.requirement_processed_at.map(|t| t as i64),
                &document.requirement_error_message,
                document.created_at as i64,
            ],
        )?;

        if same_content == Some(false) {
            debug!(document_id = %document.id, "Document bytes changed, dropping cached analysis");
            tx.execute(
                "DELETE FROM document_analyses WHERE document_id = ?1",
                params![document.id.as_str()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_document(&self, id: &DocumentId) -> Result<Option<Document>, Self::Error> {
        let document = self
            .conn
            .query_row(
                &format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS),
                params![id.as_str()],
                Self::row_to_document,
            )
            .optional()?;
        Ok(document)
    }

    fn list_documents(
        &self,
        project_id: Option<&ProjectId>,
    ) -> Result<Vec<DocumentSummary>, Self::Error> {
        let mut sql = String::from(
            "SELECT id, project_id, name, mime_type, requirement_status,
                    requirement_processed_at, requirement_error_message
             FROM documents",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(project_id) = project_id {
            sql.push_str(" WHERE project_id = ?");
            params.push(Box::new(project_id.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let documents = stmt
            .query_map(&param_refs[..], |row| {
                let status: Option<String> = row.get(4)?;
                Ok(DocumentSummary {
                    id: row.get::<_, String>(0)?.into(),
                    project_id: row.get::<_, String>(1)?.into(),
                    name: row.get(2)?,
                    mime_type: row.get(3)?,
                    requirement_status: status.as_deref().and_then(ExtractionStatus::parse),
                    requirement_processed_at: Self::get_unsigned_opt(row, 5)?,
                    requirement_error_message: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents)
    }

    fn find_extraction_candidates(
        &self,
        project_id: Option<&ProjectId>,
        include_failed: bool,
    ) -> Result<Vec<DocumentId>, Self::Error> {
        let mut sql = String::from(
            "SELECT id FROM documents
             WHERE (requirement_status IS NULL OR requirement_status = 'WAITING'",
        );
        if include_failed {
            sql.push_str(" OR requirement_status = 'ERROR'");
        }
        sql.push(')');

        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(project_id) = project_id {
            sql.push_str(" AND project_id = ?");
            params.push(Box::new(project_id.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let ids = stmt
            .query_map(&param_refs[..], |row| row.get::<_, String>(0))?
            .map(|id| id.map(DocumentId::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    fn set_extraction_status(
        &mut self,
        id: &DocumentId,
        update: &StatusUpdate,
    ) -> Result<bool, Self::Error> {
        let status = update.status().as_str();
        let changed = match update {
            StatusUpdate::Waiting => self.conn.execute(
                "UPDATE documents SET requirement_status = ?1, requirement_error_message = NULL
                 WHERE id = ?2",
                params![status, id.as_str()],
            )?,
            StatusUpdate::Processing => self.conn.execute(
                "UPDATE documents SET requirement_status = ?1 WHERE id = ?2",
                params![status, id.as_str()],
            )?,
            StatusUpdate::Done { processed_at } => self.conn.execute(
                "UPDATE documents SET requirement_status = ?1, requirement_processed_at = ?2,
                        requirement_error_message = NULL
                 WHERE id = ?3",
                params![status, *processed_at as i64, id.as_str()],
            )?,
            StatusUpdate::Error { message } => self.conn.execute(
                "UPDATE documents SET requirement_status = ?1, requirement_error_message = ?2
                 WHERE id = ?3",
                params![status, message, id.as_str()],
            )?,
        };

        debug!(document_id = %id, status, "Extraction status written");
        Ok(changed > 0)
    }

    fn get_cached_analysis(&self, id: &DocumentId) -> Result<Option<String>, Self::Error> {
        let text = self
            .conn
            .query_row(
                "SELECT extracted_text FROM document_analyses WHERE document_id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(text)
    }

    fn save_cached_analysis(&mut self, id: &DocumentId, text: &str) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO document_analyses (document_id, extracted_text, text_length, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(document_id) DO UPDATE SET
             extracted_text = excluded.extracted_text,
             text_length = excluded.text_length,
             created_at = excluded.created_at",
            params![
                id.as_str(),
                text,
                text.chars().count() as i64,
                redyce_domain::current_timestamp() as i64,
            ],
        )?;
        Ok(())
    }

    fn insert_requirement(
        &mut self,
        requirement: &Requirement,
    ) -> Result<InsertOutcome, Self::Error> {
        let result = self.conn.execute(
            &format!(
                "INSERT INTO requirements ({})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT(project_id, document_id, content_hash) DO NOTHING",
                REQUIREMENT_COLUMNS
            ),
            params![
                Self::id_to_bytes(requirement.id.value()),
                requirement.project_id.as_str(),
                requirement.document_id.as_str(),
                &requirement.code,
                &requirement.title,
                &requirement.description,
                &requirement.category,
                requirement.priority.as_str(),
                requirement.status.as_str(),
                requirement.source_page.map(|p| p as i64),
                &requirement.source_quote,
                &requirement.content_hash,
                requirement.created_at as i64,
            ],
        );

        match result {
            Ok(0) => Ok(InsertOutcome::Duplicate),
            Ok(_) => Ok(InsertOutcome::Created),
            Err(e) if is_uniqueness_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    fn requirements_for_document(
        &self,
        document_id: &DocumentId,
    ) -> Result<Vec<Requirement>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM requirements WHERE document_id = ?1 ORDER BY created_at, id",
            REQUIREMENT_COLUMNS
        ))?;

        let requirements = stmt
            .query_map(params![document_id.as_str()], Self::row_to_requirement)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(requirements)
    }

    fn record_usage(&mut self, usage: &UsageRecord) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO usage_records
             (user_id, project_id, operation, model, input_tokens, output_tokens, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                usage.user_id.as_str(),
                usage.project_id.as_ref().map(|p| p.as_str()),
                &usage.operation,
                &usage.model,
                usage.input_tokens.map(|t| t as i64),
                usage.output_tokens.map(|t| t as i64),
                usage.created_at as i64,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_bytes_round_trip() {
        let value = RequirementId::new().value();
        let bytes = SqliteStore::id_to_bytes(value);
        assert_eq!(SqliteStore::bytes_to_id(&bytes).unwrap(), value);
    }

    #[test]
    fn test_bytes_to_id_rejects_wrong_length() {
        assert!(matches!(
            SqliteStore::bytes_to_id(&[1, 2, 3]),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_out_of_range_integers_are_rejected() {
        let mut store = SqliteStore::in_memory().unwrap();
        let doc = Document::new(
            DocumentId::new("d1"),
            ProjectId::new("p1"),
            "d1.txt",
            "text/plain",
            b"texte".to_vec(),
        );
        store.insert_document(&doc).unwrap();
        store
            .conn
            .execute("UPDATE documents SET created_at = -1 WHERE id = 'd1'", [])
            .unwrap();

        let result = store.get_document(&doc.id);
        assert!(matches!(
            result,
            Err(StoreError::Database(rusqlite::Error::FromSqlConversionFailure(9, _, _)))
        ));
    }

    #[test]
    fn test_oversized_page_is_rejected() {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO documents (id, project_id, name, mime_type, content, created_at)
                 VALUES ('d1', 'p1', 'd1.txt', 'text/plain', x'00', 1)",
                [],
            )
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO requirements (id, project_id, document_id, title, description,
                     priority, status, source_page, content_hash, created_at)
                 VALUES (?1, 'p1', 'd1', 't', 't', 'LOW', 'A_TRAITER', ?2, 'h', 1)",
                params![
                    SqliteStore::id_to_bytes(RequirementId::new().value()),
                    i64::from(u32::MAX) + 1
                ],
            )
            .unwrap();

        assert!(store
            .requirements_for_document(&DocumentId::new("d1"))
            .is_err());
    }

    #[test]
    fn test_set_status_on_missing_document() {
        let mut store = SqliteStore::in_memory().unwrap();
        let changed = store
            .set_extraction_status(&DocumentId::new("ghost"), &StatusUpdate::Processing)
            .unwrap();
        assert!(!changed);
    }
}

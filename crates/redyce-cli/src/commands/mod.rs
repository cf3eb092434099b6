//! Command implementations.

pub mod backfill;
pub mod documents;
pub mod extract;
pub mod import;
pub mod jobs;
pub mod run;

pub use self::backfill::execute_backfill;
pub use self::documents::{execute_requirements, execute_status};
pub use self::extract::{execute_enqueue, execute_extract, execute_retry};
pub use self::import::execute_import;
pub use self::jobs::execute_jobs;
pub use self::run::execute_run;

use redyce_extractor::RequirementExtractor;
use redyce_store::SqliteStore;
use redyce_text::DocumentTextExtractor;
use std::sync::{Mutex, MutexGuard};

/// Extraction job over the SQLite store, generic over the completion client
pub type Extractor<L> = RequirementExtractor<L, DocumentTextExtractor, SqliteStore>;

/// Lock the shared store, recovering from a poisoned lock
pub(crate) fn lock(store: &Mutex<SqliteStore>) -> MutexGuard<'_, SqliteStore> {
    store.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Extractor;
    use redyce_domain::traits::ExtractionStore;
    use redyce_domain::{Document, DocumentId, ProjectId};
    use redyce_extractor::ExtractorConfig;
    use redyce_llm::MockProvider;
    use redyce_store::SqliteStore;
    use redyce_text::DocumentTextExtractor;
    use std::sync::Arc;

    pub const TENDER_TEXT: &str = "Le titulaire fournit une attestation d'assurance \
responsabilité civile et décennale, ainsi qu'un planning détaillé des travaux.";

    pub fn text_document(id: &str, project: &str) -> Document {
        Document::new(
            DocumentId::new(id),
            ProjectId::new(project),
            format!("{}.txt", id),
            "text/plain",
            TENDER_TEXT.as_bytes().to_vec(),
        )
    }

    pub fn extractor(llm: MockProvider, documents: &[Document]) -> Arc<Extractor<MockProvider>> {
        let mut store = SqliteStore::in_memory().unwrap();
        for document in documents {
            store.insert_document(document).unwrap();
        }
        Arc::new(Extractor::new(
            llm,
            DocumentTextExtractor::new(),
            store,
            ExtractorConfig::default(),
        ))
    }
}

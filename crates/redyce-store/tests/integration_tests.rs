//! Integration tests for redyce-store
//!
//! These tests cover document status transitions, candidate selection and
//! the requirement uniqueness key.

use redyce_domain::traits::ExtractionStore;
use redyce_domain::{
    content_hash, Document, DocumentId, DocumentKind, ExtractionStatus, InsertOutcome, ProjectId,
    Requirement, RequirementId, RequirementPriority, RequirementStatus, StatusUpdate, UsageRecord,
    UserId,
};
use redyce_store::SqliteStore;

fn document(id: &str, project: &str) -> Document {
    Document::new(
        DocumentId::new(id),
        ProjectId::new(project),
        format!("{}.pdf", id),
        "application/pdf",
        b"%PDF-1.5".to_vec(),
    )
}

fn requirement(doc: &Document, title: &str) -> Requirement {
    Requirement {
        id: RequirementId::new(),
        project_id: doc.project_id.clone(),
        document_id: doc.id.clone(),
        code: Some("ART-1".to_string()),
        title: title.to_string(),
        description: format!("{} in detail", title),
        category: None,
        priority: RequirementPriority::Low,
        status: RequirementStatus::ATraiter,
        source_page: Some(3),
        source_quote: Some("Le titulaire doit...".to_string()),
        content_hash: content_hash(&doc.project_id, &doc.id, title),
        created_at: 1000,
    }
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::in_memory();
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_insert_and_get_document() {
    let mut store = SqliteStore::in_memory().unwrap();
    let doc = document("d1", "p1").with_kind(DocumentKind::Cctp);

    store.insert_document(&doc).unwrap();
    let loaded = store.get_document(&doc.id).unwrap();

    assert_eq!(loaded, Some(doc));
    assert!(store.get_document(&DocumentId::new("missing")).unwrap().is_none());
}

#[test]
fn test_status_transitions_write_side_fields() {
    let mut store = SqliteStore::in_memory().unwrap();
    let doc = document("d1", "p1");
    store.insert_document(&doc).unwrap();

    store
        .set_extraction_status(
            &doc.id,
            &StatusUpdate::Error {
                message: "boom".to_string(),
            },
        )
        .unwrap();
    let loaded = store.get_document(&doc.id).unwrap().unwrap();
    assert_eq!(loaded.requirement_status, Some(ExtractionStatus::Error));
    assert_eq!(loaded.requirement_error_message.as_deref(), Some("boom"));

    store
        .set_extraction_status(&doc.id, &StatusUpdate::Waiting)
        .unwrap();
    let loaded = store.get_document(&doc.id).unwrap().unwrap();
    assert_eq!(loaded.requirement_status, Some(ExtractionStatus::Waiting));
    assert!(loaded.requirement_error_message.is_none());

    store
        .set_extraction_status(&doc.id, &StatusUpdate::Done { processed_at: 1234 })
        .unwrap();
    let loaded = store.get_document(&doc.id).unwrap().unwrap();
    assert_eq!(loaded.requirement_status, Some(ExtractionStatus::Done));
    assert_eq!(loaded.requirement_processed_at, Some(1234));
}

#[test]
fn test_find_extraction_candidates() {
    let mut store = SqliteStore::in_memory().unwrap();
    for (id, project) in [("fresh", "p1"), ("waiting", "p1"), ("done", "p1"), ("failed", "p1"), ("other", "p2")] {
        store.insert_document(&document(id, project)).unwrap();
    }
    store
        .set_extraction_status(&DocumentId::new("waiting"), &StatusUpdate::Waiting)
        .unwrap();
    store
        .set_extraction_status(&DocumentId::new("done"), &StatusUpdate::Done { processed_at: 1 })
        .unwrap();
    store
        .set_extraction_status(
            &DocumentId::new("failed"),
            &StatusUpdate::Error {
                message: "x".to_string(),
            },
        )
        .unwrap();

    let p1 = ProjectId::new("p1");
    let mut candidates = store.find_extraction_candidates(Some(&p1), false).unwrap();
    candidates.sort();
    assert_eq!(candidates, vec![DocumentId::new("fresh"), DocumentId::new("waiting")]);

    let with_failed = store.find_extraction_candidates(Some(&p1), true).unwrap();
    assert_eq!(with_failed.len(), 3);
    assert!(with_failed.contains(&DocumentId::new("failed")));

    let everywhere = store.find_extraction_candidates(None, false).unwrap();
    assert_eq!(everywhere.len(), 3);
}

#[test]
fn test_duplicate_requirement_detection() {
    let mut store = SqliteStore::in_memory().unwrap();
    let doc = document("d1", "p1");
    store.insert_document(&doc).unwrap();

    let first = requirement(&doc, "Fournir un planning");
    let again = requirement(&doc, "  FOURNIR   un planning ");

    assert_eq!(store.insert_requirement(&first).unwrap(), InsertOutcome::Created);
    assert_eq!(store.insert_requirement(&again).unwrap(), InsertOutcome::Duplicate);
    assert_eq!(store.count_requirements(&doc.id).unwrap(), 1);

    let stored = store.requirements_for_document(&doc.id).unwrap();
    assert_eq!(stored, vec![first]);
}

#[test]
fn test_same_title_in_other_document_is_not_duplicate() {
    let mut store = SqliteStore::in_memory().unwrap();
    let a = document("a", "p1");
    let b = document("b", "p1");
    store.insert_document(&a).unwrap();
    store.insert_document(&b).unwrap();

    assert_eq!(
        store.insert_requirement(&requirement(&a, "Title")).unwrap(),
        InsertOutcome::Created
    );
    assert_eq!(
        store.insert_requirement(&requirement(&b, "Title")).unwrap(),
        InsertOutcome::Created
    );
}

#[test]
fn test_cached_analysis_round_trip() {
    let mut store = SqliteStore::in_memory().unwrap();
    let doc = document("d1", "p1");
    store.insert_document(&doc).unwrap();

    assert!(store.get_cached_analysis(&doc.id).unwrap().is_none());
    store.save_cached_analysis(&doc.id, "first").unwrap();
    store.save_cached_analysis(&doc.id, "second").unwrap();
    assert_eq!(
        store.get_cached_analysis(&doc.id).unwrap().as_deref(),
        Some("second")
    );
}

#[test]
fn test_record_usage() {
    let mut store = SqliteStore::in_memory().unwrap();
    let usage = UsageRecord {
        user_id: UserId::new("u1"),
        project_id: Some(ProjectId::new("p1")),
        operation: "requirement_extraction".to_string(),
        model: "llama3.1".to_string(),
        input_tokens: Some(1200),
        output_tokens: None,
        created_at: 99,
    };

    store.record_usage(&usage).unwrap();
    assert_eq!(store.usage_records().unwrap(), vec![usage]);
}

#[test]
fn test_file_backed_store_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("redyce.db");
    let doc = document("d1", "p1");

    {
        let mut store = SqliteStore::new(&path).unwrap();
        store.insert_document(&doc).unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    let listed = store.list_documents(Some(&ProjectId::new("p1"))).unwrap();
    assert_eq!(listed, vec![doc.summary()]);
}

#[test]
fn test_reimport_keeps_requirements_and_status() {
    let mut store = SqliteStore::in_memory().unwrap();
    let doc = document("d1", "p1");
    store.insert_document(&doc).unwrap();
    store.save_cached_analysis(&doc.id, "Article 1").unwrap();
    store.insert_requirement(&requirement(&doc, "Foo")).unwrap();
    store
        .set_extraction_status(&doc.id, &StatusUpdate::Done { processed_at: 7 })
        .unwrap();

    let renamed = Document {
        name: "d1-v2.pdf".to_string(),
        ..doc.clone()
    };
    store.insert_document(&renamed).unwrap();

    assert_eq!(store.count_requirements(&doc.id).unwrap(), 1);
    assert_eq!(
        store.get_cached_analysis(&doc.id).unwrap().as_deref(),
        Some("Article 1")
    );
    let loaded = store.get_document(&doc.id).unwrap().unwrap();
    assert_eq!(loaded.name, "d1-v2.pdf");
    assert_eq!(loaded.requirement_status, Some(ExtractionStatus::Done));
    assert_eq!(loaded.requirement_processed_at, Some(7));
}

#[test]
fn test_reimport_with_new_bytes_drops_cached_analysis() {
    let mut store = SqliteStore::in_memory().unwrap();
    let doc = document("d1", "p1");
    store.insert_document(&doc).unwrap();
    store.save_cached_analysis(&doc.id, "old text").unwrap();
    store.insert_requirement(&requirement(&doc, "Foo")).unwrap();

    let updated = Document {
        content: b"%PDF-1.7 revised".to_vec(),
        ..doc.clone()
    };
    store.insert_document(&updated).unwrap();

    assert!(store.get_cached_analysis(&doc.id).unwrap().is_none());
    assert_eq!(store.count_requirements(&doc.id).unwrap(), 1);
    assert_eq!(
        store.get_document(&doc.id).unwrap().unwrap().content,
        b"%PDF-1.7 revised"
    );
}

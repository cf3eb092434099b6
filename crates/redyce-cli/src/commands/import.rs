//! Import command implementation.

use super::lock;
use crate::cli::ImportArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use redyce_domain::traits::ExtractionStore;
use redyce_domain::{Document, DocumentId, DocumentKind, ProjectId};
use redyce_store::SqliteStore;
use std::fs;
use std::sync::Mutex;
use tracing::debug;

/// Fallback when the extension does not identify the file
const DEFAULT_MIME: &str = "application/octet-stream";

/// Execute the import command.
pub fn execute_import(
    args: ImportArgs,
    store: &Mutex<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let document = build_document(&args)?;
    debug!(
        document_id = %document.id,
        mime_type = %document.mime_type,
        bytes = document.content.len(),
        "Importing document"
    );

    lock(store).insert_document(&document)?;

    println!(
        "{}",
        formatter.success(&format!(
            "Imported {} into {} as {}",
            document.name, document.project_id, document.id
        ))
    );
    Ok(())
}

fn build_document(args: &ImportArgs) -> Result<Document> {
    let name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            CliError::InvalidInput(format!("Not a file path: {}", args.file.display()))
        })?
        .to_string();

    let content = fs::read(&args.file)?;

    let mime_type = match &args.mime {
        Some(mime) => mime.clone(),
        None => mime_guess::from_path(&args.file)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_MIME.to_string()),
    };

    let id = args
        .id
        .clone()
        .unwrap_or_else(|| format!("{}/{}", args.project, name));

    let document = Document::new(
        DocumentId::new(id),
        ProjectId::new(args.project.as_str()),
        name,
        mime_type,
        content,
    );

    Ok(match args.doc_type.as_deref() {
        Some(kind) => document.with_kind(DocumentKind::parse(kind)),
        None => document,
    })
}

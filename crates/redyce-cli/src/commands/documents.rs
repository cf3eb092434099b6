//! Status and requirements commands.

use super::lock;
use crate::cli::{DocumentArgs, StatusArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use redyce_domain::traits::ExtractionStore;
use redyce_domain::{DocumentId, ProjectId};
use redyce_store::SqliteStore;
use std::sync::Mutex;

/// Execute the status command.
pub fn execute_status(
    args: StatusArgs,
    store: &Mutex<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let project_id = args.project.map(ProjectId::new);
    let documents = lock(store).list_documents(project_id.as_ref())?;
    println!("{}", formatter.format_documents(&documents)?);
    Ok(())
}

/// Execute the requirements command.
pub fn execute_requirements(
    args: DocumentArgs,
    store: &Mutex<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let document_id = DocumentId::new(args.document);
    let store = lock(store);
    if store.get_document(&document_id)?.is_none() {
        return Err(CliError::NotFound(format!("document {}", document_id)));
    }
    let requirements = store.requirements_for_document(&document_id)?;
    drop(store);

    println!("{}", formatter.format_requirements(&requirements)?);
    Ok(())
}

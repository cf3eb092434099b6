//! Single-document commands: enqueue, retry and extract.

use super::Extractor;
use crate::cli::{DocumentArgs, ExtractArgs};
use crate::error::Result;
use crate::output::Formatter;
use redyce_domain::traits::CompletionClient;
use redyce_domain::{DocumentId, UserId};
use std::fmt::Display;

/// Execute the enqueue command.
pub fn execute_enqueue<L>(
    args: DocumentArgs,
    extractor: &Extractor<L>,
    formatter: &Formatter,
) -> Result<()>
where
    L: CompletionClient + Send + Sync + 'static,
    L::Error: Display,
{
    let document_id = DocumentId::new(args.document);
    if extractor.enqueue_document(&document_id)? {
        println!("{}", formatter.success(&format!("Queued {}", document_id)));
    } else {
        println!(
            "{}",
            formatter.info(&format!("{} is already processed or in progress", document_id))
        );
    }
    Ok(())
}

/// Execute the retry command.
pub fn execute_retry<L>(
    args: DocumentArgs,
    extractor: &Extractor<L>,
    formatter: &Formatter,
) -> Result<()>
where
    L: CompletionClient + Send + Sync + 'static,
    L::Error: Display,
{
    let document_id = DocumentId::new(args.document);
    if extractor.requeue_failed(&document_id)? {
        println!("{}", formatter.success(&format!("Requeued {}", document_id)));
    } else {
        println!(
            "{}",
            formatter.warning(&format!("{} has not failed; nothing to retry", document_id))
        );
    }
    Ok(())
}

/// Execute the extract command.
pub async fn execute_extract<L>(
    args: ExtractArgs,
    extractor: &Extractor<L>,
    formatter: &Formatter,
) -> Result<()>
where
    L: CompletionClient + Send + Sync + 'static,
    L::Error: Display,
{
    let outcome = extractor
        .extract_for_document(&DocumentId::new(args.document), &UserId::new(args.user))
        .await;
    println!("{}", formatter.format_outcome(&outcome)?);
    Ok(())
}

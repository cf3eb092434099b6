//! Requirement content fingerprints
//!
//! The fingerprint is the sole deduplication key for requirements. Two titles
//! that differ only in case or whitespace collide on purpose; titles that are
//! worded differently never do, even when they mean the same thing.

use crate::ids::{DocumentId, ProjectId};
use sha2::{Digest, Sha256};

/// Length of a content hash in hex characters
pub const CONTENT_HASH_LENGTH: usize = 32;

const DELIMITER: char = '|';

/// Normalize a requirement title: lowercase, trimmed, inner whitespace
/// collapsed to single spaces
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compute the deduplication fingerprint of a requirement
///
/// # Examples
///
/// ```
/// use redyce_domain::{content_hash, DocumentId, ProjectId};
///
/// let p = ProjectId::new("p1");
/// let d = DocumentId::new("d1");
/// assert_eq!(content_hash(&p, &d, "Foo   Bar"), content_hash(&p, &d, "foo bar"));
/// assert_eq!(content_hash(&p, &d, "Foo").len(), 32);
/// ```
pub fn content_hash(project_id: &ProjectId, document_id: &DocumentId, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(project_id.as_str().as_bytes());
    hasher.update([DELIMITER as u8]);
    hasher.update(document_id.as_str().as_bytes());
    hasher.update([DELIMITER as u8]);
    hasher.update(normalize_title(title).as_bytes());

    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(CONTENT_HASH_LENGTH);
    digest
}

//! Requirement module - obligations extracted from tender documents

use crate::ids::{DocumentId, ProjectId, RequirementId, UserId};
use std::fmt;

/// Importance of a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequirementPriority {
    /// Default for anything uncertain
    Low,
    /// Medium importance
    Med,
    /// High importance
    High,
}

impl RequirementPriority {
    /// Get the priority name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementPriority::Low => "LOW",
            RequirementPriority::Med => "MED",
            RequirementPriority::High => "HIGH",
        }
    }
}

impl fmt::Display for RequirementPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a free-form priority label
///
/// Only `HIGH`, `MED` and `MEDIUM` (case-insensitive, surrounding whitespace
/// ignored) are recognized. Everything else, including an absent value,
/// collapses to `Low`.
///
/// # Examples
///
/// ```
/// use redyce_domain::{normalize_priority, RequirementPriority};
///
/// assert_eq!(normalize_priority(Some("high")), RequirementPriority::High);
/// assert_eq!(normalize_priority(Some("Medium")), RequirementPriority::Med);
/// assert_eq!(normalize_priority(Some("urgent")), RequirementPriority::Low);
/// assert_eq!(normalize_priority(None), RequirementPriority::Low);
/// ```
pub fn normalize_priority(value: Option<&str>) -> RequirementPriority {
    match value.map(|v| v.trim().to_uppercase()).as_deref() {
        Some("HIGH") => RequirementPriority::High,
        Some("MED") | Some("MEDIUM") => RequirementPriority::Med,
        _ => RequirementPriority::Low,
    }
}

/// Workflow status of a requirement in the surrounding application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RequirementStatus {
    /// To be handled (initial status of every extracted requirement)
    #[default]
    ATraiter,
    /// Being handled
    EnCours,
    /// Handled
    Traite,
    /// Not applicable to this tender
    NonApplicable,
}

impl RequirementStatus {
    /// Get the status name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementStatus::ATraiter => "A_TRAITER",
            RequirementStatus::EnCours => "EN_COURS",
            RequirementStatus::Traite => "TRAITE",
            RequirementStatus::NonApplicable => "NON_APPLICABLE",
        }
    }

    /// Parse a stored status name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A_TRAITER" => Some(RequirementStatus::ATraiter),
            "EN_COURS" => Some(RequirementStatus::EnCours),
            "TRAITE" => Some(RequirementStatus::Traite),
            "NON_APPLICABLE" => Some(RequirementStatus::NonApplicable),
            _ => None,
        }
    }
}

impl RequirementPriority {
    /// Parse a stored priority name (strict, unlike [`normalize_priority`])
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(RequirementPriority::Low),
            "MED" => Some(RequirementPriority::Med),
            "HIGH" => Some(RequirementPriority::High),
            _ => None,
        }
    }
}

/// One actionable obligation extracted from a document
///
/// `(project_id, document_id, content_hash)` is unique. Requirements are
/// only ever created by the extraction job and never overwritten by a
/// later run.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    /// Unique identifier
    pub id: RequirementId,
    /// Owning project
    pub project_id: ProjectId,
    /// Source document
    pub document_id: DocumentId,
    /// Optional human-readable code (e.g. article number)
    pub code: Option<String>,
    /// Short title
    pub title: String,
    /// Long description
    pub description: String,
    /// Optional category
    pub category: Option<String>,
    /// Normalized priority
    pub priority: RequirementPriority,
    /// Workflow status
    pub status: RequirementStatus,
    /// Page of the source document the requirement was found on
    pub source_page: Option<u32>,
    /// Verbatim quote from the source document
    pub source_quote: Option<String>,
    /// Deduplication fingerprint, see [`crate::content_hash`]
    pub content_hash: String,
    /// Creation time (seconds since epoch)
    pub created_at: u64,
}

/// Result of an insert-if-absent on the requirement uniqueness key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written
    Created,
    /// A requirement with the same key already exists; nothing was written
    Duplicate,
}

/// Token usage attributed to a user, for cost tracking
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    /// User the work was done for
    pub user_id: UserId,
    /// Project, if the work was project-scoped
    pub project_id: Option<ProjectId>,
    /// Operation name (e.g. `requirement_extraction`)
    pub operation: String,
    /// Model that served the request
    pub model: String,
    /// Prompt tokens, when reported
    pub input_tokens: Option<u64>,
    /// Completion tokens, when reported
    pub output_tokens: Option<u64>,
    /// Time of the request (seconds since epoch)
    pub created_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_priority_recognized_values() {
        assert_eq!(normalize_priority(Some("HIGH")), RequirementPriority::High);
        assert_eq!(normalize_priority(Some("high")), RequirementPriority::High);
        assert_eq!(normalize_priority(Some("MED")), RequirementPriority::Med);
        assert_eq!(normalize_priority(Some("medium")), RequirementPriority::Med);
        assert_eq!(normalize_priority(Some(" Medium ")), RequirementPriority::Med);
    }

    #[test]
    fn test_normalize_priority_defaults_to_low() {
        assert_eq!(normalize_priority(Some("urgent")), RequirementPriority::Low);
        assert_eq!(normalize_priority(Some("")), RequirementPriority::Low);
        assert_eq!(normalize_priority(Some("HIGHEST")), RequirementPriority::Low);
        assert_eq!(normalize_priority(None), RequirementPriority::Low);
    }

    #[test]
    fn test_default_status_is_a_traiter() {
        assert_eq!(RequirementStatus::default(), RequirementStatus::ATraiter);
        assert_eq!(RequirementStatus::default().as_str(), "A_TRAITER");
    }

    #[test]
    fn test_status_names_parse_back() {
        for status in [
            RequirementStatus::ATraiter,
            RequirementStatus::EnCours,
            RequirementStatus::Traite,
            RequirementStatus::NonApplicable,
        ] {
            assert_eq!(RequirementStatus::parse(status.as_str()), Some(status));
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: anything that is not a recognized label normalizes to LOW
        #[test]
        fn test_unrecognized_priority_is_low(label in "[a-zA-Z ]{0,12}") {
            let upper = label.trim().to_uppercase();
            prop_assume!(upper != "HIGH" && upper != "MED" && upper != "MEDIUM");
            prop_assert_eq!(normalize_priority(Some(&label)), RequirementPriority::Low);
        }
    }
}

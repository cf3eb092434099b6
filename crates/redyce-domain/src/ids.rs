//! Identifier types
//!
//! Documents, projects and users are owned by the surrounding application and
//! arrive as opaque strings. Requirements and jobs are minted here as UUIDv7.

use std::fmt;

macro_rules! external_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Wrap an identifier issued by the surrounding application
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

external_id!(
    /// Identifier of an uploaded source document
    DocumentId
);
external_id!(
    /// Identifier of a tender project
    ProjectId
);
external_id!(
    /// Identifier of the user on whose behalf work is done (usage attribution)
    UserId
);

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an identifier from a raw u128 value (storage deserialization)
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse an identifier from its hyphenated UUID form
            pub fn from_string(s: &str) -> Result<Self, String> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| format!("Invalid UUID string: {}", e))
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }
    };
}

uuid_id!(
    /// Unique identifier of an extracted requirement
    RequirementId
);
uuid_id!(
    /// Unique identifier of a coordinated job
    JobId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_id_display() {
        let id = DocumentId::new("doc-42");
        assert_eq!(id.to_string(), "doc-42");
        assert_eq!(id.as_str(), "doc-42");
        assert_eq!(DocumentId::from("doc-42"), id);
    }

    #[test]
    fn test_job_ids_are_chronological() {
        let first = JobId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = JobId::new();
        assert!(first < second);
    }

    #[test]
    fn test_requirement_id_display_and_parse() {
        let id = RequirementId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(RequirementId::from_string(&text).unwrap(), id);
        assert!(RequirementId::from_string("not-a-uuid").is_err());
    }
}

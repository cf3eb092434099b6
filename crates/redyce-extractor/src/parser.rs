//! Decode model output into requirement candidates

use crate::error::ExtractorError;
use crate::types::{RequirementCandidate, RequirementsPayload};
use tracing::{debug, warn};

/// Parse a completion into requirement candidates
///
/// The reply is decoded strictly against the expected schema. When the
/// whole payload does not decode (prose around the JSON), the first
/// balanced top-level object is tried instead. Candidates whose title is
/// blank are dropped.
pub(crate) fn parse_requirements(response: &str) -> Result<Vec<RequirementCandidate>, ExtractorError> {
    let body = strip_code_fence(response);

    let payload = match serde_json::from_str::<RequirementsPayload>(body) {
        Ok(payload) => payload,
        Err(whole_err) => {
            let object = first_object(body).ok_or_else(|| {
                ExtractorError::InvalidResponse(format!("no JSON object found: {}", whole_err))
            })?;
            debug!("Decoding embedded JSON object from completion");
            serde_json::from_str::<RequirementsPayload>(object)
                .map_err(|e| ExtractorError::InvalidResponse(e.to_string()))?
        }
    };

    let mut candidates = Vec::with_capacity(payload.requirements.len());
    for (idx, mut candidate) in payload.requirements.into_iter().enumerate() {
        let title = candidate.title.trim();
        if title.is_empty() {
            warn!(index = idx, "Dropping requirement with empty title");
            continue;
        }
        candidate.title = title.to_string();
        candidates.push(candidate);
    }
    Ok(candidates)
}

/// Remove a surrounding Markdown code fence
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json)
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// First balanced `{...}` in `text`, ignoring braces inside strings
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_payload() {
        let response = r#"{"requirements":[{"title":"Fournir un planning","priority":"HIGH","page":3}]}"#;
        let candidates = parse_requirements(response).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Fournir un planning");
        assert_eq!(candidates[0].priority.as_deref(), Some("HIGH"));
        assert_eq!(candidates[0].page, Some(3));
        assert!(candidates[0].description.is_none());
    }

    #[test]
    fn test_parse_fenced_payload() {
        let response = "```json\n{\"requirements\":[{\"title\":\"Visite du site\"}]}\n```";
        let candidates = parse_requirements(response).unwrap();
        assert_eq!(candidates[0].title, "Visite du site");
    }

    #[test]
    fn test_parse_object_inside_prose() {
        let response = r#"Voici les exigences : {"requirements":[{"title":"Clause {A}","quote":"voir \"art. 4\""}]} Bonne lecture."#;
        let candidates = parse_requirements(response).unwrap();
        assert_eq!(candidates[0].title, "Clause {A}");
        assert_eq!(candidates[0].quote.as_deref(), Some("voir \"art. 4\""));
    }

    #[test]
    fn test_empty_titles_dropped() {
        let response = r#"{"requirements":[{"title":"  "},{"title":" Garantie décennale "}]}"#;
        let candidates = parse_requirements(response).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Garantie décennale");
    }

    #[test]
    fn test_not_json_is_invalid() {
        let err = parse_requirements("I could not find anything.").unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidResponse(_)));
    }

    #[test]
    fn test_wrong_shape_is_invalid() {
        let err = parse_requirements(r#"[{"title":"a"}]"#).unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidResponse(_)));

        let err = parse_requirements(r#"{"requirements":[{"priority":"LOW"}]}"#).unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidResponse(_)));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let response = r#"{"requirements":[{"title":"a","confidence":0.4}],"notes":"x"}"#;
        assert_eq!(parse_requirements(response).unwrap().len(), 1);
    }

    #[test]
    fn test_first_object_unbalanced() {
        assert_eq!(first_object("{\"a\": {"), None);
        assert_eq!(first_object("x {\"a\":1} {\"b\":2}"), Some("{\"a\":1}"));
    }
}

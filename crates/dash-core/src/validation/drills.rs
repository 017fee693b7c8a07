//! Drill definition checks

use crate::error::CommandError;

const ATTRIBUTE_TITLE_OPEN: &str = "{attribute_title(";
const ATTRIBUTE_TITLE_CLOSE: &str = ")}";

/// Extract the display form identifiers referenced by `{attribute_title(<identifier>)}`
/// placeholders of a custom drill URL
///
/// Other placeholders are left alone. An unterminated or empty placeholder is a user error.
pub fn validate_drill_custom_url(url: &str) -> Result<Vec<String>, CommandError> {
    if url.trim().is_empty() {
        return Err(CommandError::user("custom drill URL is empty"));
    }

    let mut identifiers = Vec::new();
    let mut rest = url;
    while let Some(start) = rest.find(ATTRIBUTE_TITLE_OPEN) {
        let after = &rest[start + ATTRIBUTE_TITLE_OPEN.len()..];
        let end = after.find(ATTRIBUTE_TITLE_CLOSE).ok_or_else(|| {
            CommandError::user(format!("unterminated attribute_title placeholder in '{}'", url))
        })?;

        let identifier = after[..end].trim();
        if identifier.is_empty() {
            return Err(CommandError::user(format!("empty attribute_title placeholder in '{}'", url)));
        }
        if !identifiers.iter().any(|known: &String| known == identifier) {
            identifiers.push(identifier.to_string());
        }
        rest = &after[end + ATTRIBUTE_TITLE_CLOSE.len()..];
    }
    Ok(identifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_placeholders() {
        let ids = validate_drill_custom_url(
            "https://example.com/?r={attribute_title(label.region)}&c={attribute_title(label.city)}&p={project_id}&again={attribute_title(label.region)}",
        )
        .unwrap();

        assert_eq!(ids, vec!["label.region".to_string(), "label.city".to_string()]);
    }

    #[test]
    fn test_rejects_broken_placeholders() {
        assert!(validate_drill_custom_url("https://x/{attribute_title(label.region").is_err());
        assert!(validate_drill_custom_url("https://x/{attribute_title()}").is_err());
        assert!(validate_drill_custom_url("  ").is_err());
        assert!(validate_drill_custom_url("https://x/").unwrap().is_empty());
    }
}

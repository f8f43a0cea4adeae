//! Input validation for identifiers, content, and metrics.

use crate::{Error, Result};
use std::collections::BTreeMap;

/// Maximum length of a prompt id or label name, in characters.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Characters allowed in identifiers besides ASCII alphanumerics.
const IDENTIFIER_PUNCTUATION: &[char] = &['_', '-', '.', ':', '/'];

fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("{kind} must not be empty")));
    }
    if value.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(Error::InvalidInput(format!(
            "{kind} '{value}' exceeds {MAX_IDENTIFIER_LENGTH} characters"
        )));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !IDENTIFIER_PUNCTUATION.contains(c))
    {
        return Err(Error::InvalidInput(format!(
            "{kind} '{value}' contains disallowed character {bad:?}"
        )));
    }
    Ok(())
}

/// Validates a prompt identifier.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the id is empty, longer than
/// [`MAX_IDENTIFIER_LENGTH`], or contains characters other than ASCII
/// alphanumerics and `_ - . : /`.
pub fn validate_prompt_id(prompt_id: &str) -> Result<()> {
    validate_identifier("prompt id", prompt_id)
}

/// Validates a label name.
///
/// Same rules as [`validate_prompt_id`]. Names that read as a zero or
/// negative integer are rejected because they could never be referenced:
/// such text parses as an invalid version number.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for malformed names.
pub fn validate_label_name(label: &str) -> Result<()> {
    validate_identifier("label name", label)?;
    if label.parse::<i64>().is_ok_and(|n| n <= 0) {
        return Err(Error::InvalidInput(format!(
            "label name '{label}' is a non-positive number"
        )));
    }
    Ok(())
}

/// Validates prompt content.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the content is empty or whitespace only.
pub fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::InvalidInput(
            "prompt content must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates metric names and values.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for empty metric names or non-finite values.
pub fn validate_metrics(metrics: &BTreeMap<String, f64>) -> Result<()> {
    for (name, value) in metrics {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "metric name must not be empty".to_string(),
            ));
        }
        if !value.is_finite() {
            return Err(Error::InvalidInput(format!(
                "metric '{name}' must be a finite number, got {value}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("onboarding_email" ; "snake case")]
    #[test_case("team/support-reply" ; "namespaced")]
    #[test_case("v1.2:final" ; "dotted with colon")]
    fn test_valid_prompt_ids(id: &str) {
        assert!(validate_prompt_id(id).is_ok());
    }

    #[test_case("" ; "empty")]
    #[test_case("has space" ; "whitespace")]
    #[test_case("tab\tinside" ; "control character")]
    #[test_case("émoji" ; "non ascii")]
    fn test_invalid_prompt_ids(id: &str) {
        assert!(matches!(validate_prompt_id(id), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_prompt_id_length_limit() {
        let at_limit = "a".repeat(MAX_IDENTIFIER_LENGTH);
        assert!(validate_prompt_id(&at_limit).is_ok());

        let over = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(validate_prompt_id(&over).is_err());
    }

    #[test_case("prod", true ; "plain name")]
    #[test_case("2", true ; "positive digit string")]
    #[test_case("0", false ; "zero")]
    #[test_case("-1", false ; "negative")]
    #[test_case("", false ; "empty")]
    fn test_label_names(label: &str, ok: bool) {
        assert_eq!(validate_label_name(label).is_ok(), ok);
    }

    #[test]
    fn test_content_validation() {
        assert!(validate_content("Write an email.").is_ok());
        assert!(validate_content("").is_err());
        assert!(validate_content("  \n\t").is_err());
    }

    #[test]
    fn test_metrics_validation() {
        let mut metrics = BTreeMap::new();
        metrics.insert("score".to_string(), 0.7);
        assert!(validate_metrics(&metrics).is_ok());

        metrics.insert("latency".to_string(), f64::NAN);
        assert!(validate_metrics(&metrics).is_err());

        let mut metrics = BTreeMap::new();
        metrics.insert(" ".to_string(), 1.0);
        assert!(validate_metrics(&metrics).is_err());
    }
}

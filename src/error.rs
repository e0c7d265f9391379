//! Error types for parsing, validation, and file conversion.
//!
//! Two failure kinds exist at the core: [`ParseError`] for malformed legacy
//! text (fatal, aborts at the offending line) and [`ValidationErrors`] for
//! structured input that is well-formed as a tree but violates schema or
//! cross-field rules (collected exhaustively, document construction is
//! all-or-nothing). [`ConfigError`] unifies both with the I/O and decode
//! failures of the file-conversion surface.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single schema or cross-field rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the invalid field (e.g., "devices[2].label").
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl ValidationError {
    /// Create a violation at `path` with the given message.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in one validation pass.
///
/// This error means no document was produced; the list covers the whole
/// tree, not just the first problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Number of collected violations.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when no violations were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over the collected violations.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Consume into the underlying list.
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{} validation error(s): {}", self.errors.len(), joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Fatal failure while parsing legacy configuration text.
///
/// Parsing aborts at the first malformed line rather than skipping it; a
/// silently dropped directive could leave a hardware configuration
/// dangerously incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message} (in {content:?})")]
pub struct ParseError {
    /// 1-based line number of the offending line.
    pub line: usize,
    /// The offending line, whitespace trimmed.
    pub content: String,
    /// What went wrong.
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, content: &str, message: impl Into<String>) -> Self {
        Self {
            line,
            content: content.to_string(),
            message: message.into(),
        }
    }
}

/// Errors produced by the conversion surface.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Legacy text was lexically or structurally malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The document tree violated schema or cross-field rules.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Failed to read or write a file.
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        /// File that could not be accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension does not name a known format.
    #[error("Unsupported file format {extension:?} for {}", path.display())]
    UnsupportedFormat {
        /// Path whose extension was inspected.
        path: PathBuf,
        /// The unrecognized extension (lowercased, may be empty).
        extension: String,
    },

    /// Input was not decodable as JSON.
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Input was not decodable as YAML.
    #[error("Malformed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_includes_path() {
        let err = ValidationError::new("devices[0].label", "Label must not be empty");
        assert_eq!(err.to_string(), "devices[0].label: Label must not be empty");
    }

    #[test]
    fn test_validation_errors_display_joins_all() {
        let errors = ValidationErrors::from(vec![
            ValidationError::new("a", "first"),
            ValidationError::new("b", "second"),
        ]);
        let text = errors.to_string();
        assert!(text.starts_with("2 validation error(s)"));
        assert!(text.contains("a: first"));
        assert!(text.contains("b: second"));
    }

    #[test]
    fn test_parse_error_display_includes_line_and_content() {
        let err = ParseError::new(7, "Bogus,Camera", "unrecognized directive \"Bogus\"");
        let text = err.to_string();
        assert!(text.contains("line 7"));
        assert!(text.contains("Bogus,Camera"));
    }
}

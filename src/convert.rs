//! File-level conversion between the legacy and structured formats.
//!
//! The format of a file is decided by its extension: `.cfg` is the legacy
//! line format, `.json` and `.yaml`/`.yml` are the structured document
//! surfaces. Every path through this module parses into a validated
//! [`Document`], so converting also lints the input.

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::legacy;
use crate::schema::Document;

/// On-disk formats a document can be read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Legacy line-oriented `.cfg` text
    Legacy,
    /// Structured JSON
    Json,
    /// Structured YAML
    Yaml,
}

impl DocumentFormat {
    /// Decide the format from a file extension, case-insensitively.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let format = DocumentFormat::from_path(Path::new("scope.cfg"))?;
    /// assert_eq!(format, DocumentFormat::Legacy);
    /// ```
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "cfg" => Ok(DocumentFormat::Legacy),
            "json" => Ok(DocumentFormat::Json),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Parse a document from text in the given format.
pub fn document_from_str(text: &str, format: DocumentFormat) -> Result<Document, ConfigError> {
    match format {
        DocumentFormat::Legacy => legacy::parse(text),
        DocumentFormat::Json => Document::from_json_str(text),
        DocumentFormat::Yaml => Document::from_yaml_str(text),
    }
}

/// Render a document as text in the given format.
pub fn document_to_string(
    document: &Document,
    format: DocumentFormat,
) -> Result<String, ConfigError> {
    match format {
        DocumentFormat::Legacy => Ok(legacy::serialize(document)),
        DocumentFormat::Json => document.to_json_string(),
        DocumentFormat::Yaml => document.to_yaml_string(),
    }
}

/// Read and validate a configuration file, deciding the format from the
/// extension.
pub fn read_document(path: &Path) -> Result<Document, ConfigError> {
    let format = DocumentFormat::from_path(path)?;
    debug!(path = %path.display(), ?format, "Reading configuration");
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    document_from_str(&text, format)
}

/// Write a document to a file, deciding the format from the extension.
pub fn write_document(document: &Document, path: &Path) -> Result<(), ConfigError> {
    let format = DocumentFormat::from_path(path)?;
    debug!(path = %path.display(), ?format, "Writing configuration");
    let text = document_to_string(document, format)?;
    fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert one configuration file into another format.
///
/// Direction is decided entirely by the two extensions, so this also
/// covers same-format rewrites (for example `.cfg` to `.cfg` to normalize
/// layout).
///
/// # Example
///
/// ```rust,ignore
/// convert_file(Path::new("scope.cfg"), Path::new("scope.json"))?;
/// ```
pub fn convert_file(input: &Path, output: &Path) -> Result<(), ConfigError> {
    let document = read_document(input)?;
    write_document(&document, output)?;
    info!(input = %input.display(), output = %output.display(), "Converted configuration");
    Ok(())
}

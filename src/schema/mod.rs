//! Typed configuration document model.
//!
//! The document is a tree: a [`Document`] root holding ordered [`Device`]
//! entries, [`ConfigGroup`]s of presets, [`PixelSizeConfiguration`]
//! calibrations, a [`CoreProperties`] record, and an open `extra` map for
//! anything this schema does not model.
//!
//! # Construction
//!
//! Documents come from three places:
//!
//! 1. **Untyped trees** (JSON or YAML) via [`Document::from_tree`] and the
//!    string helpers, with exhaustive validation reporting.
//! 2. **Legacy text** via [`crate::legacy::parse`], which aborts at the
//!    first malformed line, then validates the result exhaustively.
//! 3. **Direct construction** in code, checked with [`Document::validate`].
//!
//! # JSON Schema Generation
//!
//! All types derive `JsonSchema` from the `schemars` crate;
//! [`generate_json_schema`] renders the document schema for IDE support and
//! external validators.

mod core_properties;
mod decode;
mod device;
mod document;
mod settings;

pub use core_properties::CoreProperties;
pub use device::{Device, FocusDirection, PropertyValue};
pub use document::Document;
pub use settings::{ConfigGroup, Configuration, PixelSizeConfiguration, PropertySetting};

/// Version string written to and accepted from the `schema_version` field.
pub const SCHEMA_VERSION: &str = "1.0";

/// Render the JSON Schema for [`Document`] as pretty-printed JSON.
pub fn generate_json_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(Document);
    serde_json::to_string_pretty(&schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_covers_the_document_surface() {
        let schema = generate_json_schema().unwrap();
        for key in [
            "schema_version",
            "devices",
            "configuration_groups",
            "pixel_size_configurations",
            "core_properties",
            "extra",
            "FocusDirection",
        ] {
            assert!(schema.contains(key), "schema is missing {key}");
        }
    }
}

//! The root configuration document.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ConfigError, ValidationErrors};
use crate::validate;

use super::{
    decode, ConfigGroup, CoreProperties, Device, PixelSizeConfiguration, PropertyValue,
    SCHEMA_VERSION,
};

/// A complete device-control configuration.
///
/// Field order inside every sequence is load/apply order, not just storage
/// order. A document is immutable once validated; edits produce a new value
/// which must be validated again.
///
/// Construction from untyped trees goes through [`Document::from_tree`],
/// which reports every violation at once. There is deliberately no serde
/// `Deserialize` implementation: derived deserialization stops at the first
/// problem, which would silently weaken the exhaustive-reporting contract.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Document {
    /// Schema revision this document conforms to
    pub schema_version: String,

    /// Lets the runtime initialize independent devices in parallel.
    /// Ordering guarantees are then relaxed only across unrelated devices;
    /// the effect is wholly owned by the runtime adapter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_parallel_device_initialization: Option<bool>,

    /// Devices in load order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<Device>,

    /// Configuration groups in definition order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub configuration_groups: Vec<ConfigGroup>,

    /// Pixel-size calibration presets in definition order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pixel_size_configurations: Vec<PixelSizeConfiguration>,

    /// Global role assignments and core scalars
    #[serde(skip_serializing_if = "CoreProperties::is_empty")]
    pub core_properties: CoreProperties,

    /// Open extension map, preserved verbatim for data this schema does not
    /// model
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            enable_parallel_device_initialization: None,
            devices: Vec::new(),
            configuration_groups: Vec::new(),
            pixel_size_configurations: Vec::new(),
            core_properties: CoreProperties::default(),
            extra: Map::new(),
        }
    }
}

impl Document {
    /// Create an empty document at the current schema version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Construction and validation
    // =========================================================================

    /// Build a validated document from an untyped tree.
    ///
    /// Shape problems (wrong types, missing required fields, unknown keys)
    /// and cross-field rule violations are both collected exhaustively, with
    /// a path to each offending field. Construction is all-or-nothing: on
    /// any error no document is returned.
    ///
    /// Cross-field rules only run once the tree shape is clean, so a device
    /// that is missing its label is reported as exactly that rather than
    /// additionally failing the label rules on a placeholder value.
    pub fn from_tree(tree: &Value) -> Result<Self, ValidationErrors> {
        let document = decode::decode_document(tree)?;
        let errors = validate::validate_document(&document);
        if errors.is_empty() {
            Ok(document)
        } else {
            Err(errors.into())
        }
    }

    /// Re-check the cross-field rules on an already constructed document.
    ///
    /// Useful after building a document directly in code, where the typed
    /// fields make shape errors impossible but the relational rules (label
    /// validity, role exclusivity, reserved names) can still be violated.
    /// Referenced labels, `children` entries included, are checked for
    /// shape only, never for existence in the document.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let errors = validate::validate_document(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }

    /// Serialize to an untyped tree.
    pub fn to_tree(&self) -> Result<Value, ConfigError> {
        Ok(serde_json::to_value(self)?)
    }

    // =========================================================================
    // Text surfaces
    // =========================================================================

    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let tree: Value = serde_json::from_str(text)?;
        Ok(Self::from_tree(&tree)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a YAML document.
    ///
    /// YAML is an alternate surface syntax over the same tree shape, so the
    /// same key vocabulary applies. State-label indices must be written as
    /// quoted strings, as they are in JSON.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let tree: Value = serde_yaml::from_str(text)?;
        Ok(Self::from_tree(&tree)?)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Device with the given label, if present.
    #[must_use]
    pub fn device(&self, label: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.label == label)
    }

    /// Configuration group with the given name, if present.
    #[must_use]
    pub fn configuration_group(&self, name: &str) -> Option<&ConfigGroup> {
        self.configuration_groups.iter().find(|g| g.name == name)
    }

    /// Pixel-size calibration preset with the given name, if present.
    #[must_use]
    pub fn pixel_size_configuration(&self, name: &str) -> Option<&PixelSizeConfiguration> {
        self.pixel_size_configurations.iter().find(|p| p.name == name)
    }

    /// All pre-init settings in apply order, with the owning device label.
    pub fn pre_init_settings(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.devices
            .iter()
            .flat_map(|d| d.pre_init_properties.iter().map(move |p| (d.label.as_str(), p)))
    }

    /// All post-init settings in apply order, with the owning device label.
    pub fn post_init_settings(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.devices
            .iter()
            .flat_map(|d| d.post_init_properties.iter().map(move |p| (d.label.as_str(), p)))
    }
}

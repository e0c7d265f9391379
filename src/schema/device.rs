//! Device entries of the configuration document.

use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

// =============================================================================
// Property values
// =============================================================================

/// A property assignment scoped to the device that owns the list.
///
/// Values are always carried as strings regardless of the property's real
/// type; coercion is the consuming runtime's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct PropertyValue {
    /// Name of the property to set
    pub property: String,

    /// Value to set, as a string
    pub value: String,
}

impl PropertyValue {
    /// Create a property/value pair.
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Focus direction
// =============================================================================

/// Direction a stage device moves the objective as its position increases.
///
/// Serialized as the integer the control core uses: `1` toward the sample,
/// `-1` away from it, `0` unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirection {
    /// Increasing position moves the objective toward the sample
    TowardSample,
    /// Direction is unknown or uncalibrated
    Unknown,
    /// Increasing position moves the objective away from the sample
    AwayFromSample,
}

impl FocusDirection {
    /// Numeric form used by both serialized formats.
    pub fn as_i8(self) -> i8 {
        match self {
            FocusDirection::TowardSample => 1,
            FocusDirection::Unknown => 0,
            FocusDirection::AwayFromSample => -1,
        }
    }

    /// Parse the numeric form; anything outside {-1, 0, 1} is rejected.
    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            1 => Some(FocusDirection::TowardSample),
            0 => Some(FocusDirection::Unknown),
            -1 => Some(FocusDirection::AwayFromSample),
            _ => None,
        }
    }
}

impl Serialize for FocusDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

impl JsonSchema for FocusDirection {
    fn schema_name() -> String {
        "FocusDirection".to_string()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::Integer.into()),
            enum_values: Some(vec![(-1).into(), 0.into(), 1.into()]),
            ..Default::default()
        }
        .into()
    }
}

// =============================================================================
// Device
// =============================================================================

/// One loadable hardware adapter instance.
///
/// The three role fields (`focus_direction`, `state_labels`, `children`) are
/// mutually exclusive: a device is at most one of a stage, a multi-state
/// device, or a hub. Exclusivity is judged on field presence, which is why
/// all three are `Option` even where an empty default would exist; an
/// explicitly supplied empty map still claims the role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct Device {
    /// Unique user-chosen label for this device instance
    pub label: String,

    /// Adapter library that provides the device
    pub library: String,

    /// Device type name within the library
    pub name: String,

    /// Properties applied before device initialization, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_init_properties: Vec<PropertyValue>,

    /// Properties applied after device initialization, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_init_properties: Vec<PropertyValue>,

    /// Delay in milliseconds for device actions (some devices ignore it)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<f64>,

    /// Stage devices only: focus direction relative to the sample
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_direction: Option<FocusDirection>,

    /// State devices only: human-readable label per state index.
    /// Keys serialize as strings because JSON objects cannot hold integer
    /// keys.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_state_labels"
    )]
    pub state_labels: Option<BTreeMap<u32, String>>,

    /// Hub devices only: labels of the child devices behind this hub
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
}

impl Device {
    /// Create a device with the given identity and nothing else set.
    pub fn new(
        label: impl Into<String>,
        library: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            library: library.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Names of the role fields currently present on this device.
    pub(crate) fn present_role_fields(&self) -> Vec<&'static str> {
        let mut present = Vec::new();
        if self.focus_direction.is_some() {
            present.push("focus_direction");
        }
        if self.state_labels.is_some() {
            present.push("state_labels");
        }
        if self.children.is_some() {
            present.push("children");
        }
        present
    }
}

/// Serialize state labels with stringified keys so the JSON and YAML
/// surfaces agree (YAML would otherwise emit bare integer keys that the
/// tree decoder rejects).
fn serialize_state_labels<S: Serializer>(
    labels: &Option<BTreeMap<u32, String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match labels {
        Some(labels) => {
            let mut map = serializer.serialize_map(Some(labels.len()))?;
            for (state, label) in labels {
                map.serialize_entry(&state.to_string(), label)?;
            }
            map.end()
        }
        None => serializer.serialize_none(),
    }
}

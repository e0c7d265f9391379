//! Configuration presets, preset groups, and pixel-size calibrations.

use schemars::JsonSchema;
use serde::Serialize;

// =============================================================================
// Property settings
// =============================================================================

/// A single device property setting with an explicit device reference.
///
/// The device-scoped sibling is [`PropertyValue`](super::PropertyValue);
/// this form appears wherever settings for several devices share one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct PropertySetting {
    /// Label of the device to set the property on
    pub device: String,

    /// Name of the property to set
    pub property: String,

    /// Value to set, as a string
    pub value: String,
}

impl PropertySetting {
    /// Create a (device, property, value) triple.
    pub fn new(
        device: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            property: property.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Configurations and groups
// =============================================================================

/// A named preset: property settings applied together, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Configuration {
    /// Preset name
    pub name: String,

    /// Settings applied when the preset is activated, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<PropertySetting>,
}

impl Configuration {
    /// Create an empty preset with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: Vec::new(),
        }
    }
}

/// A named collection of mutually exclusive presets (e.g. a channel group).
///
/// Names need not be unique across a document; at apply time later
/// definitions shadow earlier ones, which consumers may want to lint for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ConfigGroup {
    /// Group name
    pub name: String,

    /// Presets belonging to this group, in definition order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub configurations: Vec<Configuration>,
}

impl ConfigGroup {
    /// Create an empty group with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            configurations: Vec::new(),
        }
    }

    /// Preset with the given name, if present.
    pub fn configuration(&self, name: &str) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.name == name)
    }
}

// =============================================================================
// Pixel-size calibrations
// =============================================================================

/// A pixel-size calibration preset.
///
/// Maps a set of device property settings (typically the objective position)
/// to a physical pixel scale. All optional numeric fields default to unset,
/// which means "no calibration data" rather than zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct PixelSizeConfiguration {
    /// Calibration preset name
    pub name: String,

    /// Device settings that select this resolution, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<PropertySetting>,

    /// Physical pixel size in micrometers
    pub pixel_size_um: f64,

    /// Flattened row-major 2x3 affine correction, if calibrated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affine_matrix: Option<[f64; 6]>,

    /// dx/dz shear ratio, if calibrated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dxdz: Option<f64>,

    /// dy/dz shear ratio, if calibrated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dydz: Option<f64>,

    /// User-preferred z step in micrometers for this resolution, if set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_z_um: Option<f64>,
}

impl PixelSizeConfiguration {
    /// Create a calibration preset with the given name and no data.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

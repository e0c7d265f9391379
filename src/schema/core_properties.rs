//! Global role assignments and core-scoped scalar settings.

use schemars::JsonSchema;
use serde::Serialize;

/// Which loaded device plays each global role, plus core-scoped scalars.
///
/// Every field is optional and absence is meaningful: an unset field leaves
/// the corresponding runtime setting untouched, which is not the same as
/// assigning an empty label or a false/zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct CoreProperties {
    /// Default camera device label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_device: Option<String>,

    /// Default XY stage device label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy_stage_device: Option<String>,

    /// Default focus (Z) stage device label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_device: Option<String>,

    /// Default autofocus device label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_focus_device: Option<String>,

    /// Default shutter device label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_device: Option<String>,

    /// Default image processor device label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_processor_device: Option<String>,

    /// Default spatial light modulator device label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slm_device: Option<String>,

    /// Default galvo device label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub galvo_device: Option<String>,

    /// Configuration group treated as the channel selector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_group: Option<String>,

    /// Whether the shutter opens automatically around exposures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_shutter: Option<bool>,

    /// Device operation timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u32>,
}

impl CoreProperties {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_empty() {
        assert!(CoreProperties::default().is_empty());

        let core = CoreProperties {
            camera_device: Some("Camera".to_string()),
            ..CoreProperties::default()
        };
        assert!(!core.is_empty());
    }

    #[test]
    fn test_serialization_skips_unset_fields() {
        let core = CoreProperties {
            camera_device: Some("Camera".to_string()),
            auto_shutter: Some(true),
            ..CoreProperties::default()
        };
        let value = serde_json::to_value(&core).unwrap();
        assert_eq!(value, json!({"camera_device": "Camera", "auto_shutter": true}));
    }
}

//! Exhaustive decoding of untyped document trees.
//!
//! Derived deserialization stops at the first problem it meets, but the
//! document contract requires the opposite: validation must report every
//! violated field of the whole tree in one pass. The decoder here walks the
//! tree by hand, accumulating [`ValidationError`]s with full path context
//! while still building the typed value, and only releases the finished
//! [`Document`] when the error list is empty.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{ValidationError, ValidationErrors};

use super::{
    ConfigGroup, Configuration, CoreProperties, Device, Document, FocusDirection,
    PixelSizeConfiguration, PropertySetting, PropertyValue, SCHEMA_VERSION,
};

const DOCUMENT_KEYS: &[&str] = &[
    "schema_version",
    "enable_parallel_device_initialization",
    "devices",
    "configuration_groups",
    "pixel_size_configurations",
    "core_properties",
    "extra",
];

const DEVICE_KEYS: &[&str] = &[
    "label",
    "library",
    "name",
    "pre_init_properties",
    "post_init_properties",
    "delay_ms",
    "focus_direction",
    "state_labels",
    "children",
];

const PROPERTY_VALUE_KEYS: &[&str] = &["property", "value"];
const PROPERTY_SETTING_KEYS: &[&str] = &["device", "property", "value"];
const CONFIGURATION_KEYS: &[&str] = &["name", "settings"];
const CONFIG_GROUP_KEYS: &[&str] = &["name", "configurations"];

const PIXEL_SIZE_KEYS: &[&str] = &[
    "name",
    "settings",
    "pixel_size_um",
    "affine_matrix",
    "dxdz",
    "dydz",
    "optimal_z_um",
];

const CORE_PROPERTIES_KEYS: &[&str] = &[
    "camera_device",
    "xy_stage_device",
    "focus_device",
    "auto_focus_device",
    "shutter_device",
    "image_processor_device",
    "slm_device",
    "galvo_device",
    "channel_group",
    "auto_shutter",
    "timeout_ms",
];

/// Decode an untyped tree into a [`Document`], collecting every shape
/// violation instead of stopping at the first.
pub(crate) fn decode_document(tree: &Value) -> Result<Document, ValidationErrors> {
    let mut decoder = Decoder::default();
    let document = decoder.document(tree);
    if decoder.errors.is_empty() {
        Ok(document)
    } else {
        Err(decoder.errors.into())
    }
}

#[derive(Default)]
struct Decoder {
    errors: Vec<ValidationError>,
}

impl Decoder {
    // =========================================================================
    // Entities
    // =========================================================================

    fn document(&mut self, tree: &Value) -> Document {
        let mut document = Document::default();
        let Some(map) = self.object(tree, "document") else {
            return document;
        };
        self.unknown_keys(map, DOCUMENT_KEYS, "");

        if let Some(value) = map.get("schema_version") {
            if let Some(version) = self.string(value, "schema_version") {
                if version != SCHEMA_VERSION {
                    self.push(
                        "schema_version",
                        format!("Unsupported schema version {version:?}, expected {SCHEMA_VERSION:?}"),
                    );
                }
            }
        }
        document.enable_parallel_device_initialization =
            self.opt_bool(map, "enable_parallel_device_initialization", "");

        if let Some(items) = self.opt_array(map, "devices", "") {
            document.devices = items
                .iter()
                .enumerate()
                .map(|(i, item)| self.device(item, &format!("devices[{i}]")))
                .collect();
        }
        if let Some(items) = self.opt_array(map, "configuration_groups", "") {
            document.configuration_groups = items
                .iter()
                .enumerate()
                .map(|(i, item)| self.config_group(item, &format!("configuration_groups[{i}]")))
                .collect();
        }
        if let Some(items) = self.opt_array(map, "pixel_size_configurations", "") {
            document.pixel_size_configurations = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    self.pixel_size_configuration(item, &format!("pixel_size_configurations[{i}]"))
                })
                .collect();
        }
        if let Some(value) = map.get("core_properties") {
            document.core_properties = self.core_properties(value, "core_properties");
        }
        if let Some(value) = map.get("extra") {
            match value.as_object() {
                Some(extra) => document.extra = extra.clone(),
                None => self.push("extra", format!("Expected an object, found {}", type_name(value))),
            }
        }
        document
    }

    fn device(&mut self, value: &Value, path: &str) -> Device {
        let mut device = Device::default();
        let Some(map) = self.object(value, path) else {
            return device;
        };
        self.unknown_keys(map, DEVICE_KEYS, path);

        device.label = self.required_string(map, "label", path);
        device.library = self.required_string(map, "library", path);
        device.name = self.required_string(map, "name", path);

        if let Some(items) = self.opt_array(map, "pre_init_properties", path) {
            let list_path = join(path, "pre_init_properties");
            device.pre_init_properties = items
                .iter()
                .enumerate()
                .map(|(i, item)| self.property_value(item, &format!("{list_path}[{i}]")))
                .collect();
        }
        if let Some(items) = self.opt_array(map, "post_init_properties", path) {
            let list_path = join(path, "post_init_properties");
            device.post_init_properties = items
                .iter()
                .enumerate()
                .map(|(i, item)| self.property_value(item, &format!("{list_path}[{i}]")))
                .collect();
        }

        device.delay_ms = self.opt_f64(map, "delay_ms", path);
        if let Some(value) = map.get("focus_direction") {
            device.focus_direction = self.focus_direction(value, &join(path, "focus_direction"));
        }
        if let Some(value) = map.get("state_labels") {
            device.state_labels = Some(self.state_labels(value, &join(path, "state_labels")));
        }
        if let Some(value) = map.get("children") {
            device.children = Some(self.string_list(value, &join(path, "children")));
        }
        device
    }

    fn property_value(&mut self, value: &Value, path: &str) -> PropertyValue {
        let mut property = PropertyValue::new("", "");
        let Some(map) = self.object(value, path) else {
            return property;
        };
        self.unknown_keys(map, PROPERTY_VALUE_KEYS, path);
        property.property = self.required_string(map, "property", path);
        property.value = self.required_string(map, "value", path);
        property
    }

    fn property_setting(&mut self, value: &Value, path: &str) -> PropertySetting {
        let mut setting = PropertySetting::new("", "", "");
        let Some(map) = self.object(value, path) else {
            return setting;
        };
        self.unknown_keys(map, PROPERTY_SETTING_KEYS, path);
        setting.device = self.required_string(map, "device", path);
        setting.property = self.required_string(map, "property", path);
        setting.value = self.required_string(map, "value", path);
        setting
    }

    fn configuration(&mut self, value: &Value, path: &str) -> Configuration {
        let mut configuration = Configuration::default();
        let Some(map) = self.object(value, path) else {
            return configuration;
        };
        self.unknown_keys(map, CONFIGURATION_KEYS, path);
        configuration.name = self.required_string(map, "name", path);
        if let Some(items) = self.opt_array(map, "settings", path) {
            let list_path = join(path, "settings");
            configuration.settings = items
                .iter()
                .enumerate()
                .map(|(i, item)| self.property_setting(item, &format!("{list_path}[{i}]")))
                .collect();
        }
        configuration
    }

    fn config_group(&mut self, value: &Value, path: &str) -> ConfigGroup {
        let mut group = ConfigGroup::default();
        let Some(map) = self.object(value, path) else {
            return group;
        };
        self.unknown_keys(map, CONFIG_GROUP_KEYS, path);
        group.name = self.required_string(map, "name", path);
        if let Some(items) = self.opt_array(map, "configurations", path) {
            let list_path = join(path, "configurations");
            group.configurations = items
                .iter()
                .enumerate()
                .map(|(i, item)| self.configuration(item, &format!("{list_path}[{i}]")))
                .collect();
        }
        group
    }

    fn pixel_size_configuration(&mut self, value: &Value, path: &str) -> PixelSizeConfiguration {
        let mut pixel = PixelSizeConfiguration::default();
        let Some(map) = self.object(value, path) else {
            return pixel;
        };
        self.unknown_keys(map, PIXEL_SIZE_KEYS, path);
        pixel.name = self.required_string(map, "name", path);
        if let Some(items) = self.opt_array(map, "settings", path) {
            let list_path = join(path, "settings");
            pixel.settings = items
                .iter()
                .enumerate()
                .map(|(i, item)| self.property_setting(item, &format!("{list_path}[{i}]")))
                .collect();
        }
        if let Some(value) = self.opt_f64(map, "pixel_size_um", path) {
            pixel.pixel_size_um = value;
        }
        if let Some(value) = map.get("affine_matrix") {
            pixel.affine_matrix = self.affine_matrix(value, &join(path, "affine_matrix"));
        }
        pixel.dxdz = self.opt_f64(map, "dxdz", path);
        pixel.dydz = self.opt_f64(map, "dydz", path);
        pixel.optimal_z_um = self.opt_f64(map, "optimal_z_um", path);
        pixel
    }

    fn core_properties(&mut self, value: &Value, path: &str) -> CoreProperties {
        let mut core = CoreProperties::default();
        let Some(map) = self.object(value, path) else {
            return core;
        };
        self.unknown_keys(map, CORE_PROPERTIES_KEYS, path);
        core.camera_device = self.opt_string(map, "camera_device", path);
        core.xy_stage_device = self.opt_string(map, "xy_stage_device", path);
        core.focus_device = self.opt_string(map, "focus_device", path);
        core.auto_focus_device = self.opt_string(map, "auto_focus_device", path);
        core.shutter_device = self.opt_string(map, "shutter_device", path);
        core.image_processor_device = self.opt_string(map, "image_processor_device", path);
        core.slm_device = self.opt_string(map, "slm_device", path);
        core.galvo_device = self.opt_string(map, "galvo_device", path);
        core.channel_group = self.opt_string(map, "channel_group", path);
        core.auto_shutter = self.opt_bool(map, "auto_shutter", path);
        core.timeout_ms = self.opt_u32(map, "timeout_ms", path);
        core
    }

    // =========================================================================
    // Field helpers
    // =========================================================================

    fn state_labels(&mut self, value: &Value, path: &str) -> BTreeMap<u32, String> {
        let mut labels = BTreeMap::new();
        let Some(map) = self.object(value, path) else {
            return labels;
        };
        for (key, item) in map {
            let item_path = format!("{path}.{key}");
            let Ok(state) = key.parse::<u32>() else {
                self.push(item_path, "State index must be a non-negative integer");
                continue;
            };
            if let Some(label) = self.string(item, &item_path) {
                labels.insert(state, label);
            }
        }
        labels
    }

    fn focus_direction(&mut self, value: &Value, path: &str) -> Option<FocusDirection> {
        let direction = value
            .as_i64()
            .and_then(|n| i8::try_from(n).ok())
            .and_then(FocusDirection::from_i8);
        if direction.is_none() {
            self.push(path, "Focus direction must be -1, 0, or 1");
        }
        direction
    }

    fn affine_matrix(&mut self, value: &Value, path: &str) -> Option<[f64; 6]> {
        let Some(items) = value.as_array() else {
            self.push(path, format!("Expected an array, found {}", type_name(value)));
            return None;
        };
        if items.len() != 6 {
            self.push(path, format!("Expected exactly 6 elements, found {}", items.len()));
            return None;
        }
        let mut matrix = [0.0; 6];
        let mut complete = true;
        for (i, item) in items.iter().enumerate() {
            match item.as_f64() {
                Some(v) => matrix[i] = v,
                None => {
                    self.push(
                        format!("{path}[{i}]"),
                        format!("Expected a number, found {}", type_name(item)),
                    );
                    complete = false;
                }
            }
        }
        complete.then_some(matrix)
    }

    fn string_list(&mut self, value: &Value, path: &str) -> Vec<String> {
        let Some(items) = value.as_array() else {
            self.push(path, format!("Expected an array, found {}", type_name(value)));
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| self.string(item, &format!("{path}[{i}]")))
            .collect()
    }

    // =========================================================================
    // Primitive helpers
    // =========================================================================

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value.as_object() {
            Some(map) => Some(map),
            None => {
                self.push(path, format!("Expected an object, found {}", type_name(value)));
                None
            }
        }
    }

    fn opt_array<'a>(
        &mut self,
        map: &'a Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'a Vec<Value>> {
        match map.get(key) {
            None => None,
            Some(Value::Array(items)) => Some(items),
            Some(other) => {
                self.push(
                    join(path, key),
                    format!("Expected an array, found {}", type_name(other)),
                );
                None
            }
        }
    }

    fn string(&mut self, value: &Value, path: &str) -> Option<String> {
        match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.push(path, format!("Expected a string, found {}", type_name(value)));
                None
            }
        }
    }

    fn required_string(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> String {
        let field_path = join(path, key);
        match map.get(key) {
            None => {
                self.push(field_path, "Missing required field");
                String::new()
            }
            Some(value) => self.string(value, &field_path).unwrap_or_default(),
        }
    }

    fn opt_string(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        let value = map.get(key)?;
        self.string(value, &join(path, key))
    }

    fn opt_bool(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<bool> {
        let value = map.get(key)?;
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                self.push(
                    join(path, key),
                    format!("Expected a boolean, found {}", type_name(value)),
                );
                None
            }
        }
    }

    fn opt_f64(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<f64> {
        let value = map.get(key)?;
        match value.as_f64() {
            Some(n) => Some(n),
            None => {
                self.push(
                    join(path, key),
                    format!("Expected a number, found {}", type_name(value)),
                );
                None
            }
        }
    }

    fn opt_u32(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<u32> {
        let value = map.get(key)?;
        match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) => Some(n),
            None => {
                self.push(
                    join(path, key),
                    format!("Expected a non-negative integer, found {}", type_name(value)),
                );
                None
            }
        }
    }

    fn unknown_keys(&mut self, map: &Map<String, Value>, allowed: &[&str], path: &str) {
        for key in map.keys() {
            if !allowed.contains(&key.as_str()) {
                self.push(join(path, key), "Unknown field");
            }
        }
    }

    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError::new(path, message));
    }
}

fn join(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}.{key}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(result: &Result<Document, ValidationErrors>) -> Vec<String> {
        match result {
            Ok(_) => Vec::new(),
            Err(errors) => errors.iter().map(|e| e.path.clone()).collect(),
        }
    }

    #[test]
    fn test_empty_object_decodes_to_default_document() {
        let document = decode_document(&json!({})).unwrap();
        assert_eq!(document, Document::default());
    }

    #[test]
    fn test_non_object_root_is_a_single_error() {
        let result = decode_document(&json!([1, 2, 3]));
        assert_eq!(paths(&result), vec!["document"]);
    }

    #[test]
    fn test_unknown_keys_each_get_their_own_error() {
        let result = decode_document(&json!({"bogus": 1, "mystery": 2}));
        let mut found = paths(&result);
        found.sort();
        assert_eq!(found, vec!["bogus", "mystery"]);
    }

    #[test]
    fn test_missing_device_fields_are_all_reported() {
        let result = decode_document(&json!({"devices": [{"label": "Camera"}]}));
        let found = paths(&result);
        assert!(found.contains(&"devices[0].library".to_string()));
        assert!(found.contains(&"devices[0].name".to_string()));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_type_errors_carry_the_observed_type() {
        let result = decode_document(&json!({"devices": [{"label": 5, "library": "L", "name": "N"}]}));
        let Err(errors) = result else { panic!("expected errors") };
        let error = errors.iter().next().unwrap();
        assert_eq!(error.path, "devices[0].label");
        assert_eq!(error.message, "Expected a string, found a number");
    }

    #[test]
    fn test_bad_state_label_keys_and_values_are_reported() {
        let result = decode_document(&json!({
            "devices": [{
                "label": "Wheel", "library": "L", "name": "N",
                "state_labels": {"0": "DAPI", "red": "FITC", "2": 7}
            }]
        }));
        let found = paths(&result);
        assert!(found.contains(&"devices[0].state_labels.red".to_string()));
        assert!(found.contains(&"devices[0].state_labels.2".to_string()));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_affine_matrix_length_is_checked() {
        let result = decode_document(&json!({
            "pixel_size_configurations": [{"name": "Res10x", "affine_matrix": [1, 0, 0]}]
        }));
        let Err(errors) = result else { panic!("expected errors") };
        let error = errors.iter().next().unwrap();
        assert_eq!(error.path, "pixel_size_configurations[0].affine_matrix");
        assert!(error.message.contains("found 3"));
    }

    #[test]
    fn test_focus_direction_out_of_range_is_reported() {
        let result = decode_document(&json!({
            "devices": [{"label": "Z", "library": "L", "name": "N", "focus_direction": 2}]
        }));
        assert_eq!(paths(&result), vec!["devices[0].focus_direction"]);
    }

    #[test]
    fn test_wrong_schema_version_is_reported() {
        let result = decode_document(&json!({"schema_version": "2.0"}));
        assert_eq!(paths(&result), vec!["schema_version"]);
    }

    #[test]
    fn test_extra_accepts_arbitrary_nested_data() {
        let document = decode_document(&json!({
            "extra": {"notes": ["a", {"b": 3}], "reviewed": true}
        }))
        .unwrap();
        assert_eq!(document.extra["notes"][1]["b"], json!(3));
    }

    #[test]
    fn test_extra_must_be_an_object() {
        let result = decode_document(&json!({"extra": [1, 2]}));
        assert_eq!(paths(&result), vec!["extra"]);
    }

    #[test]
    fn test_nested_group_paths_point_at_the_offending_setting() {
        let result = decode_document(&json!({
            "configuration_groups": [{
                "name": "Channel",
                "configurations": [{"name": "DAPI", "settings": [{"device": "Wheel", "property": "Label"}]}]
            }]
        }));
        assert_eq!(
            paths(&result),
            vec!["configuration_groups[0].configurations[0].settings[0].value"]
        );
    }

    #[test]
    fn test_shape_errors_accumulate_across_entities() {
        let result = decode_document(&json!({
            "surprise": 1,
            "devices": [{"label": "A"}],
            "core_properties": {"timeout_ms": -5}
        }));
        let Err(errors) = result else { panic!("expected errors") };
        assert_eq!(errors.len(), 4);
    }
}

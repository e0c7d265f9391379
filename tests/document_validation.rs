//! Validation behavior of the structured document surface: exhaustive error
//! collection, field paths, and the cross-field rules for labels, roles, and
//! reserved names.

use serde_json::json;

use scope_config::{ConfigError, Document, FocusDirection, ValidationError};

#[test]
fn test_full_document_from_json() {
    let text = r#"{
        "schema_version": "1.0",
        "enable_parallel_device_initialization": true,
        "devices": [
            {
                "label": "Camera",
                "library": "DemoCamera",
                "name": "DCam",
                "pre_init_properties": [{"property": "Port", "value": "COM1"}],
                "post_init_properties": [{"property": "Exposure", "value": "10"}],
                "delay_ms": 5.0
            },
            {
                "label": "Wheel",
                "library": "DemoCamera",
                "name": "DWheel",
                "state_labels": {"0": "DAPI", "1": "FITC"}
            },
            {
                "label": "Z",
                "library": "DemoCamera",
                "name": "DStage",
                "focus_direction": -1
            }
        ],
        "configuration_groups": [
            {
                "name": "Channel",
                "configurations": [
                    {
                        "name": "DAPI",
                        "settings": [{"device": "Wheel", "property": "State", "value": "0"}]
                    }
                ]
            }
        ],
        "pixel_size_configurations": [
            {
                "name": "Res10x",
                "settings": [{"device": "Wheel", "property": "State", "value": "0"}],
                "pixel_size_um": 1.0,
                "affine_matrix": [1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
            }
        ],
        "core_properties": {
            "camera_device": "Camera",
            "focus_device": "Z",
            "auto_shutter": true,
            "timeout_ms": 5000
        }
    }"#;

    let doc = Document::from_json_str(text).unwrap();
    assert_eq!(doc.schema_version, "1.0");
    assert_eq!(doc.enable_parallel_device_initialization, Some(true));
    assert_eq!(doc.devices.len(), 3);
    assert_eq!(doc.device("Camera").unwrap().delay_ms, Some(5.0));
    assert_eq!(doc.device("Z").unwrap().focus_direction, Some(FocusDirection::AwayFromSample));
    assert_eq!(
        doc.device("Wheel").unwrap().state_labels.as_ref().unwrap()[&1],
        "FITC"
    );
    assert_eq!(doc.core_properties.timeout_ms, Some(5000));
    assert_eq!(
        doc.configuration_group("Channel")
            .unwrap()
            .configuration("DAPI")
            .unwrap()
            .settings
            .len(),
        1
    );
    assert_eq!(
        doc.pixel_size_configuration("Res10x").unwrap().affine_matrix,
        Some([1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    );
    doc.validate().unwrap();
}

#[test]
fn test_unknown_fields_are_all_reported() {
    let tree = json!({
        "schema_version": "1.0",
        "device_list": [],
        "piexl_size_configurations": []
    });
    let errors = Document::from_tree(&tree).unwrap_err().into_vec();
    assert_eq!(errors.len(), 2);
    assert!(errors.contains(&ValidationError::new("device_list", "Unknown field")));
    assert!(errors.contains(&ValidationError::new("piexl_size_configurations", "Unknown field")));
}

#[test]
fn test_type_errors_carry_full_paths() {
    let tree = json!({
        "devices": [
            {"label": 42, "library": "DemoCamera", "name": "DCam"}
        ],
        "configuration_groups": [
            {
                "name": "Channel",
                "configurations": [
                    {
                        "name": "DAPI",
                        "settings": [{"device": "Wheel", "property": "State", "value": 0}]
                    }
                ]
            }
        ]
    });
    let errors = Document::from_tree(&tree).unwrap_err().into_vec();
    assert!(errors.contains(&ValidationError::new(
        "devices[0].label",
        "Expected a string, found a number"
    )));
    assert!(errors.contains(&ValidationError::new(
        "configuration_groups[0].configurations[0].settings[0].value",
        "Expected a string, found a number"
    )));
}

#[test]
fn test_missing_identity_fields_are_reported_together() {
    let tree = json!({"devices": [{}]});
    let errors = Document::from_tree(&tree).unwrap_err().into_vec();
    assert_eq!(errors.len(), 3);
    for field in ["label", "library", "name"] {
        assert!(errors.contains(&ValidationError::new(
            format!("devices[0].{field}"),
            "Missing required field"
        )));
    }
}

#[test]
fn test_reserved_and_malformed_labels_are_rejected() {
    let tree = json!({
        "devices": [
            {"label": "CORE", "library": "DemoCamera", "name": "DCam"},
            {"label": "cam,1", "library": "DemoCamera", "name": "DCam"}
        ]
    });
    let errors = Document::from_tree(&tree).unwrap_err().into_vec();
    assert_eq!(errors.len(), 2);
    assert!(errors.contains(&ValidationError::new(
        "devices[0].label",
        "Label \"CORE\" is reserved"
    )));
    assert!(errors.contains(&ValidationError::new(
        "devices[1].label",
        "Label \"cam,1\" must not contain a comma"
    )));
}

#[test]
fn test_role_fields_are_mutually_exclusive() {
    let tree = json!({
        "devices": [
            {
                "label": "Confused",
                "library": "DemoCamera",
                "name": "DStage",
                "focus_direction": 1,
                "state_labels": {"0": "A"}
            }
        ]
    });
    let errors = Document::from_tree(&tree).unwrap_err().into_vec();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "devices[0]");
    assert!(errors[0].message.contains("focus_direction"));
    assert!(errors[0].message.contains("state_labels"));

    // A single role is fine.
    let tree = json!({
        "devices": [
            {"label": "Z", "library": "DemoCamera", "name": "DStage", "focus_direction": 1}
        ]
    });
    Document::from_tree(&tree).unwrap();
}

#[test]
fn test_system_group_name_is_reserved_in_any_case() {
    for name in ["System", "system", "SYSTEM"] {
        let tree = json!({"configuration_groups": [{"name": name}]});
        let errors = Document::from_tree(&tree).unwrap_err().into_vec();
        assert_eq!(errors.len(), 1, "group name {name:?}");
        assert_eq!(errors[0].path, "configuration_groups[0].name");
        assert!(errors[0].message.contains("reserved"));
    }
}

#[test]
fn test_duplicate_device_labels_are_rejected() {
    let tree = json!({
        "devices": [
            {"label": "Camera", "library": "DemoCamera", "name": "DCam"},
            {"label": "Camera", "library": "PVCAM", "name": "Prime"}
        ]
    });
    let errors = Document::from_tree(&tree).unwrap_err().into_vec();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "devices[1].label");
    assert!(errors[0].message.contains("Duplicate"));
}

#[test]
fn test_schema_version_is_checked() {
    let tree = json!({"schema_version": "2.0"});
    let errors = Document::from_tree(&tree).unwrap_err().into_vec();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "schema_version");
    assert!(errors[0].message.contains("Unsupported schema version"));
}

#[test]
fn test_shape_errors_suppress_cross_field_rules() {
    // The reserved label would normally be a cross-field violation, but with
    // a malformed sibling the shape pass fails first and only its errors
    // surface.
    let tree = json!({
        "devices": [
            {"label": "Core", "library": "DemoCamera", "name": "DCam", "delay_ms": "fast"}
        ]
    });
    let errors = Document::from_tree(&tree).unwrap_err().into_vec();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "devices[0].delay_ms");
    assert!(errors[0].message.contains("Expected a number"));
}

#[test]
fn test_affine_matrix_length_is_checked() {
    let tree = json!({
        "pixel_size_configurations": [
            {"name": "Res10x", "pixel_size_um": 1.0, "affine_matrix": [1.0, 0.0, 0.0]}
        ]
    });
    let errors = Document::from_tree(&tree).unwrap_err().into_vec();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "pixel_size_configurations[0].affine_matrix");
    assert!(errors[0].message.contains("6 elements"));
}

#[test]
fn test_yaml_surface_round_trips() {
    let text = "\
schema_version: \"1.0\"
devices:
  - label: Wheel
    library: DemoCamera
    name: DWheel
    state_labels:
      \"0\": DAPI
      \"1\": FITC
core_properties:
  camera_device: Wheel
";
    let doc = Document::from_yaml_str(text).unwrap();
    assert_eq!(doc.device("Wheel").unwrap().state_labels.as_ref().unwrap()[&0], "DAPI");

    let emitted = doc.to_yaml_string().unwrap();
    assert_eq!(Document::from_yaml_str(&emitted).unwrap(), doc);
}

#[test]
fn test_yaml_integer_state_keys_are_rejected() {
    let text = "\
devices:
  - label: Wheel
    library: DemoCamera
    name: DWheel
    state_labels:
      0: DAPI
";
    let err = Document::from_yaml_str(text).unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)), "got {err:?}");
}

#[test]
fn test_extra_data_is_preserved_through_json() {
    let text = r#"{
        "schema_version": "1.0",
        "extra": {"site": {"room": "B204", "rig": 3}}
    }"#;
    let doc = Document::from_json_str(text).unwrap();
    let emitted = doc.to_json_string().unwrap();
    let reparsed = Document::from_json_str(&emitted).unwrap();
    assert_eq!(reparsed, doc);
    assert_eq!(doc.extra["site"]["room"], json!("B204"));
}

#[test]
fn test_validation_failure_reports_every_problem_at_once() {
    let tree = json!({
        "devices": [
            {"label": "", "library": "DemoCamera", "name": "DCam"},
            {"label": "Core", "library": "DemoCamera", "name": "DCam", "delay_ms": -1.0}
        ],
        "configuration_groups": [{"name": "System"}]
    });
    let errors = Document::from_tree(&tree).unwrap_err();
    assert_eq!(errors.len(), 4);
    let text = errors.to_string();
    assert!(text.starts_with("4 validation error(s)"));
    assert!(text.contains("devices[0].label"));
    assert!(text.contains("devices[1].delay_ms"));
    assert!(text.contains("configuration_groups[0].name"));
}

#[test]
fn test_json_syntax_errors_are_distinct_from_validation() {
    let err = Document::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)), "got {err:?}");
    assert!(err.to_string().starts_with("Malformed JSON"));
}

//! Cross-field validation rules.
//!
//! Shape checking (types, required fields, unknown keys) happens while
//! decoding; the rules here are the ones that relate fields to each other
//! and cannot be expressed per-key. They are evaluated over the whole
//! document on every construction path, including legacy parsing.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::schema::{ConfigGroup, Device, Document, PixelSizeConfiguration};

/// Device label reserved for the runtime core itself.
pub const RESERVED_DEVICE_LABEL: &str = "Core";

/// Configuration group name reserved for runtime startup handling.
pub const RESERVED_GROUP_NAME: &str = "System";

/// True when `label` can name a device: non-empty, comma-free, and not the
/// reserved core label under case-insensitive comparison.
#[must_use]
pub fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && !label.contains(',')
        && !label.eq_ignore_ascii_case(RESERVED_DEVICE_LABEL)
}

/// Run every cross-field rule over the document and return the full list of
/// violations, empty when the document is valid.
pub(crate) fn validate_document(document: &Document) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen_labels = HashSet::new();
    for (i, device) in document.devices.iter().enumerate() {
        let path = format!("devices[{i}]");
        validate_device(device, &path, &mut errors);
        if !device.label.is_empty() && !seen_labels.insert(device.label.as_str()) {
            errors.push(ValidationError {
                path: format!("{path}.label"),
                message: format!("Duplicate device label {:?}", device.label),
            });
        }
    }
    for (i, group) in document.configuration_groups.iter().enumerate() {
        validate_config_group(group, &format!("configuration_groups[{i}]"), &mut errors);
    }
    for (i, pixel) in document.pixel_size_configurations.iter().enumerate() {
        validate_pixel_size(pixel, &format!("pixel_size_configurations[{i}]"), &mut errors);
    }
    errors
}

fn validate_device(device: &Device, path: &str, errors: &mut Vec<ValidationError>) {
    check_label(&device.label, &format!("{path}.label"), errors);
    if let Some(children) = &device.children {
        for (i, child) in children.iter().enumerate() {
            check_label(child, &format!("{path}.children[{i}]"), errors);
        }
    }

    // Presence is what matters, not content. An empty state-label map still
    // claims the state-device role.
    let roles = device.present_role_fields();
    if roles.len() > 1 {
        errors.push(ValidationError {
            path: path.to_string(),
            message: format!("Mutually exclusive fields present: {}", roles.join(", ")),
        });
    }

    if let Some(delay) = device.delay_ms {
        if !delay.is_finite() || delay < 0.0 {
            errors.push(ValidationError {
                path: format!("{path}.delay_ms"),
                message: "Delay must be a non-negative number".to_string(),
            });
        }
    }
}

fn validate_config_group(group: &ConfigGroup, path: &str, errors: &mut Vec<ValidationError>) {
    if group.name.eq_ignore_ascii_case(RESERVED_GROUP_NAME) {
        errors.push(ValidationError {
            path: format!("{path}.name"),
            message: format!("Group name {:?} is reserved", group.name),
        });
    }
}

fn validate_pixel_size(
    pixel: &PixelSizeConfiguration,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    if !pixel.pixel_size_um.is_finite() || pixel.pixel_size_um < 0.0 {
        errors.push(ValidationError {
            path: format!("{path}.pixel_size_um"),
            message: "Pixel size must be a non-negative number".to_string(),
        });
    }
    // Non-finite values have no JSON representation (serde_json writes
    // them as null).
    if let Some(matrix) = &pixel.affine_matrix {
        for (i, element) in matrix.iter().enumerate() {
            if !element.is_finite() {
                errors.push(ValidationError {
                    path: format!("{path}.affine_matrix[{i}]"),
                    message: "Affine matrix element must be a finite number".to_string(),
                });
            }
        }
    }
    for (field, value) in
        [("dxdz", pixel.dxdz), ("dydz", pixel.dydz), ("optimal_z_um", pixel.optimal_z_um)]
    {
        if let Some(value) = value {
            if !value.is_finite() {
                errors.push(ValidationError {
                    path: format!("{path}.{field}"),
                    message: "Calibration value must be a finite number".to_string(),
                });
            }
        }
    }
}

fn check_label(label: &str, path: &str, errors: &mut Vec<ValidationError>) {
    if label.is_empty() {
        errors.push(ValidationError {
            path: path.to_string(),
            message: "Label must not be empty".to_string(),
        });
    } else if label.contains(',') {
        errors.push(ValidationError {
            path: path.to_string(),
            message: format!("Label {label:?} must not contain a comma"),
        });
    } else if label.eq_ignore_ascii_case(RESERVED_DEVICE_LABEL) {
        errors.push(ValidationError {
            path: path.to_string(),
            message: format!("Label {label:?} is reserved"),
        });
    }
}

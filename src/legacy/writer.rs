//! Serializer for the legacy line format.
//!
//! Emits one directive per structural element, grouped into a block per
//! device: the load directive, property directives, then the auxiliary
//! directives in a fixed sub-order (delay, focus direction, state labels by
//! ascending index, children in list order). Re-parsing the output yields a
//! document equal to the input.

use crate::schema::{CoreProperties, Device, Document};
use crate::validate::RESERVED_DEVICE_LABEL;

use super::{Keyword, DELIM};

/// Render a document as legacy configuration text.
///
/// Only data the line format can carry is written: the `extra` map, the
/// schema version, and the parallel-initialization flag have no directives
/// and are dropped. Presets without settings and empty state-label or
/// children containers likewise have no line form. Field values containing
/// the delimiter produce text that will not re-parse; documents built from
/// validated sources cannot contain them in labels, but property values are
/// unconstrained. Two more shapes shift on a re-parse: the reader trims
/// line edges, so a value ending in whitespace loses it at the end of a
/// line, and a `Parent` directive materializes both of its operands, so a
/// `children` entry naming a device the document does not define comes
/// back with a placeholder device appended.
pub fn serialize(document: &Document) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("# Generated by scope-config".to_string());

    if !document.devices.is_empty() {
        lines.push(String::new());
        lines.push("# Devices".to_string());
        for device in &document.devices {
            device_block(device, &mut lines);
        }
    }

    let core = core_lines(&document.core_properties);
    if !core.is_empty() {
        lines.push(String::new());
        lines.push("# Core properties".to_string());
        lines.extend(core);
    }

    for group in &document.configuration_groups {
        lines.push(String::new());
        lines.push(format!("# Group: {}", group.name));
        if group.configurations.is_empty() {
            // The declaration line keeps settings-free groups alive across
            // a round trip.
            lines.push(join(&[Keyword::ConfigGroup.as_str(), &group.name]));
        }
        for configuration in &group.configurations {
            lines.push(format!("# Preset: {}", configuration.name));
            for setting in &configuration.settings {
                lines.push(join(&[
                    Keyword::ConfigGroup.as_str(),
                    &group.name,
                    &configuration.name,
                    &setting.device,
                    &setting.property,
                    &setting.value,
                ]));
            }
        }
    }

    for pixel in &document.pixel_size_configurations {
        lines.push(String::new());
        lines.push(format!("# Resolution preset: {}", pixel.name));
        for setting in &pixel.settings {
            lines.push(join(&[
                Keyword::ConfigPixelSize.as_str(),
                &pixel.name,
                &setting.device,
                &setting.property,
                &setting.value,
            ]));
        }
        lines.push(join(&[
            Keyword::PixelSizeUm.as_str(),
            &pixel.name,
            &pixel.pixel_size_um.to_string(),
        ]));
        if let Some(matrix) = &pixel.affine_matrix {
            let elements: Vec<String> = matrix.iter().map(ToString::to_string).collect();
            let mut fields = vec![Keyword::PixelSizeAffine.as_str(), &pixel.name];
            fields.extend(elements.iter().map(String::as_str));
            lines.push(join(&fields));
        }
        if let Some(dxdz) = pixel.dxdz {
            lines.push(join(&[Keyword::PixelSizeAngleDxdz.as_str(), &pixel.name, &dxdz.to_string()]));
        }
        if let Some(dydz) = pixel.dydz {
            lines.push(join(&[Keyword::PixelSizeAngleDydz.as_str(), &pixel.name, &dydz.to_string()]));
        }
        if let Some(optimal_z) = pixel.optimal_z_um {
            lines.push(join(&[
                Keyword::PixelSizeOptimalZUm.as_str(),
                &pixel.name,
                &optimal_z.to_string(),
            ]));
        }
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn device_block(device: &Device, lines: &mut Vec<String>) {
    lines.push(join(&[
        Keyword::Device.as_str(),
        &device.label,
        &device.library,
        &device.name,
    ]));
    for property in &device.pre_init_properties {
        lines.push(join(&[
            Keyword::PreInitProperty.as_str(),
            &device.label,
            &property.property,
            &property.value,
        ]));
    }
    for property in &device.post_init_properties {
        lines.push(join(&[
            Keyword::Property.as_str(),
            &device.label,
            &property.property,
            &property.value,
        ]));
    }
    if let Some(delay) = device.delay_ms {
        lines.push(join(&[Keyword::Delay.as_str(), &device.label, &delay.to_string()]));
    }
    if let Some(direction) = device.focus_direction {
        lines.push(join(&[
            Keyword::FocusDirection.as_str(),
            &device.label,
            &direction.as_i8().to_string(),
        ]));
    }
    if let Some(labels) = &device.state_labels {
        for (state, label) in labels {
            lines.push(join(&[
                Keyword::Label.as_str(),
                &device.label,
                &state.to_string(),
                label,
            ]));
        }
    }
    if let Some(children) = &device.children {
        for child in children {
            lines.push(join(&[Keyword::Parent.as_str(), child, &device.label]));
        }
    }
}

fn core_lines(core: &CoreProperties) -> Vec<String> {
    let roles = [
        ("Camera", &core.camera_device),
        ("XYStage", &core.xy_stage_device),
        ("Focus", &core.focus_device),
        ("AutoFocus", &core.auto_focus_device),
        ("Shutter", &core.shutter_device),
        ("ImageProcessor", &core.image_processor_device),
        ("SLM", &core.slm_device),
        ("Galvo", &core.galvo_device),
        ("ChannelGroup", &core.channel_group),
    ];
    let mut lines = Vec::new();
    for (property, value) in roles {
        if let Some(value) = value {
            lines.push(core_line(property, value));
        }
    }
    if let Some(auto_shutter) = core.auto_shutter {
        lines.push(core_line("AutoShutter", if auto_shutter { "1" } else { "0" }));
    }
    if let Some(timeout) = core.timeout_ms {
        lines.push(core_line("TimeoutMs", &timeout.to_string()));
    }
    lines
}

fn core_line(property: &str, value: &str) -> String {
    join(&[Keyword::Property.as_str(), RESERVED_DEVICE_LABEL, property, value])
}

fn join(fields: &[&str]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(DELIM);
        }
        line.push_str(field);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::parse;
    use crate::schema::{
        ConfigGroup, Configuration, FocusDirection, PixelSizeConfiguration, PropertySetting,
        PropertyValue,
    };
    use std::collections::BTreeMap;

    fn directive_lines(text: &str) -> Vec<&str> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect()
    }

    #[test]
    fn test_device_block_layout_and_sub_order() {
        let mut document = Document::default();
        let mut wheel = Device::new("Wheel", "DemoCamera", "DWheel");
        wheel.pre_init_properties.push(PropertyValue::new("Port", "COM3"));
        wheel.post_init_properties.push(PropertyValue::new("Speed", "2"));
        wheel.delay_ms = Some(150.0);
        wheel.state_labels = Some(BTreeMap::from([
            (2, "Cy5".to_string()),
            (0, "DAPI".to_string()),
        ]));
        document.devices.push(wheel);

        let text = serialize(&document);
        assert_eq!(
            directive_lines(&text),
            vec![
                "Device,Wheel,DemoCamera,DWheel",
                "PreInitProperty,Wheel,Port,COM3",
                "Property,Wheel,Speed,2",
                "Delay,Wheel,150",
                "Label,Wheel,0,DAPI",
                "Label,Wheel,2,Cy5",
            ]
        );
    }

    #[test]
    fn test_children_are_written_as_parent_directives() {
        let mut document = Document::default();
        let mut hub = Device::new("Hub", "DemoHub", "DHub");
        hub.children = Some(vec!["A".to_string(), "B".to_string()]);
        document.devices.push(hub);
        document.devices.push(Device::new("A", "DemoHub", "DA"));
        document.devices.push(Device::new("B", "DemoHub", "DB"));

        let text = serialize(&document);
        let lines = directive_lines(&text);
        assert!(lines.contains(&"Parent,A,Hub"));
        assert!(lines.contains(&"Parent,B,Hub"));
    }

    #[test]
    fn test_core_properties_write_in_stable_order() {
        let mut document = Document::default();
        document.core_properties.shutter_device = Some("Sh".to_string());
        document.core_properties.camera_device = Some("Cam".to_string());
        document.core_properties.auto_shutter = Some(false);
        document.core_properties.timeout_ms = Some(8000);

        let text = serialize(&document);
        assert_eq!(
            directive_lines(&text),
            vec![
                "Property,Core,Camera,Cam",
                "Property,Core,Shutter,Sh",
                "Property,Core,AutoShutter,0",
                "Property,Core,TimeoutMs,8000",
            ]
        );
    }

    #[test]
    fn test_empty_group_emits_its_declaration_line() {
        let mut document = Document::default();
        document.configuration_groups.push(ConfigGroup::new("Presets"));
        let text = serialize(&document);
        assert_eq!(directive_lines(&text), vec!["ConfigGroup,Presets"]);
        let back = parse(&text).unwrap();
        assert_eq!(back.configuration_groups, document.configuration_groups);
    }

    #[test]
    fn test_unset_pixel_fields_emit_no_directives() {
        let mut document = Document::default();
        let mut pixel = PixelSizeConfiguration::new("Res10x");
        pixel.pixel_size_um = 0.65;
        pixel.affine_matrix = Some([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        document.pixel_size_configurations.push(pixel);

        let text = serialize(&document);
        assert_eq!(
            directive_lines(&text),
            vec![
                "PixelSize_um,Res10x,0.65",
                "PixelSizeAffine,Res10x,1,0,0,0,1,0",
            ]
        );

        let back = parse(&text).unwrap();
        let pixel = &back.pixel_size_configurations[0];
        assert_eq!(pixel.pixel_size_um, 0.65);
        assert_eq!(pixel.affine_matrix, Some([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]));
        assert_eq!(pixel.dxdz, None);
        assert_eq!(pixel.dydz, None);
        assert_eq!(pixel.optimal_z_um, None);
    }

    #[test]
    fn test_serialized_text_reparses_to_an_equal_document() {
        let mut document = Document::default();

        let mut hub = Device::new("Hub", "DemoHub", "DHub");
        hub.children = Some(vec!["Stage".to_string()]);
        document.devices.push(hub);

        let mut stage = Device::new("Stage", "DemoHub", "DStage");
        stage.pre_init_properties.push(PropertyValue::new("Port", "COM1"));
        stage.focus_direction = Some(FocusDirection::TowardSample);
        stage.delay_ms = Some(12.5);
        document.devices.push(stage);

        let mut group = ConfigGroup::new("Channel");
        let mut preset = Configuration::new("DAPI");
        preset.settings.push(PropertySetting::new("Stage", "Position", "0"));
        preset.settings.push(PropertySetting::new("Stage", "Speed", ""));
        group.configurations.push(preset);
        document.configuration_groups.push(group);

        let mut pixel = PixelSizeConfiguration::new("Res40x");
        pixel.settings.push(PropertySetting::new("Objective", "Label", "40x"));
        pixel.pixel_size_um = 0.1625;
        pixel.dxdz = Some(0.02);
        document.pixel_size_configurations.push(pixel);

        document.core_properties.focus_device = Some("Stage".to_string());
        document.core_properties.auto_shutter = Some(true);

        let text = serialize(&document);
        let back = parse(&text).unwrap();
        assert_eq!(back, document);
    }

    #[test]
    fn test_undeclared_child_reference_materializes_as_a_placeholder() {
        let mut document = Document::default();
        let mut hub = Device::new("Hub", "DemoHub", "DHub");
        hub.children = Some(vec!["Ghost".to_string()]);
        document.devices.push(hub);
        // Label shape is checked, cross-reference existence is not.
        document.validate().unwrap();

        let text = serialize(&document);
        assert!(directive_lines(&text).contains(&"Parent,Ghost,Hub"));

        let back = parse(&text).unwrap();
        assert_eq!(back.devices.len(), 2);
        assert_eq!(back.devices[0], document.devices[0]);
        let ghost = &back.devices[1];
        assert_eq!(ghost.label, "Ghost");
        assert_eq!(ghost.library, "");
        assert_eq!(ghost.name, "");
    }
}

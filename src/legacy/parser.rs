//! Parser for the legacy line format.
//!
//! A single linear pass over the text. Device-scoped directives may arrive
//! before the device's own load directive; the parser then creates the
//! device lazily and keeps collecting onto it. The canonical device order
//! is the order of load directives, with never-declared devices appended
//! afterwards in first-reference order.

use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::error::{ConfigError, ParseError};
use crate::schema::{
    ConfigGroup, Configuration, CoreProperties, Device, Document, FocusDirection,
    PixelSizeConfiguration, PropertySetting, PropertyValue,
};
use crate::validate::RESERVED_DEVICE_LABEL;

use super::{Keyword, DELIM};

/// Parse legacy configuration text into a validated [`Document`].
///
/// Each line is trimmed before splitting, so indentation and trailing
/// whitespace (including the `\r` of CRLF files) never reach field values;
/// whitespace inside a field survives. The parse aborts at the first
/// malformed line with its line number and content; a silently skipped
/// directive could leave the configuration dangerously incomplete. A
/// structurally clean parse is then checked against the same cross-field
/// rules as tree construction, so the returned document is always valid.
pub fn parse(text: &str) -> Result<Document, ConfigError> {
    let mut parser = Parser::default();
    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        parser.directive(index + 1, line)?;
    }
    let document = parser.finish();
    document.validate()?;
    Ok(document)
}

struct DeviceSlot {
    device: Device,
    declared: bool,
}

#[derive(Default)]
struct Parser {
    devices: HashMap<String, DeviceSlot>,
    declared: Vec<String>,
    referenced: Vec<String>,

    groups: Vec<ConfigGroup>,
    group_index: HashMap<String, usize>,

    pixel_sizes: Vec<PixelSizeConfiguration>,
    pixel_index: HashMap<String, usize>,

    core: CoreProperties,
}

impl Parser {
    fn directive(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        let fields: Vec<&str> = line.split(DELIM).collect();
        let keyword_token = fields[0];
        let args = &fields[1..];

        let Some(keyword) = Keyword::parse(keyword_token) else {
            return Err(ParseError::new(
                line_no,
                line,
                format!("Unrecognized directive {keyword_token:?}"),
            ));
        };
        match keyword {
            Keyword::Device => self.device(line_no, line, args),
            Keyword::PreInitProperty => self.property(line_no, line, args, true),
            Keyword::Property => self.property(line_no, line, args, false),
            Keyword::Delay => self.delay(line_no, line, args),
            Keyword::FocusDirection => self.focus_direction(line_no, line, args),
            Keyword::Label => self.state_label(line_no, line, args),
            Keyword::Parent => self.parent(line_no, line, args),
            Keyword::ConfigGroup => self.config_group(line_no, line, args),
            Keyword::ConfigPixelSize => self.pixel_setting(line_no, line, args),
            Keyword::PixelSizeUm => {
                self.pixel_scalar(line_no, line, args, "pixel size", |p, v| p.pixel_size_um = v)
            }
            Keyword::PixelSizeAffine => self.pixel_affine(line_no, line, args),
            Keyword::PixelSizeAngleDxdz => {
                self.pixel_scalar(line_no, line, args, "dx/dz angle", |p, v| p.dxdz = Some(v))
            }
            Keyword::PixelSizeAngleDydz => {
                self.pixel_scalar(line_no, line, args, "dy/dz angle", |p, v| p.dydz = Some(v))
            }
            Keyword::PixelSizeOptimalZUm => {
                self.pixel_scalar(line_no, line, args, "optimal z step", |p, v| {
                    p.optimal_z_um = Some(v)
                })
            }
            Keyword::Config | Keyword::Equipment | Keyword::ImageSynchro => {
                warn!(
                    line = line_no,
                    directive = keyword.as_str(),
                    "Skipping obsolete directive"
                );
                Ok(())
            }
        }
    }

    // =========================================================================
    // Device-scoped directives
    // =========================================================================

    fn device(&mut self, line_no: usize, line: &str, args: &[&str]) -> Result<(), ParseError> {
        expect_fields(line_no, line, args, 3)?;
        let (label, library, name) = (args[0], args[1], args[2]);
        if let Some(slot) = self.devices.get_mut(label) {
            if slot.declared {
                warn!(
                    line = line_no,
                    device = label,
                    "Device already declared, keeping the first declaration"
                );
                return Ok(());
            }
            // Fills in a device created lazily by an earlier reference.
            slot.device.library = library.to_string();
            slot.device.name = name.to_string();
            slot.declared = true;
        } else {
            self.devices.insert(
                label.to_string(),
                DeviceSlot {
                    device: Device::new(label, library, name),
                    declared: true,
                },
            );
        }
        self.declared.push(label.to_string());
        Ok(())
    }

    fn property(
        &mut self,
        line_no: usize,
        line: &str,
        args: &[&str],
        pre_init: bool,
    ) -> Result<(), ParseError> {
        let (label, property, value) = match args {
            [label, property] => (*label, *property, ""),
            [label, property, value] => (*label, *property, *value),
            _ => {
                return Err(ParseError::new(
                    line_no,
                    line,
                    format!("Expected 2 or 3 fields after the directive, found {}", args.len()),
                ));
            }
        };
        if label == RESERVED_DEVICE_LABEL {
            if pre_init {
                return Err(ParseError::new(
                    line_no,
                    line,
                    "Core properties cannot be set before initialization",
                ));
            }
            return self.core_property(line_no, line, property, value);
        }
        let entry = PropertyValue::new(property, value);
        let device = self.ensure_device(label);
        if pre_init {
            device.pre_init_properties.push(entry);
        } else {
            device.post_init_properties.push(entry);
        }
        Ok(())
    }

    fn delay(&mut self, line_no: usize, line: &str, args: &[&str]) -> Result<(), ParseError> {
        expect_fields(line_no, line, args, 2)?;
        let delay = parse_f64(line_no, line, args[1], "delay")?;
        self.ensure_device(args[0]).delay_ms = Some(delay);
        Ok(())
    }

    fn focus_direction(
        &mut self,
        line_no: usize,
        line: &str,
        args: &[&str],
    ) -> Result<(), ParseError> {
        expect_fields(line_no, line, args, 2)?;
        let direction = args[1]
            .parse::<i8>()
            .ok()
            .and_then(FocusDirection::from_i8)
            .ok_or_else(|| {
                ParseError::new(
                    line_no,
                    line,
                    format!("Focus direction must be -1, 0, or 1, found {:?}", args[1]),
                )
            })?;
        self.ensure_device(args[0]).focus_direction = Some(direction);
        Ok(())
    }

    fn state_label(&mut self, line_no: usize, line: &str, args: &[&str]) -> Result<(), ParseError> {
        expect_fields(line_no, line, args, 3)?;
        let state = args[1].parse::<u32>().map_err(|_| {
            ParseError::new(
                line_no,
                line,
                format!("State index must be a non-negative integer, found {:?}", args[1]),
            )
        })?;
        let device = self.ensure_device(args[0]);
        let labels = device.state_labels.get_or_insert_with(BTreeMap::new);
        if labels.insert(state, args[2].to_string()).is_some() {
            warn!(line = line_no, device = args[0], state, "State label redefined, keeping the last one");
        }
        Ok(())
    }

    fn parent(&mut self, line_no: usize, line: &str, args: &[&str]) -> Result<(), ParseError> {
        expect_fields(line_no, line, args, 2)?;
        let (child, parent) = (args[0], args[1]);
        // Forward references create the parent before the child, then
        // re-borrow the parent to record the link.
        self.ensure_device(parent);
        self.ensure_device(child);
        let device = self.ensure_device(parent);
        device.children.get_or_insert_with(Vec::new).push(child.to_string());
        Ok(())
    }

    fn ensure_device(&mut self, label: &str) -> &mut Device {
        if !self.devices.contains_key(label) {
            self.referenced.push(label.to_string());
        }
        let slot = self.devices.entry(label.to_string()).or_insert_with(|| DeviceSlot {
            device: Device::new(label, "", ""),
            declared: false,
        });
        &mut slot.device
    }

    // =========================================================================
    // Core properties
    // =========================================================================

    fn core_property(
        &mut self,
        line_no: usize,
        line: &str,
        property: &str,
        value: &str,
    ) -> Result<(), ParseError> {
        match property {
            "Camera" => self.core.camera_device = Some(value.to_string()),
            "XYStage" => self.core.xy_stage_device = Some(value.to_string()),
            "Focus" => self.core.focus_device = Some(value.to_string()),
            "AutoFocus" => self.core.auto_focus_device = Some(value.to_string()),
            "Shutter" => self.core.shutter_device = Some(value.to_string()),
            "ImageProcessor" => self.core.image_processor_device = Some(value.to_string()),
            "SLM" => self.core.slm_device = Some(value.to_string()),
            "Galvo" => self.core.galvo_device = Some(value.to_string()),
            "ChannelGroup" => self.core.channel_group = Some(value.to_string()),
            "AutoShutter" => {
                self.core.auto_shutter = Some(match value {
                    "1" => true,
                    "0" => false,
                    _ => {
                        return Err(ParseError::new(
                            line_no,
                            line,
                            format!("Core property \"AutoShutter\" takes 1 or 0, found {value:?}"),
                        ));
                    }
                });
            }
            "TimeoutMs" => {
                let timeout = value.parse::<u32>().map_err(|_| {
                    ParseError::new(
                        line_no,
                        line,
                        format!(
                            "Core property \"TimeoutMs\" takes a non-negative integer, found {value:?}"
                        ),
                    )
                })?;
                self.core.timeout_ms = Some(timeout);
            }
            "Initialize" => {
                return Err(ParseError::new(
                    line_no,
                    line,
                    "Initialization markers are not used; write PreInitProperty for pre-init settings",
                ));
            }
            _ => {
                return Err(ParseError::new(
                    line_no,
                    line,
                    format!("Unknown core property {property:?}"),
                ));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Configuration groups
    // =========================================================================

    fn config_group(&mut self, line_no: usize, line: &str, args: &[&str]) -> Result<(), ParseError> {
        match args {
            [group] => {
                self.ensure_group(group);
                Ok(())
            }
            [group, preset, device, property] => {
                self.group_setting(group, preset, device, property, "");
                Ok(())
            }
            [group, preset, device, property, value] => {
                self.group_setting(group, preset, device, property, value);
                Ok(())
            }
            _ => Err(ParseError::new(
                line_no,
                line,
                format!("Expected 1, 4, or 5 fields after the directive, found {}", args.len()),
            )),
        }
    }

    fn group_setting(&mut self, group: &str, preset: &str, device: &str, property: &str, value: &str) {
        let group = self.ensure_group(group);
        // Duplicate preset names merge: later directives append to the
        // existing preset rather than starting a second one.
        let index = match group.configurations.iter().position(|c| c.name == preset) {
            Some(index) => index,
            None => {
                group.configurations.push(Configuration::new(preset));
                group.configurations.len() - 1
            }
        };
        group.configurations[index]
            .settings
            .push(PropertySetting::new(device, property, value));
    }

    fn ensure_group(&mut self, name: &str) -> &mut ConfigGroup {
        let index = match self.group_index.get(name) {
            Some(&index) => index,
            None => {
                let index = self.groups.len();
                self.group_index.insert(name.to_string(), index);
                self.groups.push(ConfigGroup::new(name));
                index
            }
        };
        &mut self.groups[index]
    }

    // =========================================================================
    // Pixel-size calibrations
    // =========================================================================

    fn pixel_setting(&mut self, line_no: usize, line: &str, args: &[&str]) -> Result<(), ParseError> {
        expect_fields(line_no, line, args, 4)?;
        let setting = PropertySetting::new(args[1], args[2], args[3]);
        self.ensure_pixel_size(args[0]).settings.push(setting);
        Ok(())
    }

    fn pixel_scalar(
        &mut self,
        line_no: usize,
        line: &str,
        args: &[&str],
        what: &str,
        assign: fn(&mut PixelSizeConfiguration, f64),
    ) -> Result<(), ParseError> {
        expect_fields(line_no, line, args, 2)?;
        let value = parse_f64(line_no, line, args[1], what)?;
        assign(self.ensure_pixel_size(args[0]), value);
        Ok(())
    }

    fn pixel_affine(&mut self, line_no: usize, line: &str, args: &[&str]) -> Result<(), ParseError> {
        expect_fields(line_no, line, args, 7)?;
        let mut matrix = [0.0; 6];
        for (slot, field) in matrix.iter_mut().zip(&args[1..]) {
            *slot = parse_f64(line_no, line, field, "affine matrix element")?;
        }
        self.ensure_pixel_size(args[0]).affine_matrix = Some(matrix);
        Ok(())
    }

    fn ensure_pixel_size(&mut self, name: &str) -> &mut PixelSizeConfiguration {
        let index = match self.pixel_index.get(name) {
            Some(&index) => index,
            None => {
                let index = self.pixel_sizes.len();
                self.pixel_index.insert(name.to_string(), index);
                self.pixel_sizes.push(PixelSizeConfiguration::new(name));
                index
            }
        };
        &mut self.pixel_sizes[index]
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    fn finish(mut self) -> Document {
        let mut document = Document::default();
        for label in self.declared {
            if let Some(slot) = self.devices.remove(&label) {
                document.devices.push(slot.device);
            }
        }
        for label in self.referenced {
            if let Some(slot) = self.devices.remove(&label) {
                warn!(device = label.as_str(), "Device referenced but never declared");
                document.devices.push(slot.device);
            }
        }
        document.configuration_groups = self.groups;
        document.pixel_size_configurations = self.pixel_sizes;
        document.core_properties = self.core;
        document
    }
}

fn expect_fields(line_no: usize, line: &str, args: &[&str], expected: usize) -> Result<(), ParseError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ParseError::new(
            line_no,
            line,
            format!("Expected {expected} fields after the directive, found {}", args.len()),
        ))
    }
}

fn parse_f64(line_no: usize, line: &str, field: &str, what: &str) -> Result<f64, ParseError> {
    field.parse().map_err(|_| {
        ParseError::new(line_no, line, format!("Expected a number for {what}, found {field:?}"))
    })
}

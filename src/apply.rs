//! Ordered application of a document onto a device-control runtime.
//!
//! The core itself never touches hardware. [`CoreRuntime`] is the seam an
//! adapter implements against the actual control core; [`apply_document`]
//! drives it through the required call ordering. The ordering is
//! load-bearing: post-init properties before initialization, or role
//! assignments before the devices exist, are exactly the bugs this sequence
//! prevents. Steps run strictly one after another and the first failure
//! aborts the rest.

use anyhow::Result;
use tracing::info;

use crate::schema::{CoreProperties, Document, FocusDirection};
use crate::validate::RESERVED_GROUP_NAME;

/// Preset activated at the end of a load when the runtime defines it.
pub const STARTUP_PRESET: &str = "Startup";

/// Operations a device-control runtime must expose to realize a document.
///
/// Implementations are expected to be synchronous wrappers over the actual
/// control core; any queuing or retry policy lives behind this trait, not
/// in the sequencer.
pub trait CoreRuntime {
    /// Unload every currently loaded device.
    fn unload_all_devices(&mut self) -> Result<()>;

    /// Load one device adapter under the given label.
    fn load_device(&mut self, label: &str, library: &str, name: &str) -> Result<()>;

    /// Set a device property. Used for both pre- and post-init settings.
    fn set_property(&mut self, label: &str, property: &str, value: &str) -> Result<()>;

    /// Initialize every loaded device.
    fn initialize_all_devices(&mut self) -> Result<()>;

    /// Set the action delay for one device.
    fn set_device_delay_ms(&mut self, label: &str, delay_ms: f64) -> Result<()>;

    /// Set the focus direction of a stage device.
    fn set_focus_direction(&mut self, label: &str, direction: FocusDirection) -> Result<()>;

    /// Attach a human-readable label to one state of a state device.
    fn define_state_label(&mut self, label: &str, state: u32, state_label: &str) -> Result<()>;

    /// Assign the default camera role.
    fn set_camera_device(&mut self, device: &str) -> Result<()>;

    /// Assign the default XY stage role.
    fn set_xy_stage_device(&mut self, device: &str) -> Result<()>;

    /// Assign the default focus stage role.
    fn set_focus_device(&mut self, device: &str) -> Result<()>;

    /// Assign the default autofocus role.
    fn set_auto_focus_device(&mut self, device: &str) -> Result<()>;

    /// Assign the default shutter role.
    fn set_shutter_device(&mut self, device: &str) -> Result<()>;

    /// Assign the default image processor role.
    fn set_image_processor_device(&mut self, device: &str) -> Result<()>;

    /// Assign the default spatial light modulator role.
    fn set_slm_device(&mut self, device: &str) -> Result<()>;

    /// Assign the default galvo role.
    fn set_galvo_device(&mut self, device: &str) -> Result<()>;

    /// Name the configuration group used as the channel selector.
    fn set_channel_group(&mut self, group: &str) -> Result<()>;

    /// Enable or disable the automatic shutter.
    fn set_auto_shutter(&mut self, enabled: bool) -> Result<()>;

    /// Set the device operation timeout.
    fn set_timeout_ms(&mut self, timeout_ms: u32) -> Result<()>;

    /// Add one setting to a group preset, creating group and preset as
    /// needed.
    fn define_config(
        &mut self,
        group: &str,
        preset: &str,
        device: &str,
        property: &str,
        value: &str,
    ) -> Result<()>;

    /// Add one device setting to a pixel-size calibration preset.
    fn define_pixel_size_config(
        &mut self,
        preset: &str,
        device: &str,
        property: &str,
        value: &str,
    ) -> Result<()>;

    /// Set the physical pixel size of a calibration preset.
    fn set_pixel_size_um(&mut self, preset: &str, pixel_size_um: f64) -> Result<()>;

    /// Set the affine correction of a calibration preset.
    fn set_pixel_size_affine(&mut self, preset: &str, matrix: &[f64; 6]) -> Result<()>;

    /// Set the dx/dz shear ratio of a calibration preset.
    fn set_pixel_size_dxdz(&mut self, preset: &str, dxdz: f64) -> Result<()>;

    /// Set the dy/dz shear ratio of a calibration preset.
    fn set_pixel_size_dydz(&mut self, preset: &str, dydz: f64) -> Result<()>;

    /// Set the preferred z step of a calibration preset.
    fn set_pixel_size_optimal_z_um(&mut self, preset: &str, optimal_z_um: f64) -> Result<()>;

    /// Whether the runtime currently has the named preset defined.
    fn is_config_defined(&self, group: &str, preset: &str) -> bool;

    /// Activate a group preset.
    fn set_config(&mut self, group: &str, preset: &str) -> Result<()>;

    /// Block until all devices report ready.
    fn wait_for_system(&mut self) -> Result<()>;

    /// Refresh any cached device state after the load.
    fn update_system_state_cache(&mut self) -> Result<()>;
}

/// Drive `runtime` through the full load sequence for `document`.
///
/// The order is: unload, load devices, pre-init settings, initialize,
/// post-init settings, per-device auxiliary settings (delay, focus
/// direction, state labels by ascending index), core properties, group
/// presets, pixel-size calibrations, then the runtime's own
/// `System`/`Startup` preset if it has one defined. The sequence always
/// ends by waiting for the system to settle and refreshing cached state.
///
/// Device `children` lists are not applied anywhere: hub topology is
/// discovered by the runtime during initialization, and the lists exist for
/// configuration tooling.
pub fn apply_document<R: CoreRuntime + ?Sized>(runtime: &mut R, document: &Document) -> Result<()> {
    info!(devices = document.devices.len(), "Applying configuration");
    runtime.unload_all_devices()?;

    for device in &document.devices {
        runtime.load_device(&device.label, &device.library, &device.name)?;
    }
    for (label, property) in document.pre_init_settings() {
        runtime.set_property(label, &property.property, &property.value)?;
    }

    runtime.initialize_all_devices()?;

    for (label, property) in document.post_init_settings() {
        runtime.set_property(label, &property.property, &property.value)?;
    }
    for device in &document.devices {
        if let Some(delay) = device.delay_ms {
            runtime.set_device_delay_ms(&device.label, delay)?;
        }
        if let Some(direction) = device.focus_direction {
            runtime.set_focus_direction(&device.label, direction)?;
        }
        if let Some(labels) = &device.state_labels {
            for (state, label) in labels {
                runtime.define_state_label(&device.label, *state, label)?;
            }
        }
    }

    apply_core_properties(runtime, &document.core_properties)?;

    for group in &document.configuration_groups {
        for configuration in &group.configurations {
            for setting in &configuration.settings {
                runtime.define_config(
                    &group.name,
                    &configuration.name,
                    &setting.device,
                    &setting.property,
                    &setting.value,
                )?;
            }
        }
    }

    for pixel in &document.pixel_size_configurations {
        for setting in &pixel.settings {
            runtime.define_pixel_size_config(
                &pixel.name,
                &setting.device,
                &setting.property,
                &setting.value,
            )?;
        }
        runtime.set_pixel_size_um(&pixel.name, pixel.pixel_size_um)?;
        if let Some(matrix) = &pixel.affine_matrix {
            runtime.set_pixel_size_affine(&pixel.name, matrix)?;
        }
        if let Some(dxdz) = pixel.dxdz {
            runtime.set_pixel_size_dxdz(&pixel.name, dxdz)?;
        }
        if let Some(dydz) = pixel.dydz {
            runtime.set_pixel_size_dydz(&pixel.name, dydz)?;
        }
        if let Some(optimal_z) = pixel.optimal_z_um {
            runtime.set_pixel_size_optimal_z_um(&pixel.name, optimal_z)?;
        }
    }

    if runtime.is_config_defined(RESERVED_GROUP_NAME, STARTUP_PRESET) {
        info!("Activating startup preset");
        runtime.set_config(RESERVED_GROUP_NAME, STARTUP_PRESET)?;
    }
    runtime.wait_for_system()?;
    runtime.update_system_state_cache()?;
    Ok(())
}

fn apply_core_properties<R: CoreRuntime + ?Sized>(
    runtime: &mut R,
    core: &CoreProperties,
) -> Result<()> {
    if let Some(device) = &core.camera_device {
        runtime.set_camera_device(device)?;
    }
    if let Some(device) = &core.xy_stage_device {
        runtime.set_xy_stage_device(device)?;
    }
    if let Some(device) = &core.focus_device {
        runtime.set_focus_device(device)?;
    }
    if let Some(device) = &core.auto_focus_device {
        runtime.set_auto_focus_device(device)?;
    }
    if let Some(device) = &core.shutter_device {
        runtime.set_shutter_device(device)?;
    }
    if let Some(device) = &core.image_processor_device {
        runtime.set_image_processor_device(device)?;
    }
    if let Some(device) = &core.slm_device {
        runtime.set_slm_device(device)?;
    }
    if let Some(device) = &core.galvo_device {
        runtime.set_galvo_device(device)?;
    }
    if let Some(group) = &core.channel_group {
        runtime.set_channel_group(group)?;
    }
    if let Some(enabled) = core.auto_shutter {
        runtime.set_auto_shutter(enabled)?;
    }
    if let Some(timeout) = core.timeout_ms {
        runtime.set_timeout_ms(timeout)?;
    }
    Ok(())
}

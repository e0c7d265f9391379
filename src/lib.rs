//! `scope-config`
//!
//! Configuration model for microscope device-control systems: a typed,
//! validated document describing which device adapters to load, how to
//! initialize them, named configuration presets, pixel-size calibrations,
//! and global role assignments.
//!
//! The crate is a pure core: parsing, validation, and serialization are
//! synchronous transformations with no hardware access. Realizing a
//! document on an actual control core happens through the
//! [`CoreRuntime`] seam and the ordering contract in [`apply_document`].
//!
//! ## Surfaces
//!
//! - **Structured documents**: JSON or YAML trees, decoded exhaustively so
//!   every violated field is reported at once ([`Document::from_tree`],
//!   [`Document::from_json_str`], [`Document::from_yaml_str`]).
//! - **Legacy text**: the historical line-oriented, comma-delimited format
//!   ([`legacy::parse`], [`legacy::serialize`]). Parsing aborts at the
//!   first malformed line; serializing then re-parsing yields an equal
//!   document.
//! - **Files**: extension-dispatched reading, writing, and conversion
//!   ([`read_document`], [`write_document`], [`convert_file`]).
//!
//! ## Example
//!
//! ```rust
//! use scope_config::legacy;
//!
//! # fn main() -> Result<(), scope_config::ConfigError> {
//! let document = legacy::parse("Device,Camera,DemoCamera,DCam\nProperty,Camera,Gain,5")?;
//! assert_eq!(document.devices.len(), 1);
//!
//! let json = document.to_json_string()?;
//! assert!(json.contains("\"Gain\""));
//! # Ok(())
//! # }
//! ```

pub mod apply;
pub mod convert;
pub mod error;
pub mod legacy;
pub mod schema;
pub mod validate;

// Re-exports for convenience
pub use apply::{apply_document, CoreRuntime, STARTUP_PRESET};
pub use convert::{convert_file, read_document, write_document, DocumentFormat};
pub use error::{ConfigError, ParseError, ValidationError, ValidationErrors};
pub use schema::{
    generate_json_schema, ConfigGroup, Configuration, CoreProperties, Device, Document,
    FocusDirection, PixelSizeConfiguration, PropertySetting, PropertyValue, SCHEMA_VERSION,
};
pub use validate::{is_valid_label, RESERVED_DEVICE_LABEL, RESERVED_GROUP_NAME};

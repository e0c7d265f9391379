//! Command-line interface for configuration conversion and validation.
//!
//! # Usage
//!
//! Convert between formats (direction decided by the file extensions):
//! ```bash
//! scope-config convert scope.cfg scope.json
//! ```
//!
//! Validate any supported file, reporting every problem at once:
//! ```bash
//! scope-config validate scope.cfg
//! ```
//!
//! Dump the JSON Schema of the structured document format:
//! ```bash
//! scope-config schema --output document.schema.json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use scope_config::{convert, generate_json_schema, ConfigError, DocumentFormat};

#[derive(Parser)]
#[command(name = "scope-config")]
#[command(about = "Convert and validate device-control configuration files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a configuration file between the legacy and structured formats
    Convert {
        /// Input file (.cfg, .json, .yaml, or .yml)
        input: PathBuf,

        /// Output file; omit to print to stdout (legacy input becomes JSON,
        /// structured input becomes legacy text)
        output: Option<PathBuf>,
    },

    /// Parse and validate a configuration file
    Validate {
        /// File to check (.cfg, .json, .yaml, or .yml)
        input: PathBuf,
    },

    /// Print the JSON Schema for the structured document format
    Schema {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert { input, output } => convert_command(&input, output.as_deref()),
        Commands::Validate { input } => validate_command(&input),
        Commands::Schema { output } => schema_command(output.as_deref()),
    }
}

fn convert_command(input: &Path, output: Option<&Path>) -> Result<()> {
    match output {
        Some(output) => convert::convert_file(input, output)?,
        None => {
            let document = convert::read_document(input)?;
            let target = match DocumentFormat::from_path(input)? {
                DocumentFormat::Legacy => DocumentFormat::Json,
                DocumentFormat::Json | DocumentFormat::Yaml => DocumentFormat::Legacy,
            };
            let text = convert::document_to_string(&document, target)?;
            if text.ends_with('\n') {
                print!("{text}");
            } else {
                println!("{text}");
            }
        }
    }
    Ok(())
}

fn validate_command(input: &Path) -> Result<()> {
    match convert::read_document(input) {
        Ok(document) => {
            println!(
                "OK: {} ({} devices, {} groups, {} pixel size presets)",
                input.display(),
                document.devices.len(),
                document.configuration_groups.len(),
                document.pixel_size_configurations.len()
            );
            Ok(())
        }
        Err(ConfigError::Validation(errors)) => {
            eprintln!("{} is invalid:", input.display());
            for error in errors.iter() {
                eprintln!("  {error}");
            }
            std::process::exit(1);
        }
        Err(ConfigError::Parse(error)) => {
            eprintln!("{} is invalid:", input.display());
            eprintln!("  {error}");
            std::process::exit(1);
        }
        Err(other) => Err(other.into()),
    }
}

fn schema_command(output: Option<&Path>) -> Result<()> {
    let schema = generate_json_schema()?;
    match output {
        Some(path) => std::fs::write(path, schema)?,
        None => println!("{schema}"),
    }
    Ok(())
}

//! Configuration loading, validation, and resolution for torchup.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//! - Layering flags over the file in [`settings`]
//!
//! # Example
//!
//! ```
//! use torchup::config::{load_config, validate};
//! use torchup::variant::VariantTag;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("torchup.yml"), "variant: cu118").unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.variant, Some(VariantTag::Cu118));
//! ```
//!
//! # Configuration File Locations
//!
//! The first file found is used:
//! 1. `torchup.yml`
//! 2. `.torchup/config.yml`
//!
//! `--config <PATH>` replaces discovery.

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validator;

pub use loader::{discover_config, load_config, load_config_file, parse_config};
pub use schema::TorchupConfig;
pub use settings::{default_python, Settings, SettingsOverrides};
pub use validator::{validate, validate_config, ValidationError};

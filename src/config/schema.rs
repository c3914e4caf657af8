//! Configuration schema definitions for torchup.
//!
//! This module contains the struct that maps to the YAML configuration
//! file format. Every field is optional; anything left out falls back to
//! command-line flags or built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::install::PinnedVersions;
use crate::variant::VariantTag;

/// Root configuration structure for torchup.yml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TorchupConfig {
    /// Interpreter to install into (relative paths are resolved against the project root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<PathBuf>,

    /// Base URL of the per-variant wheel indexes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_url_base: Option<String>,

    /// Fixed variant instead of detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantTag>,

    /// Pass --upgrade to pip (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<bool>,

    /// Run ensurepip and upgrade pip before installing (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_pip: Option<bool>,

    /// Explicit path to nvidia-smi
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic_tool: Option<PathBuf>,

    /// Exact package versions
    #[serde(skip_serializing_if = "PinnedVersions::is_empty")]
    pub pins: PinnedVersions,
}

//! Configuration file discovery and loading.
//!
//! The first existing file among these wins (no merging):
//! 1. `torchup.yml` in the project root
//! 2. `.torchup/config.yml` in the project root

use crate::config::schema::TorchupConfig;
use crate::error::{Result, TorchupError};
use std::fs;
use std::path::{Path, PathBuf};

/// Candidate config file locations relative to the project root, in priority order.
pub const CONFIG_CANDIDATES: &[&str] = &["torchup.yml", ".torchup/config.yml"];

/// Find the config file for a project root, if any.
pub fn discover_config(project_root: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|candidate| project_root.join(candidate))
        .find(|path| path.is_file())
}

/// Load a single config file and parse it into TorchupConfig.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<TorchupConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TorchupError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            TorchupError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into TorchupConfig.
///
/// An empty document yields the default configuration.
pub fn parse_config(content: &str, source_path: &Path) -> Result<TorchupConfig> {
    if content.trim().is_empty() {
        return Ok(TorchupConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| TorchupError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load config with optional path override.
///
/// If `config_override` is provided, that file must exist. Otherwise the
/// discovered file is loaded, or the default config when there is none.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<TorchupConfig> {
    let path = match config_override {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(project_root),
    };

    match path {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            load_config_file(&path)
        }
        None => {
            tracing::debug!("No config file under {}", project_root.display());
            Ok(TorchupConfig::default())
        }
    }
}

//! Effective settings for one run.
//!
//! Command-line flags and environment variables win over the config file,
//! which wins over built-in defaults.

use std::path::{Path, PathBuf};

use crate::config::schema::TorchupConfig;
use crate::config::validator::{validate, validate_index_url_base};
use crate::error::{Result, TorchupError};
use crate::install::{PinnedVersions, DEFAULT_INDEX_URL_BASE};
use crate::shell::platform::venv_python;
use crate::variant::VariantTag;

/// Values supplied on the command line (or through their env vars).
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub python: Option<PathBuf>,
    pub index_url_base: Option<String>,
    pub variant: Option<VariantTag>,
    pub pins: PinnedVersions,
    pub skip_pip_bootstrap: bool,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Interpreter that receives the packages.
    pub python: PathBuf,
    /// Base URL of the per-variant indexes.
    pub index_url_base: String,
    /// Variant fixed by the operator, bypassing detection.
    pub variant: Option<VariantTag>,
    /// Pass `--upgrade` to pip.
    pub upgrade: bool,
    /// Run the pip bootstrap before installing.
    pub bootstrap_pip: bool,
    /// Explicit diagnostic tool path.
    pub diagnostic_tool: Option<PathBuf>,
    /// Operator pins (interpreter defaults are applied later).
    pub pins: PinnedVersions,
}

impl Settings {
    /// Layer `overrides` over `config` over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidationError` when the config file or an override
    /// holds an invalid pin or index base.
    pub fn resolve(
        config: &TorchupConfig,
        overrides: &SettingsOverrides,
        project_root: &Path,
    ) -> Result<Self> {
        validate(config)?;
        overrides
            .pins
            .validate()
            .map_err(|message| TorchupError::ConfigValidationError { message })?;
        if let Some(base) = &overrides.index_url_base {
            validate_index_url_base(base)
                .map_err(|message| TorchupError::ConfigValidationError { message })?;
        }

        let python = overrides
            .python
            .clone()
            .or_else(|| config.python.clone())
            .map(|p| resolve_relative(&p, project_root))
            .unwrap_or_else(|| default_python(project_root));

        let index_url_base = overrides
            .index_url_base
            .clone()
            .or_else(|| config.index_url_base.clone())
            .unwrap_or_else(|| DEFAULT_INDEX_URL_BASE.to_string());

        let settings = Self {
            python,
            index_url_base: index_url_base.trim().to_string(),
            variant: overrides.variant.or(config.variant),
            upgrade: config.upgrade.unwrap_or(true),
            bootstrap_pip: !overrides.skip_pip_bootstrap && config.bootstrap_pip.unwrap_or(true),
            diagnostic_tool: config
                .diagnostic_tool
                .as_deref()
                .map(|p| resolve_relative(p, project_root)),
            pins: overrides.pins.clone().fill_from(&config.pins),
        };

        tracing::debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }
}

/// The project's `.venv` interpreter if present, else the platform's python.
pub fn default_python(project_root: &Path) -> PathBuf {
    let venv = venv_python(&project_root.join(".venv"));
    if venv.is_file() {
        return venv;
    }
    if cfg!(windows) {
        PathBuf::from("python")
    } else {
        PathBuf::from("python3")
    }
}

/// Join relative multi-component paths to `project_root`.
///
/// Bare names such as `python3` are left for PATH lookup.
fn resolve_relative(path: &Path, project_root: &Path) -> PathBuf {
    if path.is_absolute() || path.components().count() < 2 {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

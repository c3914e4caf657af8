//! Error types for torchup operations.
//!
//! This module defines [`TorchupError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Subprocess failures (pip, nvidia-smi, the runtime probe) are reported as
//!   data by the component that ran them, not as `TorchupError`
//! - Use `TorchupError` for configuration, I/O, and other conditions the
//!   caller must act on
//! - Use `anyhow::Error` (via `TorchupError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for torchup operations.
#[derive(Debug, Error)]
pub enum TorchupError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A subprocess could not be spawned at all.
    #[error("Failed to start {command}: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The target Python interpreter could not be run.
    #[error("Python interpreter not usable at '{path}': {message}")]
    InterpreterNotFound { path: PathBuf, message: String },

    /// The runtime probe did not produce a usable report.
    #[error("Runtime probe failed: {message}")]
    ProbeFailed { message: String },

    /// Every variant in the fallback chain failed to install.
    #[error("Installation failed for every variant (last tried: {last})")]
    AllVariantsFailed { last: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TorchupError {
    /// Process exit status for an error that ends the run.
    ///
    /// Configuration problems exit with 2; everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigNotFound { .. }
            | Self::ConfigParseError { .. }
            | Self::ConfigValidationError { .. } => 2,
            _ => 1,
        }
    }
}

/// Result type alias for torchup operations.
pub type Result<T> = std::result::Result<T, TorchupError>;

//! Configuration validation rules.
//!
//! - Pins must be exact versions
//! - The index base must be an http(s) URL
//! - Paths must not be empty

use crate::config::schema::TorchupConfig;
use crate::error::{Result, TorchupError};

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

/// Validate a configuration and return all errors.
///
/// This function collects all validation errors rather than stopping
/// at the first one, allowing users to fix multiple issues at once.
pub fn validate_config(config: &TorchupConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Err(message) = config.pins.validate() {
        errors.push(ValidationError {
            rule: "invalid-pin".to_string(),
            message,
        });
    }

    if let Some(base) = &config.index_url_base {
        if let Err(message) = validate_index_url_base(base) {
            errors.push(ValidationError {
                rule: "invalid-index-url".to_string(),
                message,
            });
        }
    }

    for (field, path) in [
        ("python", &config.python),
        ("diagnostic_tool", &config.diagnostic_tool),
    ] {
        if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            errors.push(ValidationError {
                rule: "empty-path".to_string(),
                message: format!("'{}' must not be empty", field),
            });
        }
    }

    errors
}

/// Check that an index base is an http(s) URL.
pub fn validate_index_url_base(base: &str) -> std::result::Result<(), String> {
    let base = base.trim();
    let rest = base
        .strip_prefix("https://")
        .or_else(|| base.strip_prefix("http://"));
    match rest {
        Some(host) if !host.trim_matches('/').is_empty() => Ok(()),
        _ => Err(format!(
            "index URL base '{}' must be an http(s) URL",
            base
        )),
    }
}

/// Validate a configuration, failing on the first batch of errors.
pub fn validate(config: &TorchupConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(TorchupError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

//! Exact version pins for the installed packages.

use serde::{Deserialize, Serialize};

use crate::detection::PythonVersion;

/// Packages installed together, in install order.
pub const PACKAGES: [&str; 3] = ["torch", "torchvision", "torchaudio"];

/// Optional exact versions for `torch`, `torchvision` and `torchaudio`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PinnedVersions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torchvision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torchaudio: Option<String>,
}

impl PinnedVersions {
    /// Pins known to work on interpreters older than Python 3.9.
    pub fn legacy_defaults() -> Self {
        Self {
            torch: Some("2.0.0".to_string()),
            torchvision: Some("0.15.1".to_string()),
            torchaudio: Some("2.0.1".to_string()),
        }
    }

    /// Fill every empty slot from `other`; slots already set win.
    pub fn fill_from(self, other: &PinnedVersions) -> Self {
        Self {
            torch: self.torch.or_else(|| other.torch.clone()),
            torchvision: self.torchvision.or_else(|| other.torchvision.clone()),
            torchaudio: self.torchaudio.or_else(|| other.torchaudio.clone()),
        }
    }

    /// Apply the interpreter-based defaults to any slot still empty.
    ///
    /// Interpreters older than 3.9 get [`legacy_defaults`](Self::legacy_defaults);
    /// newer interpreters leave empty slots unpinned.
    pub fn with_interpreter_defaults(self, python: PythonVersion) -> Self {
        if python.is_older_than(3, 9) {
            self.fill_from(&Self::legacy_defaults())
        } else {
            self
        }
    }

    /// Whether no package is pinned.
    pub fn is_empty(&self) -> bool {
        self.torch.is_none() && self.torchvision.is_none() && self.torchaudio.is_none()
    }

    /// `(package, pin)` pairs in install order.
    pub fn entries(&self) -> [(&'static str, Option<&str>); 3] {
        [
            (PACKAGES[0], self.torch.as_deref()),
            (PACKAGES[1], self.torchvision.as_deref()),
            (PACKAGES[2], self.torchaudio.as_deref()),
        ]
    }

    /// Requirement specifiers: `name==version` when pinned, bare name otherwise.
    pub fn requirements(&self) -> Vec<String> {
        self.entries()
            .iter()
            .map(|(name, pin)| match pin {
                Some(version) => format!("{}=={}", name, version),
                None => name.to_string(),
            })
            .collect()
    }

    /// Check that every pin is a plain version string.
    pub fn validate(&self) -> Result<(), String> {
        for (name, pin) in self.entries() {
            if let Some(version) = pin {
                let version = version.trim();
                if version.is_empty() {
                    return Err(format!("{} pin is empty", name));
                }
                if version.contains(char::is_whitespace)
                    || version.contains(['=', '<', '>', '!', '~', ','])
                {
                    return Err(format!(
                        "{} pin '{}' must be an exact version like 2.0.0",
                        name, version
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirements_unpinned() {
        assert_eq!(
            PinnedVersions::default().requirements(),
            vec!["torch", "torchvision", "torchaudio"]
        );
    }

    #[test]
    fn requirements_mixed_pins() {
        let pins = PinnedVersions {
            torch: Some("2.1.0".to_string()),
            torchvision: None,
            torchaudio: Some("2.1.0".to_string()),
        };
        assert_eq!(
            pins.requirements(),
            vec!["torch==2.1.0", "torchvision", "torchaudio==2.1.0"]
        );
    }

    #[test]
    fn old_interpreter_gets_legacy_defaults() {
        let pins = PinnedVersions::default().with_interpreter_defaults(PythonVersion::new(3, 8));
        assert_eq!(pins, PinnedVersions::legacy_defaults());
    }

    #[test]
    fn operator_pins_survive_interpreter_defaults() {
        let pins = PinnedVersions {
            torch: Some("1.13.1".to_string()),
            ..Default::default()
        }
        .with_interpreter_defaults(PythonVersion::new(3, 8));

        assert_eq!(pins.torch.as_deref(), Some("1.13.1"));
        assert_eq!(pins.torchvision.as_deref(), Some("0.15.1"));
        assert_eq!(pins.torchaudio.as_deref(), Some("2.0.1"));
    }

    #[test]
    fn new_interpreter_stays_unpinned() {
        let pins = PinnedVersions::default().with_interpreter_defaults(PythonVersion::new(3, 11));
        assert!(pins.is_empty());
    }

    #[test]
    fn fill_from_keeps_existing_slots() {
        let cli = PinnedVersions {
            torchaudio: Some("2.2.0".to_string()),
            ..Default::default()
        };
        let config = PinnedVersions {
            torch: Some("2.2.0".to_string()),
            torchaudio: Some("2.0.0".to_string()),
            ..Default::default()
        };
        let merged = cli.fill_from(&config);
        assert_eq!(merged.torch.as_deref(), Some("2.2.0"));
        assert_eq!(merged.torchvision, None);
        assert_eq!(merged.torchaudio.as_deref(), Some("2.2.0"));
    }

    #[test]
    fn validate_rejects_specifier_operators() {
        let pins = PinnedVersions {
            torch: Some(">=2.0".to_string()),
            ..Default::default()
        };
        assert!(pins.validate().unwrap_err().contains("exact version"));
    }

    #[test]
    fn validate_rejects_empty_pin() {
        let pins = PinnedVersions {
            torchvision: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(pins.validate().unwrap_err().contains("torchvision pin is empty"));
    }

    #[test]
    fn validate_accepts_local_versions() {
        let pins = PinnedVersions {
            torch: Some("2.1.0+cu121".to_string()),
            ..Default::default()
        };
        assert!(pins.validate().is_ok());
    }
}

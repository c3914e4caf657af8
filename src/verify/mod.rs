//! Post-install verification.
//!
//! Verification compares what the freshly installed runtime reports against
//! what the installed variant implies. It is diagnostic only: a mismatch is
//! reported to the operator but never changes the run's exit status.
//!
//! # Example
//!
//! ```
//! use torchup::verify::{verify, RuntimeProbe, VerificationReport};
//!
//! struct CpuRuntime;
//!
//! impl RuntimeProbe for CpuRuntime {
//!     fn probe(&self) -> torchup::Result<VerificationReport> {
//!         Ok(VerificationReport {
//!             runtime_version: "2.0.0+cpu".to_string(),
//!             capability: None,
//!             accelerator_available: false,
//!             device_name: None,
//!             module_path: None,
//!             driver_error: None,
//!         })
//!     }
//! }
//!
//! assert!(verify(&CpuRuntime, false).ok);
//! assert!(!verify(&CpuRuntime, true).ok);
//! ```

pub mod probe;

pub use probe::{parse_probe_output, PythonRuntimeProbe, RuntimeProbe, VerificationReport};

use serde::Serialize;

/// Checks to suggest when an accelerated install cannot accelerate.
pub const ACCELERATION_HINTS: &[&str] = &[
    "Check that the NVIDIA driver is installed and up to date (nvidia-smi should list your GPU).",
    "On Windows, check that the MSVC 2015-2022 (x64) Redistributable is installed.",
    "Launch with the environment's own python so another tool does not replace the CUDA wheels.",
];

/// Outcome of verification.
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    /// Whether the runtime matched expectation.
    pub ok: bool,
    /// Whether acceleration was expected.
    pub expected_acceleration: bool,
    /// What the runtime reported, when it could be loaded.
    pub report: Option<VerificationReport>,
    /// Why the runtime could not be loaded.
    pub failure: Option<String>,
}

impl Verification {
    /// One-line explanation of a failed verification.
    pub fn problem(&self) -> Option<String> {
        if self.ok {
            return None;
        }
        if let Some(failure) = &self.failure {
            return Some(failure.clone());
        }
        let report = self.report.as_ref()?;
        let problem = if self.expected_acceleration {
            match (&report.capability, report.accelerator_available) {
                (None, _) => "installed runtime was built without CUDA support".to_string(),
                (Some(cuda), false) => {
                    format!("runtime built for CUDA {} but no GPU is available", cuda)
                }
                (Some(_), true) => "unexpected verification state".to_string(),
            }
        } else {
            match (&report.capability, report.accelerator_available) {
                (Some(cuda), _) => format!(
                    "expected a CPU-only runtime but it was built for CUDA {}",
                    cuda
                ),
                (None, true) => "expected a CPU-only runtime but a GPU is available".to_string(),
                (None, false) => "unexpected verification state".to_string(),
            }
        };
        Some(problem)
    }

    /// Whether driver troubleshooting hints apply.
    pub fn needs_driver_hints(&self) -> bool {
        !self.ok && self.expected_acceleration
    }
}

/// Whether a report matches the expected acceleration state.
///
/// Accelerated installs need both a built-in capability version and a live
/// accelerator; baseline installs need the absence of both.
pub fn matches_expectation(report: &VerificationReport, expect_acceleration: bool) -> bool {
    let has_capability = report.capability.is_some();
    if expect_acceleration {
        has_capability && report.accelerator_available
    } else {
        !has_capability && !report.accelerator_available
    }
}

/// Probe the installed runtime and compare it with expectation.
pub fn verify(probe: &dyn RuntimeProbe, expect_acceleration: bool) -> Verification {
    match probe.probe() {
        Ok(report) => {
            let ok = matches_expectation(&report, expect_acceleration);
            if ok {
                tracing::debug!("Verification passed (expect acceleration: {})", expect_acceleration);
            } else {
                tracing::warn!(
                    "Verification mismatch (expect acceleration: {}): cuda={:?} available={}",
                    expect_acceleration,
                    report.capability,
                    report.accelerator_available
                );
            }
            Verification {
                ok,
                expected_acceleration: expect_acceleration,
                report: Some(report),
                failure: None,
            }
        }
        Err(e) => {
            tracing::warn!("Verification could not load the runtime: {}", e);
            Verification {
                ok: false,
                expected_acceleration: expect_acceleration,
                report: None,
                failure: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TorchupError};

    struct FixedProbe(Option<VerificationReport>);

    impl RuntimeProbe for FixedProbe {
        fn probe(&self) -> Result<VerificationReport> {
            self.0.clone().ok_or_else(|| TorchupError::ProbeFailed {
                message: "Failed to import torch: No module named 'torch'".to_string(),
            })
        }
    }

    fn report(capability: Option<&str>, available: bool) -> VerificationReport {
        VerificationReport {
            runtime_version: "2.0.0".to_string(),
            capability: capability.map(str::to_string),
            accelerator_available: available,
            device_name: available.then(|| "NVIDIA GeForce RTX 3080".to_string()),
            module_path: None,
            driver_error: None,
        }
    }

    #[test]
    fn accelerated_expectation_met() {
        let v = verify(&FixedProbe(Some(report(Some("11.8"), true))), true);
        assert!(v.ok);
        assert!(v.problem().is_none());
    }

    #[test]
    fn accelerated_expectation_without_capability_fails() {
        let v = verify(&FixedProbe(Some(report(None, false))), true);
        assert!(!v.ok);
        assert!(v.needs_driver_hints());
        assert!(v.problem().unwrap().contains("without CUDA"));
    }

    #[test]
    fn accelerated_expectation_without_live_device_fails() {
        let v = verify(&FixedProbe(Some(report(Some("12.1"), false))), true);
        assert!(!v.ok);
        assert!(v.problem().unwrap().contains("no GPU is available"));
    }

    #[test]
    fn baseline_expectation_met() {
        let v = verify(&FixedProbe(Some(report(None, false))), false);
        assert!(v.ok);
    }

    #[test]
    fn baseline_with_capability_present_fails() {
        let v = verify(&FixedProbe(Some(report(Some("11.8"), false))), false);
        assert!(!v.ok);
        assert!(!v.needs_driver_hints());
        assert!(v.problem().unwrap().contains("built for CUDA 11.8"));
    }

    #[test]
    fn probe_failure_is_not_ok_but_not_fatal() {
        let v = verify(&FixedProbe(None), false);
        assert!(!v.ok);
        assert!(v.report.is_none());
        assert!(v.problem().unwrap().contains("No module named 'torch'"));
    }

    #[test]
    fn matches_expectation_truth_table() {
        assert!(matches_expectation(&report(Some("11.8"), true), true));
        assert!(!matches_expectation(&report(Some("11.8"), false), true));
        assert!(!matches_expectation(&report(None, true), true));
        assert!(!matches_expectation(&report(None, false), true));

        assert!(matches_expectation(&report(None, false), false));
        assert!(!matches_expectation(&report(None, true), false));
        assert!(!matches_expectation(&report(Some("11.8"), false), false));
        assert!(!matches_expectation(&report(Some("11.8"), true), false));
    }
}

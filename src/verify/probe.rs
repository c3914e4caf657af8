//! Runtime probe: load the installed package and report what it sees.
//!
//! The production probe starts a new interpreter for every call so nothing
//! from an earlier import can leak into the answer.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TorchupError};
use crate::shell::{CommandRunner, Invocation};

/// Script run inside the target interpreter. Prints exactly one JSON line.
const PROBE_SCRIPT: &str = r#"import json, os, sys
try:
    import torch
except Exception as e:
    print(json.dumps({"error": "Failed to import torch: %s" % e}))
    sys.exit(0)
lib = os.path.join(os.path.dirname(torch.__file__), "lib")
if os.name == "nt" and os.path.isdir(lib) and hasattr(os, "add_dll_directory"):
    os.add_dll_directory(lib)
cuda = getattr(getattr(torch, "version", None), "cuda", None)
available = bool(torch.cuda.is_available())
device = None
if available:
    try:
        device = torch.cuda.get_device_name(0)
    except Exception:
        device = "(unavailable)"
driver = None
if os.name == "nt" and not available:
    try:
        import ctypes
        ctypes.WinDLL("nvcuda.dll")
    except OSError as e:
        driver = "nvcuda.dll failed to load: %s" % e
print(json.dumps({
    "version": getattr(torch, "__version__", "?"),
    "cuda": cuda,
    "available": available,
    "device": device,
    "path": getattr(torch, "__file__", None),
    "driver": driver,
}))
"#;

/// What the installed runtime reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Installed runtime version (e.g. "2.0.0+cu118").
    pub runtime_version: String,
    /// Capability version the runtime was built against, if any.
    pub capability: Option<String>,
    /// Whether an accelerator is usable right now.
    pub accelerator_available: bool,
    /// Name of accelerator device 0, when available.
    pub device_name: Option<String>,
    /// Where the runtime module was loaded from.
    pub module_path: Option<String>,
    /// Why the CUDA driver library could not be loaded (Windows only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_error: Option<String>,
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Verification:")?;
        writeln!(
            f,
            "  torch={} path={}",
            self.runtime_version,
            self.module_path.as_deref().unwrap_or("?")
        )?;
        writeln!(
            f,
            "  torch.version.cuda={} cuda_available={}",
            self.capability.as_deref().unwrap_or("None"),
            self.accelerator_available
        )?;
        write!(f, "  device={}", self.device_name.as_deref().unwrap_or("None"))?;
        if let Some(driver_error) = &self.driver_error {
            write!(f, "\n  driver={}", driver_error)?;
        }
        Ok(())
    }
}

/// Source of a [`VerificationReport`].
pub trait RuntimeProbe {
    /// Load the runtime and report its state.
    ///
    /// Returns `ProbeFailed` when the runtime cannot be loaded.
    fn probe(&self) -> Result<VerificationReport>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    cuda: Option<String>,
    #[serde(default)]
    available: bool,
    #[serde(default)]
    device: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    driver: Option<String>,
}

/// Parse the probe script's output.
///
/// The JSON object is taken from the last line that looks like one, since
/// importing the runtime may print warnings first.
pub fn parse_probe_output(stdout: &str) -> Result<VerificationReport> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|l| l.starts_with('{'))
        .ok_or_else(|| TorchupError::ProbeFailed {
            message: format!("no report in probe output: '{}'", stdout.trim()),
        })?;

    let output: ProbeOutput =
        serde_json::from_str(line).map_err(|e| TorchupError::ProbeFailed {
            message: format!("invalid probe report: {}", e),
        })?;

    if let Some(error) = output.error {
        return Err(TorchupError::ProbeFailed { message: error });
    }

    Ok(VerificationReport {
        runtime_version: output.version.unwrap_or_else(|| "?".to_string()),
        capability: output.cuda.filter(|c| !c.is_empty()),
        accelerator_available: output.available,
        device_name: output.device,
        module_path: output.path,
        driver_error: output.driver,
    })
}

/// Probes the runtime installed in a Python interpreter.
pub struct PythonRuntimeProbe<'a> {
    runner: &'a dyn CommandRunner,
    python: PathBuf,
}

impl<'a> PythonRuntimeProbe<'a> {
    pub fn new(runner: &'a dyn CommandRunner, python: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            python: python.into(),
        }
    }

    /// The probe invocation.
    pub fn invocation(&self) -> Invocation {
        Invocation::new(&self.python).args(["-c", PROBE_SCRIPT])
    }
}

impl RuntimeProbe for PythonRuntimeProbe<'_> {
    fn probe(&self) -> Result<VerificationReport> {
        let result = self
            .runner
            .run(&self.invocation())
            .map_err(|e| TorchupError::ProbeFailed {
                message: e.to_string(),
            })?;

        if !result.success {
            return Err(TorchupError::ProbeFailed {
                message: format!(
                    "probe exited with code {:?}: {}",
                    result.exit_code,
                    result.combined_output()
                ),
            });
        }

        parse_probe_output(&result.stdout)
    }
}

//! Accelerator driver capability detection via `nvidia-smi`.
//!
//! Absence of the diagnostic tool is a valid signal ("no accelerator"), not a
//! failure. A tool that exits non-zero or prints nothing recognizable is
//! treated the same way, so detection always falls back toward the CPU path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::shell::{parse_system_path, resolve_tool_path, CommandRunner, Invocation};

/// Name of the diagnostic tool looked up on PATH.
pub const DIAGNOSTIC_TOOL: &str = "nvidia-smi";

/// Environment variables that may name the diagnostic tool explicitly.
pub const DIAGNOSTIC_TOOL_ENV_VARS: &[&str] = &["NVIDIA_SMI", "NVSMI_PATH"];

/// `CUDA Version: MAJOR.MINOR` as printed in the `nvidia-smi` banner.
static CAPABILITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CUDA Version:\s*(\d+)\.(\d+)").expect("CAPABILITY_REGEX must compile")
});

/// Driver-reported capability level (the "CUDA Version" of `nvidia-smi`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CapabilityVersion {
    pub major: u32,
    pub minor: u32,
}

impl CapabilityVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for CapabilityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Extract the capability version from diagnostic tool output.
///
/// Looks for `CUDA Version: MAJOR.MINOR` anywhere in the text.
pub fn parse_capability(output: &str) -> Option<CapabilityVersion> {
    let caps = CAPABILITY_REGEX.captures(output)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    Some(CapabilityVersion::new(major, minor))
}

/// Locate the diagnostic tool.
///
/// Order: an explicitly configured path, then PATH, then the
/// `NVIDIA_SMI` / `NVSMI_PATH` environment variables.
pub fn locate_tool<F>(
    configured: Option<&Path>,
    path_entries: &[PathBuf],
    env_fn: &F,
) -> Option<PathBuf>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    if let Some(path) = configured {
        return Some(path.to_path_buf());
    }

    if let Some(path) = resolve_tool_path(DIAGNOSTIC_TOOL, path_entries) {
        return Some(path);
    }

    DIAGNOSTIC_TOOL_ENV_VARS
        .iter()
        .filter_map(|var| env_fn(var).ok())
        .find(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

/// Detects the host's accelerator capability.
pub struct CapabilityDetector<'a> {
    runner: &'a dyn CommandRunner,
    tool: Option<PathBuf>,
}

impl<'a> CapabilityDetector<'a> {
    /// Create a detector that locates the tool from the real environment.
    pub fn new(runner: &'a dyn CommandRunner, configured: Option<&Path>) -> Self {
        let tool = locate_tool(configured, &parse_system_path(), &|key: &str| {
            std::env::var(key)
        });
        Self::with_tool(runner, tool)
    }

    /// Create a detector with an already-resolved tool path (or none).
    pub fn with_tool(runner: &'a dyn CommandRunner, tool: Option<PathBuf>) -> Self {
        Self { runner, tool }
    }

    /// Path of the diagnostic tool, if one was found.
    pub fn tool(&self) -> Option<&Path> {
        self.tool.as_deref()
    }

    /// Run the diagnostic tool and report the capability version.
    ///
    /// Never fails: every problem collapses to `None`.
    pub fn detect(&self) -> Option<CapabilityVersion> {
        let Some(tool) = &self.tool else {
            tracing::debug!("{} not found; assuming no accelerator", DIAGNOSTIC_TOOL);
            return None;
        };

        let result = match self.runner.run(&Invocation::new(tool)) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("Could not run {}: {}", tool.display(), e);
                return None;
            }
        };

        if !result.success {
            tracing::debug!(
                "{} exited with {:?}; assuming no accelerator",
                tool.display(),
                result.exit_code
            );
            return None;
        }

        let version = parse_capability(&result.stdout);
        match version {
            Some(v) => tracing::debug!("Detected capability version {}", v),
            None => tracing::debug!("No capability version in {} output", tool.display()),
        }
        version
    }
}

//! Target interpreter detection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{Result, TorchupError};
use crate::shell::{CommandRunner, Invocation};

const VERSION_SCRIPT: &str = "import sys; print('%d.%d.%d' % sys.version_info[:3])";

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)").expect("VERSION_REGEX must compile"));

/// Version of the target Python interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
}

impl PythonVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Whether this version is strictly older than `major.minor`.
    pub fn is_older_than(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) < (major, minor)
    }

    /// Parse the first `MAJOR.MINOR` found in `text`.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = VERSION_REGEX.captures(text)?;
        Some(Self::new(
            caps.get(1)?.as_str().parse().ok()?,
            caps.get(2)?.as_str().parse().ok()?,
        ))
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The interpreter packages are installed into.
#[derive(Debug, Clone, Serialize)]
pub struct Interpreter {
    /// Executable path.
    pub executable: PathBuf,
    /// Full version string as printed by the interpreter (e.g. "3.8.5").
    pub version_string: String,
    /// Parsed major/minor version.
    pub version: PythonVersion,
}

impl Interpreter {
    /// Ask the interpreter at `executable` for its version.
    pub fn detect(runner: &dyn CommandRunner, executable: &Path) -> Result<Self> {
        let invocation = Invocation::new(executable).args(["-c", VERSION_SCRIPT]);
        let result = runner
            .run(&invocation)
            .map_err(|e| TorchupError::InterpreterNotFound {
                path: executable.to_path_buf(),
                message: match e {
                    TorchupError::CommandFailed { source, .. } => source.to_string(),
                    other => other.to_string(),
                },
            })?;

        if !result.success {
            return Err(TorchupError::InterpreterNotFound {
                path: executable.to_path_buf(),
                message: format!(
                    "exited with code {:?}: {}",
                    result.exit_code,
                    result.stderr.trim()
                ),
            });
        }

        let version_string = result.stdout.trim().to_string();
        let version =
            PythonVersion::parse(&version_string).ok_or_else(|| TorchupError::InterpreterNotFound {
                path: executable.to_path_buf(),
                message: format!("unrecognized version output '{}'", version_string),
            })?;

        tracing::debug!("Interpreter {} is Python {}", executable.display(), version_string);

        Ok(Self {
            executable: executable.to_path_buf(),
            version_string,
            version,
        })
    }
}

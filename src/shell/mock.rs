//! Mock command runner for testing.
//!
//! `MockRunner` implements [`CommandRunner`] without spawning processes. It
//! matches each invocation's rendered command line against configured rules
//! and records every invocation for later assertion.
//!
//! # Example
//!
//! ```
//! use torchup::shell::{CommandRunner, Invocation, MockRunner};
//!
//! let runner = MockRunner::new();
//! runner.succeed_when("nvidia-smi", "CUDA Version: 12.2");
//!
//! let result = runner.run(&Invocation::new("/usr/bin/nvidia-smi")).unwrap();
//! assert!(result.success);
//! assert_eq!(runner.invocations().len(), 1);
//! ```

use std::cell::RefCell;
use std::time::Duration;

use crate::error::{Result, TorchupError};

use super::command::{CommandResult, CommandRunner, Invocation};

#[derive(Debug, Clone)]
enum Response {
    Exit(CommandResult),
    SpawnError,
}

/// Mock command runner.
///
/// Rules are checked in the order they were added; the first rule whose
/// pattern is a substring of the rendered command line wins. Unmatched
/// invocations fail with exit code 127.
#[derive(Debug, Default)]
pub struct MockRunner {
    rules: RefCell<Vec<(String, Response)>>,
    invocations: RefCell<Vec<Invocation>>,
}

impl MockRunner {
    /// Create a runner with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit 0 with the given stdout when the command line contains `pattern`.
    pub fn succeed_when(&self, pattern: &str, stdout: &str) {
        self.push(
            pattern,
            Response::Exit(CommandResult::success(
                stdout.to_string(),
                String::new(),
                Duration::ZERO,
            )),
        );
    }

    /// Exit with `code` and the given stderr when the command line contains `pattern`.
    pub fn fail_when(&self, pattern: &str, code: i32, stderr: &str) {
        self.push(
            pattern,
            Response::Exit(CommandResult::failure(
                Some(code),
                String::new(),
                stderr.to_string(),
                Duration::ZERO,
            )),
        );
    }

    /// Fail to spawn when the command line contains `pattern`.
    pub fn spawn_error_when(&self, pattern: &str) {
        self.push(pattern, Response::SpawnError);
    }

    /// All invocations seen so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Rendered command lines of all invocations that contain `pattern`.
    pub fn calls_matching(&self, pattern: &str) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(|inv| inv.to_string())
            .filter(|line| line.contains(pattern))
            .collect()
    }

    fn push(&self, pattern: &str, response: Response) {
        self.rules.borrow_mut().push((pattern.to_string(), response));
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        self.invocations.borrow_mut().push(invocation.clone());
        let line = invocation.to_string();

        let response = self
            .rules
            .borrow()
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, response)| response.clone());

        match response {
            Some(Response::Exit(result)) => Ok(result),
            Some(Response::SpawnError) => Err(TorchupError::CommandFailed {
                command: line,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "No such file or directory (os error 2)",
                ),
            }),
            None => Ok(CommandResult::failure(
                Some(127),
                String::new(),
                format!("no mock response for: {}", line),
                Duration::ZERO,
            )),
        }
    }
}

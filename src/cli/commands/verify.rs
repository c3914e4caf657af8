//! Verify command implementation.
//!
//! The `torchup verify` command loads the installed runtime in a fresh
//! interpreter and checks its acceleration state.

use std::io::Write;

use crate::cli::args::{Expectation, VerifyArgs};
use crate::config::Settings;
use crate::error::Result;
use crate::runner::{show_verification, SetupRunner};
use crate::shell::{CommandRunner, SystemRunner};
use crate::ui::UserInterface;
use crate::verify::{verify, PythonRuntimeProbe};

use super::dispatcher::{Command, CommandResult};

/// The verify command implementation.
pub struct VerifyCommand {
    settings: Settings,
    args: VerifyArgs,
    runner: Box<dyn CommandRunner>,
}

impl VerifyCommand {
    /// Create a new verify command.
    pub fn new(settings: Settings, args: VerifyArgs) -> Self {
        Self::with_runner(settings, args, Box::new(SystemRunner::new()))
    }

    /// Create a verify command with a custom command runner.
    pub fn with_runner(
        settings: Settings,
        args: VerifyArgs,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            settings,
            args,
            runner,
        }
    }

    /// Whether acceleration is expected, inferring from detection if unset.
    fn expect_acceleration(&self) -> bool {
        match self.args.expect {
            Some(Expectation::Accelerated) => true,
            Some(Expectation::Cpu) => false,
            None => {
                let detection = SetupRunner::new(self.runner.as_ref(), &self.settings).detect();
                detection.resolution.preferred.is_accelerated()
            }
        }
    }
}

impl Command for VerifyCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let expect_acceleration = self.expect_acceleration();
        let probe = PythonRuntimeProbe::new(self.runner.as_ref(), &self.settings.python);
        let verification = verify(&probe, expect_acceleration);

        if self.args.json {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &verification)
                .map_err(std::io::Error::other)?;
            writeln!(stdout)?;
        } else {
            ui.show_header("torchup verify");
            ui.message(&format!(
                "Expecting a {} runtime",
                if expect_acceleration { "CUDA" } else { "CPU-only" }
            ));
            show_verification(&verification, ui);
        }

        Ok(if verification.ok {
            CommandResult::success()
        } else {
            CommandResult::failure(1)
        })
    }
}

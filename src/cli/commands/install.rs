//! Install command implementation.
//!
//! The `torchup install` command detects the host, installs the best variant
//! that works and checks the result.

use crate::cli::args::InstallArgs;
use crate::config::Settings;
use crate::error::{Result, TorchupError};
use crate::runner::{RunOptions, SetupRunner};
use crate::shell::{CommandRunner, SystemRunner};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The install command implementation.
pub struct InstallCommand {
    settings: Settings,
    args: InstallArgs,
    runner: Box<dyn CommandRunner>,
}

impl InstallCommand {
    /// Create a new install command running real subprocesses.
    pub fn new(settings: Settings, args: InstallArgs) -> Self {
        Self::with_runner(settings, args, Box::new(SystemRunner::new()))
    }

    /// Create an install command with a custom command runner.
    pub fn with_runner(
        settings: Settings,
        args: InstallArgs,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            settings,
            args,
            runner,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &InstallArgs {
        &self.args
    }

    fn options(&self) -> RunOptions {
        RunOptions {
            reinstall: self.args.reinstall,
            dry_run: self.args.dry_run,
            verify: !self.args.no_verify,
        }
    }
}

impl Command for InstallCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        ui.show_header("torchup install");

        let outcome = SetupRunner::new(self.runner.as_ref(), &self.settings)
            .run(&self.options(), ui)?;

        tracing::info!(
            "Setup finished in {:.1}s with exit code {}",
            outcome.duration.as_secs_f64(),
            outcome.exit_code()
        );

        if let Some(install) = outcome.install.filter(|r| !r.success) {
            return Err(TorchupError::AllVariantsFailed {
                last: install.variant.to_string(),
            });
        }
        Ok(CommandResult::success())
    }
}

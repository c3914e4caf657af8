//! Detect command implementation.
//!
//! The `torchup detect` command reports the driver capability and the install
//! order it implies, without touching the Python environment.

use std::io::Write;

use crate::cli::args::DetectArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::runner::{show_detection, SetupRunner};
use crate::shell::{CommandRunner, SystemRunner};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The detect command implementation.
pub struct DetectCommand {
    settings: Settings,
    args: DetectArgs,
    runner: Box<dyn CommandRunner>,
}

impl DetectCommand {
    /// Create a new detect command.
    pub fn new(settings: Settings, args: DetectArgs) -> Self {
        Self::with_runner(settings, args, Box::new(SystemRunner::new()))
    }

    /// Create a detect command with a custom command runner.
    pub fn with_runner(
        settings: Settings,
        args: DetectArgs,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            settings,
            args,
            runner,
        }
    }
}

impl Command for DetectCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let detection = SetupRunner::new(self.runner.as_ref(), &self.settings).detect();

        if self.args.json {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &detection)
                .map_err(std::io::Error::other)?;
            writeln!(stdout)?;
            return Ok(CommandResult::success());
        }

        ui.show_header("torchup detect");
        show_detection(&detection, ui);
        ui.message(&format!(
            "First choice: {}",
            detection
                .resolution
                .preferred
                .index_url(&self.settings.index_url_base)
        ));
        Ok(CommandResult::success())
    }
}

//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, InstallArgs};
use crate::config::{load_config, Settings};
use crate::error::Result;
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// Returns a [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Load the config file and layer the command-line flags over it.
    pub fn settings(&self, cli: &Cli, install: Option<&InstallArgs>) -> Result<Settings> {
        let config = load_config(&self.project_root, cli.config.as_deref())?;
        Settings::resolve(&config, &cli.overrides(install), &self.project_root)
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it. No subcommand means `install` with default flags.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Install(args)) => {
                let settings = self.settings(cli, Some(args))?;
                super::install::InstallCommand::new(settings, args.clone()).execute(ui)
            }
            Some(Commands::Detect(args)) => {
                let settings = self.settings(cli, None)?;
                super::detect::DetectCommand::new(settings, args.clone()).execute(ui)
            }
            Some(Commands::Verify(args)) => {
                let settings = self.settings(cli, None)?;
                super::verify::VerifyCommand::new(settings, args.clone()).execute(ui)
            }
            None => {
                let args = InstallArgs::default();
                let settings = self.settings(cli, Some(&args))?;
                super::install::InstallCommand::new(settings, args).execute(ui)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TorchupError;
    use crate::ui::MockUI;
    use crate::variant::VariantTag;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn command_result_constructors() {
        assert!(CommandResult::success().success);
        let failed = CommandResult::failure(1);
        assert!(!failed.success);
        assert_eq!(failed.exit_code, 1);
    }

    #[test]
    fn settings_layer_flags_over_config_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("torchup.yml"),
            "variant: cu118\nindex_url_base: https://mirror.example/whl\n",
        )
        .unwrap();
        let cli = Cli::try_parse_from(["torchup", "install", "--variant", "cpu"]).unwrap();
        let Some(Commands::Install(args)) = &cli.command else {
            panic!("expected install");
        };

        let dispatcher = CommandDispatcher::new(temp.path().to_path_buf());
        let settings = dispatcher.settings(&cli, Some(args)).unwrap();

        assert_eq!(settings.variant, Some(VariantTag::Cpu));
        assert_eq!(settings.index_url_base, "https://mirror.example/whl");
    }

    #[test]
    fn invalid_config_fails_dispatch() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("torchup.yml"), "index_url_base: ftp://x\n").unwrap();
        let cli = Cli::try_parse_from(["torchup", "detect"]).unwrap();
        let mut ui = MockUI::new();

        let err = CommandDispatcher::new(temp.path().to_path_buf())
            .dispatch(&cli, &mut ui)
            .unwrap_err();

        assert!(matches!(err, TorchupError::ConfigValidationError { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_explicit_config_fails_dispatch() {
        let temp = TempDir::new().unwrap();
        let cli = Cli::try_parse_from(["torchup", "--config", "/nonexistent/torchup.yml", "detect"])
            .unwrap();
        let mut ui = MockUI::new();

        let err = CommandDispatcher::new(temp.path().to_path_buf())
            .dispatch(&cli, &mut ui)
            .unwrap_err();
        assert!(matches!(err, TorchupError::ConfigNotFound { .. }));
    }
}

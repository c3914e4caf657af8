//! Command-line interface for torchup.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, DetectArgs, Expectation, InstallArgs, VerifyArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};

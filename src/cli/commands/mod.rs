//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which loads the config
//! file, layers the global flags over it and routes the subcommand.

pub mod detect;
pub mod dispatcher;
pub mod install;
pub mod verify;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};

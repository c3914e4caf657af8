//! Subprocess execution and PATH lookup.

pub mod command;
pub mod mock;
pub mod path;
pub mod platform;

pub use command::{CommandResult, CommandRunner, Invocation, SystemRunner};
pub use mock::MockRunner;
pub use path::{is_executable, parse_system_path, resolve_tool_path};
pub use platform::is_ci;

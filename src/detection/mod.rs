//! Host detection: accelerator capability and target interpreter.

pub mod capability;
pub mod interpreter;

pub use capability::{
    locate_tool, parse_capability, CapabilityDetector, CapabilityVersion, DIAGNOSTIC_TOOL,
};
pub use interpreter::{Interpreter, PythonVersion};

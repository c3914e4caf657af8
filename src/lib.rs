//! torchup - install the fastest PyTorch build a machine can actually run.
//!
//! torchup reads the NVIDIA driver's supported CUDA level, picks the best
//! matching wheel variant, and walks a fallback chain down to the CPU build
//! until one installs. Afterwards it loads the runtime in a fresh
//! interpreter to confirm acceleration works.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, validation, and resolution
//! - [`detection`] - Driver capability and interpreter detection
//! - [`error`] - Error types and result aliases
//! - [`install`] - pip invocations, version pins, and the fallback walk
//! - [`runner`] - End-to-end setup orchestration
//! - [`shell`] - Subprocess execution
//! - [`ui`] - Spinners and terminal output
//! - [`variant`] - Wheel variants and fallback chains
//! - [`verify`] - Post-install runtime verification
//!
//! # Example
//!
//! ```
//! use torchup::detection::CapabilityVersion;
//! use torchup::variant::{resolve, VariantTag};
//!
//! let resolution = resolve(Some(CapabilityVersion::new(12, 2)), None);
//! assert_eq!(resolution.preferred, VariantTag::Cu121);
//! assert_eq!(resolution.chain.to_string(), "cu121 → cu118 → cpu");
//! ```

pub mod cli;
pub mod config;
pub mod detection;
pub mod error;
pub mod install;
pub mod runner;
pub mod shell;
pub mod ui;
pub mod variant;
pub mod verify;

pub use error::{Result, TorchupError};

//! Package installation with ordered fallback.
//!
//! # Modules
//!
//! - [`pins`] - Exact version pins and their defaults
//! - [`installer`] - pip invocations for a single variant
//! - [`fallback`] - Sequential walk over a fallback chain

pub mod fallback;
pub mod installer;
pub mod pins;

pub use fallback::{install_with_fallback, AttemptEvent, FallbackResult};
pub use installer::{InstallOutcome, PackageInstaller, StepOutcome, DEFAULT_INDEX_URL_BASE};
pub use pins::{PinnedVersions, PACKAGES};

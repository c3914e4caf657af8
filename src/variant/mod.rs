//! Wheel variants and capability-to-variant resolution.
//!
//! A [`VariantTag`] names one build/index combination. Resolution maps a
//! detected [`CapabilityVersion`] (or an operator override) to a preferred
//! variant and expands it into a [`FallbackChain`] that always ends in the
//! CPU baseline.
//!
//! # Example
//!
//! ```
//! use torchup::detection::CapabilityVersion;
//! use torchup::variant::{resolve, VariantTag};
//!
//! let resolution = resolve(Some(CapabilityVersion::new(12, 2)), None);
//! assert_eq!(resolution.preferred, VariantTag::Cu121);
//! assert_eq!(
//!     resolution.chain.as_slice(),
//!     &[VariantTag::Cu121, VariantTag::Cu118, VariantTag::Cpu]
//! );
//! ```

pub mod chain;

pub use chain::{FallbackChain, FALLBACK_TABLE};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::detection::CapabilityVersion;

/// A distinct package build and index combination.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum VariantTag {
    /// Highest accelerated tier (CUDA 12.1 wheels).
    #[value(name = "cu121")]
    Cu121,
    /// Mid accelerated tier (CUDA 11.8 wheels).
    #[value(name = "cu118")]
    Cu118,
    /// CPU-only baseline.
    #[value(name = "cpu")]
    Cpu,
}

impl VariantTag {
    /// All variants, highest tier first.
    pub const ALL: [VariantTag; 3] = [VariantTag::Cu121, VariantTag::Cu118, VariantTag::Cpu];

    /// The tag used in index URLs and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cu121 => "cu121",
            Self::Cu118 => "cu118",
            Self::Cpu => "cpu",
        }
    }

    /// Position in [`ALL`](Self::ALL); lower ranks need more capability.
    pub fn rank(&self) -> usize {
        match self {
            Self::Cu121 => 0,
            Self::Cu118 => 1,
            Self::Cpu => 2,
        }
    }

    /// Whether this is the CPU-only baseline.
    pub fn is_baseline(&self) -> bool {
        matches!(self, Self::Cpu)
    }

    /// Whether a successful install of this variant should accelerate.
    pub fn is_accelerated(&self) -> bool {
        !self.is_baseline()
    }

    /// Package index for this variant under `base`.
    ///
    /// The baseline routes to the CPU-only index; every other variant routes
    /// to an index named after its tag.
    pub fn index_url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        if self.is_baseline() {
            format!("{}/cpu", base)
        } else {
            format!("{}/{}", base, self.as_str())
        }
    }

    /// Preferred variant for a detected capability.
    ///
    /// Major version 12 or newer selects the highest accelerated tier, 11
    /// selects the mid tier, anything else (or no accelerator) the baseline.
    pub fn for_capability(capability: Option<CapabilityVersion>) -> Self {
        match capability {
            Some(v) if v.major >= 12 => Self::Cu121,
            Some(v) if v.major == 11 => Self::Cu118,
            _ => Self::Cpu,
        }
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cu121" => Ok(Self::Cu121),
            "cu118" => Ok(Self::Cu118),
            "cpu" => Ok(Self::Cpu),
            other => Err(format!(
                "unknown variant '{}' (expected one of: cu121, cu118, cpu)",
                other
            )),
        }
    }
}

/// Outcome of variant resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Variant that will be attempted first.
    pub preferred: VariantTag,
    /// Variant implied by detection alone.
    pub detected: VariantTag,
    /// Ordered candidates, ending in the baseline.
    pub chain: FallbackChain,
    /// Whether an operator override fixed the preferred variant.
    pub overridden: bool,
}

/// Resolve the preferred variant and its fallback chain.
///
/// An override bypasses detection entirely.
pub fn resolve(
    capability: Option<CapabilityVersion>,
    override_tag: Option<VariantTag>,
) -> Resolution {
    let detected = VariantTag::for_capability(capability);
    let preferred = override_tag.unwrap_or(detected);
    let chain = FallbackChain::for_variant(preferred);

    tracing::debug!(
        "Resolved variant {} (detected {}, override {:?}); chain {}",
        preferred,
        detected,
        override_tag,
        chain
    );

    Resolution {
        preferred,
        detected,
        chain,
        overridden: override_tag.is_some(),
    }
}

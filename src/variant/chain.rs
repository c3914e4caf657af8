//! Fixed fallback chains.

use std::fmt;

use serde::Serialize;

use super::VariantTag;

/// Fallback sequence for each preferred variant.
///
/// Each chain descends through the tiers at or below the preferred one and
/// ends in the baseline.
pub const FALLBACK_TABLE: &[(VariantTag, &[VariantTag])] = &[
    (
        VariantTag::Cu121,
        &[VariantTag::Cu121, VariantTag::Cu118, VariantTag::Cpu],
    ),
    (VariantTag::Cu118, &[VariantTag::Cu118, VariantTag::Cpu]),
    (VariantTag::Cpu, &[VariantTag::Cpu]),
];

/// Ordered variants to attempt, ending in the baseline.
///
/// Invariant: non-empty, strictly descending in tier, last element is the
/// baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackChain(Vec<VariantTag>);

impl FallbackChain {
    /// Build a chain from an arbitrary sequence, checking the invariant.
    pub fn new(variants: Vec<VariantTag>) -> Result<Self, String> {
        match variants.last() {
            None => return Err("fallback chain is empty".to_string()),
            Some(last) if !last.is_baseline() => {
                return Err(format!("fallback chain must end in cpu, not {}", last))
            }
            Some(_) => {}
        }

        for pair in variants.windows(2) {
            let (higher, lower) = (pair[0], pair[1]);
            if higher == lower {
                return Err(format!("fallback chain repeats {}", higher));
            }
            if higher.rank() > lower.rank() {
                return Err(format!(
                    "fallback chain must descend in tier, but {} comes before {}",
                    higher, lower
                ));
            }
        }

        Ok(Self(variants))
    }

    /// The fixed chain for a preferred variant.
    pub fn for_variant(preferred: VariantTag) -> Self {
        let variants = FALLBACK_TABLE
            .iter()
            .find(|(tag, _)| *tag == preferred)
            .map(|(_, chain)| chain.to_vec())
            .unwrap_or_else(|| vec![VariantTag::Cpu]);
        Self(variants)
    }

    /// The chain containing only the baseline.
    pub fn baseline() -> Self {
        Self(vec![VariantTag::Cpu])
    }

    pub fn as_slice(&self) -> &[VariantTag] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariantTag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First (preferred) variant.
    pub fn first(&self) -> VariantTag {
        self.0[0]
    }

    /// Last variant, always the baseline.
    pub fn last(&self) -> VariantTag {
        self.0[self.0.len() - 1]
    }
}

impl<'a> IntoIterator for &'a FallbackChain {
    type Item = &'a VariantTag;
    type IntoIter = std::slice::Iter<'a, VariantTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for FallbackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.0.iter().map(|t| t.as_str()).collect();
        write!(f, "{}", tags.join(" → "))
    }
}

//! Ordered installation across a fallback chain.
//!
//! Candidates are attempted strictly one at a time, in chain order, and the
//! walk stops at the first success. Only a failure of the final (baseline)
//! candidate produces an overall failure.

use crate::variant::{FallbackChain, VariantTag};

use super::installer::{InstallOutcome, PackageInstaller};
use super::pins::PinnedVersions;

/// Progress events emitted while walking the chain.
#[derive(Debug)]
pub enum AttemptEvent<'a> {
    /// An attempt is about to start.
    Starting {
        variant: VariantTag,
        index: usize,
        total: usize,
    },
    /// An attempt finished.
    Finished {
        outcome: &'a InstallOutcome,
        index: usize,
        total: usize,
    },
}

/// Result of walking the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackResult {
    /// Whether any candidate installed.
    pub success: bool,
    /// The succeeding variant, or the last one attempted on failure.
    pub variant: VariantTag,
    /// Number of installer invocations made.
    pub attempts: usize,
}

impl FallbackResult {
    /// Process exit status for this result.
    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }

    /// Whether the installed variant is expected to accelerate.
    pub fn expects_acceleration(&self) -> bool {
        self.success && self.variant.is_accelerated()
    }
}

/// Install the first variant in `chain` that succeeds.
pub fn install_with_fallback<F>(
    chain: &FallbackChain,
    pins: &PinnedVersions,
    installer: &PackageInstaller<'_>,
    mut on_event: F,
) -> FallbackResult
where
    F: FnMut(AttemptEvent<'_>),
{
    let total = chain.len();
    let mut last = chain.first();
    let mut attempts = 0;

    for (index, &variant) in chain.iter().enumerate() {
        last = variant;
        on_event(AttemptEvent::Starting {
            variant,
            index,
            total,
        });

        let outcome = installer.install(variant, pins);
        attempts += 1;
        on_event(AttemptEvent::Finished {
            outcome: &outcome,
            index,
            total,
        });

        if outcome.succeeded() {
            return FallbackResult {
                success: true,
                variant,
                attempts,
            };
        }

        if index + 1 < total {
            tracing::info!("Install failed for {}; trying next fallback", variant);
        }
    }

    tracing::error!("Installation failed for every variant in {}", chain);
    FallbackResult {
        success: false,
        variant: last,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::MockRunner;

    fn index_of(line: &str) -> &str {
        line.rsplit('/').next().unwrap_or_default()
    }

    #[test]
    fn first_success_short_circuits() {
        let runner = MockRunner::new();
        runner.succeed_when("pip install", "");
        let installer = PackageInstaller::new(&runner, "python");
        let chain = FallbackChain::for_variant(VariantTag::Cu121);

        let result = install_with_fallback(&chain, &PinnedVersions::default(), &installer, |_| {});

        assert!(result.success);
        assert_eq!(result.variant, VariantTag::Cu121);
        assert_eq!(result.attempts, 1);
        assert_eq!(runner.invocations().len(), 1);
    }

    #[test]
    fn degrades_to_baseline_in_order() {
        let runner = MockRunner::new();
        runner.fail_when("whl/cu121", 1, "no cu121 wheels");
        runner.fail_when("whl/cu118", 1, "no cu118 wheels");
        runner.succeed_when("whl/cpu", "");
        let installer = PackageInstaller::new(&runner, "python");
        let chain = FallbackChain::for_variant(VariantTag::Cu121);

        let result = install_with_fallback(&chain, &PinnedVersions::default(), &installer, |_| {});

        assert!(result.success);
        assert_eq!(result.variant, VariantTag::Cpu);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.exit_code(), 0);
        assert!(!result.expects_acceleration());

        let order: Vec<String> = runner
            .calls_matching("pip install")
            .iter()
            .map(|line| index_of(line).to_string())
            .collect();
        assert_eq!(order, vec!["cu121", "cu118", "cpu"]);
    }

    #[test]
    fn baseline_failure_is_overall_failure() {
        let runner = MockRunner::new();
        runner.fail_when("pip install", 1, "network unreachable");
        let installer = PackageInstaller::new(&runner, "python");
        let chain = FallbackChain::for_variant(VariantTag::Cu118);

        let result = install_with_fallback(&chain, &PinnedVersions::default(), &installer, |_| {});

        assert!(!result.success);
        assert_eq!(result.variant, VariantTag::Cpu);
        assert_eq!(result.attempts, 2);
        assert_ne!(result.exit_code(), 0);
    }

    #[test]
    fn mid_tier_success_after_highest_fails() {
        let runner = MockRunner::new();
        runner.fail_when("whl/cu121", 1, "no wheels");
        runner.succeed_when("whl/cu118", "");
        let installer = PackageInstaller::new(&runner, "python");
        let chain = FallbackChain::for_variant(VariantTag::Cu121);

        let result = install_with_fallback(&chain, &PinnedVersions::default(), &installer, |_| {});

        assert!(result.success);
        assert_eq!(result.variant, VariantTag::Cu118);
        assert!(result.expects_acceleration());
    }

    #[test]
    fn events_bracket_each_attempt() {
        let runner = MockRunner::new();
        runner.fail_when("whl/cu118", 1, "");
        runner.succeed_when("whl/cpu", "");
        let installer = PackageInstaller::new(&runner, "python");
        let chain = FallbackChain::for_variant(VariantTag::Cu118);

        let mut events = Vec::new();
        install_with_fallback(&chain, &PinnedVersions::default(), &installer, |event| {
            events.push(match event {
                AttemptEvent::Starting { variant, index, total } => {
                    format!("start {} {}/{}", variant, index + 1, total)
                }
                AttemptEvent::Finished { outcome, .. } => {
                    format!("finish {} {}", outcome.variant, outcome.succeeded())
                }
            });
        });

        assert_eq!(
            events,
            vec![
                "start cu118 1/2",
                "finish cu118 false",
                "start cpu 2/2",
                "finish cpu true"
            ]
        );
    }
}

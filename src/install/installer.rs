//! pip invocations for one variant.
//!
//! The installer never fails: whatever pip does, the caller receives the exit
//! status and captured output as data and decides what to do next.

use std::path::{Path, PathBuf};

use crate::shell::{CommandResult, CommandRunner, Invocation};
use crate::variant::VariantTag;

use super::pins::{PinnedVersions, PACKAGES};

/// Default base URL under which per-variant indexes live.
pub const DEFAULT_INDEX_URL_BASE: &str = "https://download.pytorch.org/whl";

/// Result of one installation attempt.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Variant that was attempted.
    pub variant: VariantTag,
    /// The exact pip invocation.
    pub invocation: Invocation,
    /// Exit code (None if pip could not be started or was killed).
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error (or the spawn error).
    pub stderr: String,
}

impl InstallOutcome {
    /// Whether pip exited with status zero.
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn from_result(variant: VariantTag, invocation: Invocation, result: CommandResult) -> Self {
        Self {
            variant,
            invocation,
            exit_code: result.exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
        }
    }

    /// Combined output for error display.
    pub fn output(&self) -> String {
        [self.stdout.trim(), self.stderr.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Result of a maintenance step (uninstall, pip bootstrap).
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub invocation: Invocation,
    pub success: bool,
    pub output: String,
}

/// Runs pip inside the target interpreter.
pub struct PackageInstaller<'a> {
    runner: &'a dyn CommandRunner,
    python: PathBuf,
    index_url_base: String,
    upgrade: bool,
}

impl<'a> PackageInstaller<'a> {
    /// Create an installer for `python` using the default index base.
    pub fn new(runner: &'a dyn CommandRunner, python: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            python: python.into(),
            index_url_base: DEFAULT_INDEX_URL_BASE.to_string(),
            upgrade: true,
        }
    }

    /// Use a different index base URL.
    pub fn with_index_url_base(mut self, base: impl Into<String>) -> Self {
        self.index_url_base = base.into();
        self
    }

    /// Toggle `--upgrade` on install.
    pub fn with_upgrade(mut self, upgrade: bool) -> Self {
        self.upgrade = upgrade;
        self
    }

    /// Target interpreter.
    pub fn python(&self) -> &Path {
        &self.python
    }

    pub fn index_url_base(&self) -> &str {
        &self.index_url_base
    }

    /// The pip invocation that [`install`](Self::install) would run.
    pub fn install_invocation(&self, variant: VariantTag, pins: &PinnedVersions) -> Invocation {
        let mut invocation = Invocation::new(&self.python).args(["-m", "pip", "install"]);
        if self.upgrade {
            invocation = invocation.arg("--upgrade");
        }
        invocation
            .args(pins.requirements())
            .arg("--index-url")
            .arg(variant.index_url(&self.index_url_base))
    }

    /// Rendered command line for `variant`, as shown in dry runs.
    pub fn command_line(&self, variant: VariantTag, pins: &PinnedVersions) -> String {
        self.install_invocation(variant, pins).to_string()
    }

    /// Install all packages for `variant`.
    pub fn install(&self, variant: VariantTag, pins: &PinnedVersions) -> InstallOutcome {
        let invocation = self.install_invocation(variant, pins);
        tracing::info!("Installing {} wheels: {}", variant, invocation);

        let result = self.run_captured(&invocation);
        let outcome = InstallOutcome::from_result(variant, invocation, result);

        if outcome.succeeded() {
            tracing::info!("Install of {} wheels succeeded", variant);
        } else {
            tracing::warn!(
                "Install of {} wheels failed with exit code {:?}",
                variant,
                outcome.exit_code
            );
        }
        outcome
    }

    /// `pip uninstall -y` for every package.
    pub fn uninstall_invocation(&self) -> Invocation {
        Invocation::new(&self.python)
            .args(["-m", "pip", "uninstall", "-y"])
            .args(PACKAGES)
    }

    /// `ensurepip --upgrade`, the first bootstrap step.
    pub fn ensurepip_invocation(&self) -> Invocation {
        Invocation::new(&self.python).args(["-m", "ensurepip", "--upgrade"])
    }

    /// The pip self-upgrade run after `ensurepip`.
    pub fn bootstrap_invocation(&self) -> Invocation {
        Invocation::new(&self.python).args([
            "-m",
            "pip",
            "install",
            "-U",
            "pip",
            "setuptools",
            "wheel",
        ])
    }

    /// Remove any installed copies of the packages.
    ///
    /// Packages that are not installed are not an error.
    pub fn uninstall(&self) -> StepOutcome {
        let invocation = self.uninstall_invocation();
        let result = self.run_captured(&invocation);
        let output = result.combined_output();
        let success = result.success || output.to_lowercase().contains("not installed");
        if !success {
            tracing::warn!("Uninstall failed: {}", output);
        }
        StepOutcome {
            invocation,
            success,
            output,
        }
    }

    /// Make sure pip, setuptools and wheel are present and current.
    ///
    /// Runs `ensurepip` then upgrades pip; success is reported from the
    /// upgrade step since `ensurepip` is often disabled in distro pythons.
    pub fn bootstrap_pip(&self) -> StepOutcome {
        let ensured = self.run_captured(&self.ensurepip_invocation());
        if !ensured.success {
            tracing::debug!("ensurepip failed: {}", ensured.stderr.trim());
        }

        let invocation = self.bootstrap_invocation();
        let result = self.run_captured(&invocation);
        if !result.success {
            tracing::warn!("pip bootstrap failed: {}", result.stderr.trim());
        }
        StepOutcome {
            invocation,
            success: result.success,
            output: result.combined_output(),
        }
    }

    fn run_captured(&self, invocation: &Invocation) -> CommandResult {
        match self.runner.run(invocation) {
            Ok(result) => result,
            Err(e) => CommandResult::failure(
                None,
                String::new(),
                e.to_string(),
                std::time::Duration::ZERO,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::MockRunner;

    fn pinned() -> PinnedVersions {
        PinnedVersions::legacy_defaults()
    }

    #[test]
    fn install_invocation_with_pins() {
        let runner = MockRunner::new();
        let installer = PackageInstaller::new(&runner, "python");
        let inv = installer.install_invocation(VariantTag::Cu118, &pinned());
        assert_eq!(
            inv.to_string(),
            "python -m pip install --upgrade torch==2.0.0 torchvision==0.15.1 torchaudio==2.0.1 \
             --index-url https://download.pytorch.org/whl/cu118"
        );
    }

    #[test]
    fn install_invocation_unpinned_without_upgrade() {
        let runner = MockRunner::new();
        let installer = PackageInstaller::new(&runner, "python").with_upgrade(false);
        let inv = installer.install_invocation(VariantTag::Cpu, &PinnedVersions::default());
        assert_eq!(
            inv.to_string(),
            "python -m pip install torch torchvision torchaudio \
             --index-url https://download.pytorch.org/whl/cpu"
        );
    }

    #[test]
    fn install_uses_custom_index_base() {
        let runner = MockRunner::new();
        let installer = PackageInstaller::new(&runner, "python")
            .with_index_url_base("https://mirror.internal/whl");
        let inv = installer.install_invocation(VariantTag::Cu121, &PinnedVersions::default());
        assert_eq!(
            inv.args.last().map(String::as_str),
            Some("https://mirror.internal/whl/cu121")
        );
    }

    #[test]
    fn install_reports_success() {
        let runner = MockRunner::new();
        runner.succeed_when("pip install", "Successfully installed torch");
        let installer = PackageInstaller::new(&runner, "python");

        let outcome = installer.install(VariantTag::Cpu, &PinnedVersions::default());
        assert!(outcome.succeeded());
        assert_eq!(outcome.variant, VariantTag::Cpu);
        assert!(outcome.stdout.contains("Successfully installed"));
    }

    #[test]
    fn install_reports_failure_as_data() {
        let runner = MockRunner::new();
        runner.fail_when(
            "whl/cu121",
            1,
            "ERROR: No matching distribution found for torch==2.0.0",
        );
        let installer = PackageInstaller::new(&runner, "python");

        let outcome = installer.install(VariantTag::Cu121, &pinned());
        assert!(!outcome.succeeded());
        assert_eq!(outcome.exit_code, Some(1));
        assert!(outcome.output().contains("No matching distribution"));
    }

    #[test]
    fn install_spawn_failure_is_data() {
        let runner = MockRunner::new();
        runner.spawn_error_when("python");
        let installer = PackageInstaller::new(&runner, "python");

        let outcome = installer.install(VariantTag::Cpu, &PinnedVersions::default());
        assert!(!outcome.succeeded());
        assert_eq!(outcome.exit_code, None);
        assert!(!outcome.stderr.is_empty());
    }

    #[test]
    fn uninstall_tolerates_not_installed() {
        let runner = MockRunner::new();
        runner.fail_when("uninstall", 1, "WARNING: Skipping torch as it is not installed.");
        let installer = PackageInstaller::new(&runner, "python");

        let outcome = installer.uninstall();
        assert!(outcome.success);
        assert_eq!(
            outcome.invocation.to_string(),
            "python -m pip uninstall -y torch torchvision torchaudio"
        );
    }

    #[test]
    fn bootstrap_runs_ensurepip_then_upgrade() {
        let runner = MockRunner::new();
        runner.fail_when("ensurepip", 1, "ensurepip is disabled");
        runner.succeed_when("install -U pip", "");
        let installer = PackageInstaller::new(&runner, "python");

        let outcome = installer.bootstrap_pip();
        assert!(outcome.success);
        let calls: Vec<String> = runner.invocations().iter().map(|i| i.to_string()).collect();
        assert_eq!(
            calls,
            vec![
                "python -m ensurepip --upgrade",
                "python -m pip install -U pip setuptools wheel"
            ]
        );
    }
}

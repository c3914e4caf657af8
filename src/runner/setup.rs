//! End-to-end setup: detect, resolve, install with fallback, verify.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::Settings;
use crate::detection::{CapabilityDetector, CapabilityVersion, Interpreter};
use crate::error::Result;
use crate::install::{
    install_with_fallback, AttemptEvent, FallbackResult, PackageInstaller, PinnedVersions,
};
use crate::shell::CommandRunner;
use crate::ui::{SpinnerHandle, UserInterface};
use crate::variant::{resolve, Resolution};
use crate::verify::{verify, PythonRuntimeProbe, Verification, ACCELERATION_HINTS};

/// Lines of pip output kept in a failure block.
const ERROR_OUTPUT_LINES: usize = 20;

/// Options for one setup run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Uninstall existing packages first.
    pub reinstall: bool,
    /// Print the plan without touching the environment.
    pub dry_run: bool,
    /// Probe the runtime after a successful install.
    pub verify: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            reinstall: false,
            dry_run: false,
            verify: true,
        }
    }
}

/// What detection found, before anything is installed.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    /// Diagnostic tool used, if one was found.
    pub tool: Option<PathBuf>,
    /// Capability version it reported.
    pub capability: Option<CapabilityVersion>,
    /// Resolved variant and chain.
    pub resolution: Resolution,
}

/// Result of a setup run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Target interpreter; `None` only for a dry run that could not run it.
    pub interpreter: Option<Interpreter>,
    /// Pins after interpreter defaults were applied.
    pub pins: PinnedVersions,
    pub detection: Detection,
    /// Command lines a dry run would have executed.
    pub planned: Vec<String>,
    /// Fallback walk result; `None` for dry runs.
    pub install: Option<FallbackResult>,
    /// Verification result, when it ran.
    pub verification: Option<Verification>,
    pub duration: Duration,
}

impl RunOutcome {
    /// Process exit status: 0 unless every candidate failed.
    pub fn exit_code(&self) -> i32 {
        self.install.map(|r| r.exit_code()).unwrap_or(0)
    }

    pub fn is_dry_run(&self) -> bool {
        self.install.is_none()
    }
}

/// Orchestrates a full install for one interpreter.
pub struct SetupRunner<'a> {
    runner: &'a dyn CommandRunner,
    settings: &'a Settings,
    detector: CapabilityDetector<'a>,
}

impl<'a> SetupRunner<'a> {
    /// Create a runner that locates the diagnostic tool from the environment.
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a Settings) -> Self {
        let detector = CapabilityDetector::new(runner, settings.diagnostic_tool.as_deref());
        Self {
            runner,
            settings,
            detector,
        }
    }

    /// Replace the capability detector.
    pub fn with_detector(mut self, detector: CapabilityDetector<'a>) -> Self {
        self.detector = detector;
        self
    }

    fn installer(&self) -> PackageInstaller<'a> {
        PackageInstaller::new(self.runner, &self.settings.python)
            .with_index_url_base(&self.settings.index_url_base)
            .with_upgrade(self.settings.upgrade)
    }

    /// Detect the host capability and resolve the install chain.
    pub fn detect(&self) -> Detection {
        let capability = self.detector.detect();
        let resolution = resolve(capability, self.settings.variant);
        Detection {
            tool: self.detector.tool().map(|p| p.to_path_buf()),
            capability,
            resolution,
        }
    }

    /// Run the setup, reporting progress to `ui`.
    ///
    /// # Errors
    ///
    /// Returns `InterpreterNotFound` when the target interpreter cannot be
    /// run, except on a dry run, which plans with the configured pins
    /// instead. Install failures are reported through
    /// [`RunOutcome::exit_code`].
    pub fn run(&self, options: &RunOptions, ui: &mut dyn UserInterface) -> Result<RunOutcome> {
        let start = Instant::now();

        let interpreter = match Interpreter::detect(self.runner, &self.settings.python) {
            Ok(interpreter) => Some(interpreter),
            Err(e) if options.dry_run => {
                ui.warning(&format!("{}; planning with configured pins only", e));
                None
            }
            Err(e) => return Err(e),
        };

        let pins = match &interpreter {
            Some(interpreter) => self.interpreter_pins(interpreter, ui),
            None => self.settings.pins.clone(),
        };

        let detection = self.detect();
        show_detection(&detection, ui);

        let installer = self.installer();

        if options.dry_run {
            let planned = self.plan(&detection, &pins, &installer, options);
            ui.message("Dry run, would run:");
            for line in &planned {
                ui.message(&format!("  {}", line));
            }
            return Ok(RunOutcome {
                interpreter,
                pins,
                detection,
                planned,
                install: None,
                verification: None,
                duration: start.elapsed(),
            });
        }

        if self.settings.bootstrap_pip {
            let mut spinner = ui.start_spinner("Bootstrapping pip");
            let step = installer.bootstrap_pip();
            if step.success {
                spinner.finish_success("pip is up to date");
            } else {
                spinner.finish_skipped("pip bootstrap failed, continuing");
                tracing::debug!("pip bootstrap output: {}", step.output);
            }
        }

        if options.reinstall {
            let mut spinner = ui.start_spinner("Removing installed packages");
            let step = installer.uninstall();
            if step.success {
                spinner.finish_success("Removed installed packages");
            } else {
                spinner.finish_error("Uninstall failed, installing over existing packages");
                ui.show_error_block(
                    &step.invocation.to_string(),
                    &tail_lines(&step.output, ERROR_OUTPUT_LINES),
                    None,
                );
            }
        }

        let result = self.install(&detection.resolution, &pins, &installer, ui);

        let verification = if options.verify && result.success {
            let probe = PythonRuntimeProbe::new(self.runner, &self.settings.python);
            let verification = verify(&probe, result.expects_acceleration());
            show_verification(&verification, ui);
            Some(verification)
        } else {
            None
        };

        Ok(RunOutcome {
            interpreter,
            pins,
            detection,
            planned: Vec::new(),
            install: Some(result),
            verification,
            duration: start.elapsed(),
        })
    }

    fn interpreter_pins(
        &self,
        interpreter: &Interpreter,
        ui: &mut dyn UserInterface,
    ) -> PinnedVersions {
        ui.message(&format!(
            "Python {} at {}",
            interpreter.version_string,
            interpreter.executable.display()
        ));

        let pins = self
            .settings
            .pins
            .clone()
            .with_interpreter_defaults(interpreter.version);
        if pins != self.settings.pins {
            ui.message(&format!(
                "Python {} is older than 3.9; pinning {}",
                interpreter.version,
                pins.requirements().join(" ")
            ));
        }
        pins
    }

    fn plan(
        &self,
        detection: &Detection,
        pins: &PinnedVersions,
        installer: &PackageInstaller<'_>,
        options: &RunOptions,
    ) -> Vec<String> {
        let mut planned = Vec::new();
        if self.settings.bootstrap_pip {
            planned.push(installer.ensurepip_invocation().to_string());
            planned.push(installer.bootstrap_invocation().to_string());
        }
        if options.reinstall {
            planned.push(installer.uninstall_invocation().to_string());
        }
        for (index, &variant) in detection.resolution.chain.iter().enumerate() {
            let line = installer.command_line(variant, pins);
            if index == 0 {
                planned.push(line);
            } else {
                planned.push(format!("{}  (if the above fails)", line));
            }
        }
        planned
    }

    fn install(
        &self,
        resolution: &Resolution,
        pins: &PinnedVersions,
        installer: &PackageInstaller<'_>,
        ui: &mut dyn UserInterface,
    ) -> FallbackResult {
        let chain = resolution.chain.as_slice();
        let show_output = ui.output_mode().shows_command_output();
        let mut spinner: Option<Box<dyn SpinnerHandle>> = None;

        let result = install_with_fallback(&resolution.chain, pins, installer, |event| match event {
            AttemptEvent::Starting {
                variant,
                index,
                total,
            } => {
                spinner = Some(ui.start_spinner(&format!(
                    "[{}/{}] Installing {} wheels",
                    index + 1,
                    total,
                    variant
                )));
            }
            AttemptEvent::Finished { outcome, index, .. } => {
                let mut current = spinner.take();
                if outcome.succeeded() {
                    if let Some(s) = current.as_mut() {
                        s.finish_success(&format!("Installed {} wheels", outcome.variant));
                    }
                    if show_output {
                        ui.message(&outcome.output());
                    }
                } else {
                    if let Some(s) = current.as_mut() {
                        s.finish_error(&format!(
                            "{} install failed (exit code {})",
                            outcome.variant,
                            outcome
                                .exit_code
                                .map(|c| c.to_string())
                                .unwrap_or_else(|| "none".to_string())
                        ));
                    }
                    let hint = chain
                        .get(index + 1)
                        .map(|next| format!("Falling back to {} wheels", next));
                    ui.show_error_block(
                        &outcome.invocation.to_string(),
                        &tail_lines(&outcome.output(), ERROR_OUTPUT_LINES),
                        hint.as_deref(),
                    );
                }
            }
        });

        if result.success {
            if result.variant == resolution.preferred {
                ui.success(&format!("Installed {} wheels", result.variant));
            } else {
                ui.warning(&format!(
                    "Installed {} wheels after {} failed attempt(s); {} was preferred",
                    result.variant,
                    result.attempts - 1,
                    resolution.preferred
                ));
            }
        }
        result
    }
}

/// Print what detection found.
pub fn show_detection(detection: &Detection, ui: &mut dyn UserInterface) {
    match (&detection.tool, detection.capability) {
        (Some(tool), Some(capability)) => ui.message(&format!(
            "Detected CUDA {} (via {})",
            capability,
            tool.display()
        )),
        (Some(tool), None) => ui.message(&format!(
            "No CUDA version reported by {}; assuming no GPU",
            tool.display()
        )),
        (None, _) => ui.message("nvidia-smi not found; assuming no GPU"),
    }

    let resolution = &detection.resolution;
    if resolution.overridden {
        ui.message(&format!(
            "Variant fixed to {} (detection suggested {})",
            resolution.preferred, resolution.detected
        ));
    }
    ui.message(&format!("Install order: {}", resolution.chain));
}

/// Print a verification result with troubleshooting hints.
pub fn show_verification(verification: &Verification, ui: &mut dyn UserInterface) {
    if let Some(report) = &verification.report {
        ui.message(&report.to_string());
    }
    if verification.ok {
        ui.success("Verification passed");
        return;
    }
    if let Some(problem) = verification.problem() {
        ui.warning(&format!("Verification: {}", problem));
    }
    if verification.needs_driver_hints() {
        if let Some(driver_error) = verification
            .report
            .as_ref()
            .and_then(|r| r.driver_error.as_deref())
        {
            ui.warning(driver_error);
        }
        for hint in ACCELERATION_HINTS {
            ui.show_hint(hint);
        }
    }
}

/// Keep the last `n` lines of `text`.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(n);
    lines[skip..].join("\n")
}

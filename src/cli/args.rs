//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::SettingsOverrides;
use crate::install::PinnedVersions;
use crate::variant::VariantTag;

/// torchup - install the fastest PyTorch build this machine can run.
#[derive(Debug, Parser)]
#[command(name = "torchup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Python interpreter to install into
    #[arg(long, global = true, env = "TORCHUP_PYTHON")]
    pub python: Option<PathBuf>,

    /// Base URL of the per-variant wheel indexes
    #[arg(long, global = true, env = "TORCHUP_INDEX_URL_BASE")]
    pub index_url_base: Option<String>,

    /// Path to config file (overrides torchup.yml discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Settings overrides from global flags plus `install` flags.
    pub fn overrides(&self, install: Option<&InstallArgs>) -> SettingsOverrides {
        let mut overrides = SettingsOverrides {
            python: self.python.clone(),
            index_url_base: self.index_url_base.clone(),
            ..Default::default()
        };
        if let Some(args) = install {
            overrides.variant = args.variant;
            overrides.pins = args.pins();
            overrides.skip_pip_bootstrap = args.skip_pip_bootstrap;
        }
        overrides
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect, install with fallback, and verify (default if no command specified)
    Install(InstallArgs),

    /// Show the detected capability and install order without installing
    Detect(DetectArgs),

    /// Check the installed runtime
    Verify(VerifyArgs),
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InstallArgs {
    /// Use this variant instead of detecting one
    #[arg(long, value_enum)]
    pub variant: Option<VariantTag>,

    /// Uninstall existing packages first
    #[arg(long)]
    pub reinstall: bool,

    /// Print the commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Exact torch version
    #[arg(long, value_name = "VERSION")]
    pub torch_version: Option<String>,

    /// Exact torchvision version
    #[arg(long, value_name = "VERSION")]
    pub torchvision_version: Option<String>,

    /// Exact torchaudio version
    #[arg(long, value_name = "VERSION")]
    pub torchaudio_version: Option<String>,

    /// Don't run ensurepip / upgrade pip first
    #[arg(long)]
    pub skip_pip_bootstrap: bool,

    /// Skip the post-install runtime check
    #[arg(long)]
    pub no_verify: bool,
}

impl InstallArgs {
    /// Version pins given on the command line.
    pub fn pins(&self) -> PinnedVersions {
        PinnedVersions {
            torch: self.torch_version.clone(),
            torchvision: self.torchvision_version.clone(),
            torchaudio: self.torchaudio_version.clone(),
        }
    }
}

/// Arguments for the `detect` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DetectArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Expected runtime state for `verify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Expectation {
    /// CUDA build with a usable GPU
    Accelerated,
    /// CPU-only build
    Cpu,
}

/// Arguments for the `verify` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct VerifyArgs {
    /// What the runtime should report (default: infer from detection)
    #[arg(long, value_enum)]
    pub expect: Option<Expectation>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

//! Integration tests for the torchup binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("torchup"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("fastest PyTorch build"))
        .stdout(predicate::str::contains("detect"))
        .stdout(predicate::str::contains("verify"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("torchup"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_install_help_lists_flags() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("torchup"));
    cmd.args(["install", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--variant"))
        .stdout(predicate::str::contains("--reinstall"))
        .stdout(predicate::str::contains("--torchaudio-version"))
        .stdout(predicate::str::contains("--skip-pip-bootstrap"));
    Ok(())
}

#[test]
fn cli_rejects_unknown_variant() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("torchup"));
    cmd.args(["install", "--variant", "rocm"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
    Ok(())
}

/// Tests against fake `python` and `nvidia-smi` scripts.
#[cfg(unix)]
mod fake_host {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const FAKE_PYTHON: &str = r##"#!/bin/sh
case "$*" in
  *sys.version_info*)
    echo "${FAKE_PY_VERSION:-3.10.12}"
    ;;
  *"import torch"*)
    if [ -n "$FAKE_PROBE" ]; then
      echo "$FAKE_PROBE"
    else
      echo '{"version": "2.1.0+cpu", "cuda": null, "available": false, "device": null, "path": null}'
    fi
    ;;
  *"pip install"*"--index-url"*)
    for arg in "$@"; do last="$arg"; done
    tag="${last##*/}"
    echo "$tag" >> "$FAKE_LOG"
    case " $FAKE_FAIL " in
      *" $tag "*)
        echo "ERROR: No matching distribution found for torch" >&2
        exit 1
        ;;
    esac
    echo "Successfully installed torch torchvision torchaudio"
    ;;
  *)
    exit 0
    ;;
esac
"##;

    const FAKE_SMI: &str = r#"#!/bin/sh
echo "| NVIDIA-SMI 535.54.03    Driver Version: 535.54.03    CUDA Version: 12.2 |"
"#;

    const CUDA_PROBE: &str = r#"{"version": "2.1.0+cu118", "cuda": "11.8", "available": true, "device": "NVIDIA A10G", "path": "/venv/torch/__init__.py"}"#;

    struct FakeHost {
        dir: TempDir,
        gpu: bool,
    }

    impl FakeHost {
        fn new(gpu: bool) -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("bin")).unwrap();
            fs::create_dir_all(dir.path().join("drivers")).unwrap();
            write_script(&dir.path().join("bin/python"), FAKE_PYTHON);
            write_script(&dir.path().join("drivers/nvidia-smi"), FAKE_SMI);
            if gpu {
                write_script(&dir.path().join("bin/nvidia-smi"), FAKE_SMI);
            }
            Self { dir, gpu }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn python(&self) -> PathBuf {
            self.root().join("bin/python")
        }

        fn log(&self) -> PathBuf {
            self.root().join("pip.log")
        }

        fn attempts(&self) -> Vec<String> {
            fs::read_to_string(self.log())
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }

        fn command(&self) -> Command {
            let mut cmd = self.bare_command();
            cmd.arg("--python").arg(self.python());
            cmd
        }

        fn bare_command(&self) -> Command {
            let mut cmd = Command::new(cargo_bin("torchup"));
            cmd.current_dir(self.root())
                .env("PATH", self.root().join("bin"))
                .env("FAKE_LOG", self.log())
                .env_remove("NVIDIA_SMI")
                .env_remove("NVSMI_PATH")
                .env_remove("TORCHUP_PYTHON")
                .env_remove("TORCHUP_INDEX_URL_BASE")
                .env_remove("RUST_LOG")
                .env_remove("FAKE_FAIL")
                .env_remove("FAKE_PROBE");
            cmd
        }
    }

    fn write_script(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn dry_run_prints_full_chain_without_installing() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(true);
        let mut cmd = host.command();
        cmd.args(["install", "--dry-run", "--skip-pip-bootstrap"]);
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Detected CUDA 12.2"))
            .stdout(predicate::str::contains("Dry run"))
            .stdout(predicate::str::contains("https://download.pytorch.org/whl/cu121"))
            .stdout(predicate::str::contains("https://download.pytorch.org/whl/cu118"))
            .stdout(predicate::str::contains("https://download.pytorch.org/whl/cpu"));
        assert!(host.attempts().is_empty());
        Ok(())
    }

    #[test]
    fn falls_back_to_next_variant() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(true);
        let mut cmd = host.command();
        cmd.env("FAKE_FAIL", "cu121").env("FAKE_PROBE", CUDA_PROBE);
        cmd.arg("install");
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Installed cu118 wheels"))
            .stdout(predicate::str::contains("Verification passed"))
            .stderr(predicate::str::contains("Falling back to cu118 wheels"));
        assert_eq!(host.attempts(), ["cu121", "cu118"]);
        Ok(())
    }

    #[test]
    fn all_variants_failing_exits_one() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(true);
        let mut cmd = host.command();
        cmd.env("FAKE_FAIL", "cu121 cu118 cpu");
        cmd.arg("install");
        cmd.assert()
            .code(1)
            .stderr(predicate::str::contains("Installation failed for every variant"));
        assert_eq!(host.attempts(), ["cu121", "cu118", "cpu"]);
        Ok(())
    }

    #[test]
    fn no_driver_installs_cpu_once() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(false);
        assert!(!host.gpu);
        let mut cmd = host.command();
        cmd.arg("install");
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("nvidia-smi not found"))
            .stdout(predicate::str::contains("Installed cpu wheels"))
            .stdout(predicate::str::contains("Verification passed"));
        assert_eq!(host.attempts(), ["cpu"]);
        Ok(())
    }

    #[test]
    fn no_subcommand_means_install() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(false);
        host.command().assert().success();
        assert_eq!(host.attempts(), ["cpu"]);
        Ok(())
    }

    #[test]
    fn acceleration_mismatch_prints_hints_but_succeeds() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(true);
        let mut cmd = host.command();
        cmd.arg("install");
        cmd.assert()
            .success()
            .stderr(predicate::str::contains("without CUDA"))
            .stdout(predicate::str::contains("NVIDIA driver"));
        assert_eq!(host.attempts(), ["cu121"]);
        Ok(())
    }

    #[test]
    fn tool_from_environment_variable() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(false);
        let mut cmd = host.command();
        cmd.env("NVIDIA_SMI", host.root().join("drivers/nvidia-smi"));
        cmd.arg("detect");
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Detected CUDA 12.2"))
            .stdout(predicate::str::contains("cu121 → cu118 → cpu"));
        Ok(())
    }

    #[test]
    fn detect_json_reports_resolution() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(true);
        let mut cmd = host.command();
        cmd.args(["detect", "--json"]);
        let output = cmd.output()?;
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(json["capability"]["major"], 12);
        assert_eq!(json["capability"]["minor"], 2);
        assert_eq!(json["resolution"]["preferred"], "cu121");
        assert_eq!(
            json["resolution"]["chain"],
            serde_json::json!(["cu121", "cu118", "cpu"])
        );
        Ok(())
    }

    #[test]
    fn variant_flag_overrides_detection() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(true);
        let mut cmd = host.command();
        cmd.args(["install", "--variant", "cpu", "--no-verify"]);
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Variant fixed to cpu"));
        assert_eq!(host.attempts(), ["cpu"]);
        Ok(())
    }

    #[test]
    fn config_file_sets_variant_and_index() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(true);
        fs::write(
            host.root().join("torchup.yml"),
            "variant: cu118\nindex_url_base: https://mirror.example/whl\n",
        )?;
        let mut cmd = host.command();
        cmd.args(["install", "--dry-run"]);
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("https://mirror.example/whl/cu118"))
            .stdout(predicate::str::contains("whl/cu121").not());
        Ok(())
    }

    #[test]
    fn invalid_config_exits_two() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(false);
        fs::write(host.root().join("torchup.yml"), "pins:\n  torch: \">=2.0\"\n")?;
        let mut cmd = host.command();
        cmd.arg("install");
        cmd.assert()
            .code(2)
            .stderr(predicate::str::contains("Invalid configuration"));
        assert!(host.attempts().is_empty());
        Ok(())
    }

    #[test]
    fn old_interpreter_gets_legacy_pins() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(false);
        let mut cmd = host.command();
        cmd.env("FAKE_PY_VERSION", "3.8.10");
        cmd.args(["install", "--dry-run", "--torch-version", "1.13.1"]);
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("torch==1.13.1"))
            .stdout(predicate::str::contains("torchvision==0.15.1"))
            .stdout(predicate::str::contains("torchaudio==2.0.1"));
        Ok(())
    }

    #[test]
    fn missing_interpreter_fails() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(false);
        let mut cmd = host.bare_command();
        cmd.args(["--python", "/nonexistent/python", "install"]);
        cmd.assert()
            .code(1)
            .stderr(predicate::str::contains("/nonexistent/python"))
            .stderr(predicate::str::contains("No such file or directory"));
        Ok(())
    }

    #[test]
    fn dry_run_plans_without_interpreter() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(true);
        let mut cmd = host.bare_command();
        cmd.args(["--python", "/nonexistent/python", "install", "--dry-run"]);
        cmd.assert()
            .success()
            .stderr(predicate::str::contains("planning with configured pins only"))
            .stdout(predicate::str::contains("/nonexistent/python -m ensurepip --upgrade"))
            .stdout(predicate::str::contains("https://download.pytorch.org/whl/cu121"));
        assert!(host.attempts().is_empty());
        Ok(())
    }

    #[test]
    fn verify_with_explicit_expectation() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(false);

        let mut cpu = host.command();
        cpu.args(["verify", "--expect", "cpu"]);
        cpu.assert()
            .success()
            .stdout(predicate::str::contains("torch.version.cuda=None"));

        let mut accelerated = host.command();
        accelerated.args(["verify", "--expect", "accelerated"]);
        accelerated.assert().code(1);
        Ok(())
    }

    #[test]
    fn verify_json_reports_runtime() -> Result<(), Box<dyn std::error::Error>> {
        let host = FakeHost::new(true);
        let mut cmd = host.command();
        cmd.env("FAKE_PROBE", CUDA_PROBE);
        cmd.args(["verify", "--json"]);
        let output = cmd.output()?;
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(json["ok"], true);
        assert_eq!(json["expected_acceleration"], true);
        assert_eq!(json["report"]["capability"], "11.8");
        assert_eq!(json["report"]["device_name"], "NVIDIA A10G");
        Ok(())
    }
}

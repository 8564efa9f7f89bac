//! Thin wrapper over the `helm` binary.

use std::io::Write as _;
use std::path::PathBuf;

use duct::cmd;
use slicer_core::{Result, SlicerError};
use tracing::debug;

pub struct Helm {
    bin: PathBuf,
}

impl Helm {
    /// Find `helm` on PATH.
    pub fn locate() -> Result<Self> {
        let bin = which::which("helm").map_err(|_| {
            SlicerError::Helm(
                "helm not found on PATH, install it from https://helm.sh/docs/intro/install/"
                    .to_string(),
            )
        })?;
        Ok(Self { bin })
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        debug!(?args, "running helm");
        let output = cmd(&self.bin, args)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .map_err(|e| SlicerError::Helm(format!("failed to run helm: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SlicerError::Helm(format!(
                "helm {} failed: {}",
                args.first().unwrap_or(&""),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Add (or refresh) a chart repository and update its index.
    pub fn add_repo(&self, name: &str, url: &str) -> Result<()> {
        self.run(&["repo", "add", name, url, "--force-update"])?;
        self.run(&["repo", "update", name])?;
        Ok(())
    }

    /// Install or upgrade a release with the given values, waiting for
    /// the rollout to complete.
    pub fn upgrade_install(
        &self,
        release: &str,
        chart: &str,
        namespace: &str,
        values: &serde_json::Value,
        timeout: &str,
    ) -> Result<()> {
        let mut values_file = tempfile::NamedTempFile::new()?;
        let yaml = serde_yaml_ng::to_string(values)?;
        values_file.write_all(yaml.as_bytes())?;
        let values_path = values_file.path().to_string_lossy().into_owned();

        self.run(&[
            "upgrade",
            "--install",
            release,
            chart,
            "--namespace",
            namespace,
            "--create-namespace",
            "--values",
            &values_path,
            "--wait",
            "--timeout",
            timeout,
        ])?;
        Ok(())
    }

    pub fn uninstall(&self, release: &str, namespace: &str) -> Result<()> {
        self.run(&["uninstall", release, "--namespace", namespace, "--wait"])?;
        Ok(())
    }
}

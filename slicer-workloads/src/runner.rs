//! Gitea Actions runner (act_runner) on a dedicated VM.

use slicer_core::{Result, SlicerError};
use tera::Context;

use crate::deploy::VmSettings;
use crate::template;
use crate::yaml::HostGroupLayout;

pub const TAG: &str = "runner";
pub const USER_AGENT: &str = "slicer-runner/1.0";
pub const DEFAULT_CIDR: &str = "192.168.142.0/24";
pub const DEFAULT_VERSION: &str = "0.2.11";
pub const DEFAULT_LABELS: &str = "ubuntu-latest:docker://node:20-bookworm";

const USERDATA_TEMPLATE: &str = include_str!("../templates/runner.sh");

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub gitea_url: Option<String>,
    pub token: Option<String>,
    pub name: Option<String>,
    pub labels: String,
    pub version: String,
}

impl RunnerConfig {
    pub fn from_env() -> Self {
        let get = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            gitea_url: get("GITEA_URL"),
            token: get("RUNNER_TOKEN"),
            name: get("RUNNER_NAME"),
            labels: get("RUNNER_LABELS").unwrap_or_else(|| DEFAULT_LABELS.to_string()),
            version: get("RUNNER_VERSION").unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        }
    }

    pub fn render_userdata(&self) -> Result<String> {
        let gitea_url = self.gitea_url.clone().ok_or_else(|| {
            SlicerError::Config(
                "GITEA_URL is required, set it or deploy gitea first".to_string(),
            )
        })?;
        let token = self.token.clone().ok_or_else(|| {
            SlicerError::Config(
                "RUNNER_TOKEN is required, create one under Site Administration > Actions > Runners"
                    .to_string(),
            )
        })?;

        let mut ctx = Context::new();
        ctx.insert("gitea_url", &gitea_url);
        ctx.insert("runner_token", &token);
        ctx.insert(
            "runner_name",
            &self.name.clone().unwrap_or_else(|| "slicer-runner".to_string()),
        );
        ctx.insert("runner_labels", &self.labels);
        ctx.insert("runner_version", &self.version);
        template::render(USERDATA_TEMPLATE, &ctx)
    }
}

pub fn settings_from_env() -> VmSettings {
    VmSettings::from_env("SLICER_HOST_GROUP", 2, 4, "100G", &[TAG])
}

pub fn host_group_layout(vm: &VmSettings) -> HostGroupLayout {
    HostGroupLayout::new(vm, DEFAULT_CIDR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_registration_command() {
        let config = RunnerConfig {
            gitea_url: Some("http://192.168.141.2:3000".to_string()),
            token: Some("reg-token".to_string()),
            name: None,
            labels: DEFAULT_LABELS.to_string(),
            version: DEFAULT_VERSION.to_string(),
        };
        let script = config.render_userdata().unwrap();
        assert!(script.contains("--instance \"http://192.168.141.2:3000\""));
        assert!(script.contains("--token \"reg-token\""));
        assert!(script.contains("--name \"slicer-runner\""));
        // The download URL expands ${RUNNER_VERSION} at boot; only the
        // variable assignment is substituted at render time.
        assert!(script.contains("RUNNER_VERSION=\"0.2.11\""));
        assert!(!script.contains("{{"));
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let config = RunnerConfig {
            gitea_url: Some("http://192.168.141.2:3000".to_string()),
            token: None,
            name: None,
            labels: DEFAULT_LABELS.to_string(),
            version: DEFAULT_VERSION.to_string(),
        };
        let err = config.render_userdata().unwrap_err();
        assert!(err.to_string().contains("RUNNER_TOKEN"));
    }

    #[test]
    fn runner_vm_gets_large_disk() {
        std::env::remove_var("SLICER_HOST_GROUP");
        assert_eq!(settings_from_env().storage_size, "100G");
    }
}

//! K3s control-plane and agent VMs.
//!
//! Control planes are provisioned over SSH after boot, so their userdata
//! only stages the installer. Agents join the cluster directly from
//! userdata with the server URL and node token baked in.

use slicer_core::{Result, SlicerError};
use tera::Context;

use crate::deploy::VmSettings;
use crate::template;
use crate::yaml::HostGroupLayout;

pub const TAG: &str = "k3s";
pub const CP_TAG: &str = "k3s-cp";
pub const AGENT_TAG: &str = "k3s-agent";
pub const USER_AGENT: &str = "slicer-k3s/1.0";

pub const DEFAULT_CP_COUNT: u32 = 3;
pub const DEFAULT_CP_CIDR: &str = "192.168.137.0/24";
pub const DEFAULT_AGENT_CIDR: &str = "192.168.138.0/24";
pub const AGENT_API_PORT: u16 = 8081;
pub const AGENT_TAP_PREFIX: &str = "k3sa";

const CP_USERDATA: &str = include_str!("../templates/k3s_cp.sh");
const AGENT_USERDATA_TEMPLATE: &str = include_str!("../templates/k3s_agent.sh");

#[derive(Debug, Clone)]
pub struct CpConfig {
    pub vm: VmSettings,
    pub count: u32,
    pub cidr: String,
}

impl CpConfig {
    pub fn from_env() -> Self {
        Self {
            vm: VmSettings::from_env("K3S_CP_HOST_GROUP", 2, 4, "25G", &[TAG, CP_TAG]),
            count: DEFAULT_CP_COUNT,
            cidr: DEFAULT_CP_CIDR.to_string(),
        }
    }

    pub fn userdata(&self) -> String {
        CP_USERDATA.to_string()
    }

    pub fn host_group_layout(&self) -> HostGroupLayout {
        let mut layout = HostGroupLayout::new(&self.vm, &self.cidr);
        layout.count = self.count;
        layout
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub vm: VmSettings,
    pub cidr: String,
    pub k3s_url: Option<String>,
    pub k3s_token: Option<String>,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let get = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            vm: VmSettings::from_env("K3S_AGENT_HOST_GROUP", 2, 4, "25G", &[TAG, AGENT_TAG]),
            cidr: DEFAULT_AGENT_CIDR.to_string(),
            k3s_url: get("K3S_URL"),
            k3s_token: get("K3S_TOKEN"),
        }
    }

    pub fn render_userdata(&self) -> Result<String> {
        let url = self.k3s_url.clone().ok_or_else(|| {
            SlicerError::Config("K3S_URL is required, e.g. https://192.168.137.2:6443".to_string())
        })?;
        let token = self.k3s_token.clone().ok_or_else(|| {
            SlicerError::Config(
                "K3S_TOKEN is required, read it from the k3s-node-token secret".to_string(),
            )
        })?;

        let mut ctx = Context::new();
        ctx.insert("k3s_url", &url);
        ctx.insert("k3s_token", &token);
        template::render(AGENT_USERDATA_TEMPLATE, &ctx)
    }

    /// Agents live behind a second API listener with SSH provisioning
    /// disabled, so the autoscaler can create them unattended.
    pub fn host_group_layout(&self) -> HostGroupLayout {
        let mut layout = HostGroupLayout::new(&self.vm, &self.cidr);
        layout.tap_prefix = AGENT_TAP_PREFIX.to_string();
        layout.api_port = AGENT_API_PORT;
        layout.bind_address = "0.0.0.0".to_string();
        layout.disable_ssh = true;
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cp_defaults() {
        std::env::remove_var("K3S_CP_HOST_GROUP");
        let config = CpConfig::from_env();
        // Control planes land in the same default host group as every
        // other workload unless K3S_CP_HOST_GROUP says otherwise.
        assert_eq!(config.vm.host_group, "api");
        assert_eq!(config.count, 3);
        assert_eq!(config.vm.tags, vec!["k3s".to_string(), "k3s-cp".to_string()]);
        assert!(config.userdata().contains("k3s-install.sh"));
    }

    #[test]
    fn agent_userdata_joins_cluster() {
        let config = AgentConfig {
            vm: VmSettings::from_env("SLICER_HOST_GROUP", 2, 4, "25G", &[TAG, AGENT_TAG]),
            cidr: DEFAULT_AGENT_CIDR.to_string(),
            k3s_url: Some("https://192.168.137.2:6443".to_string()),
            k3s_token: Some("node-token".to_string()),
        };
        let script = config.render_userdata().unwrap();
        assert!(script.contains("K3S_URL=\"https://192.168.137.2:6443\""));
        assert!(script.contains("K3S_TOKEN=\"node-token\""));
        assert!(script.contains("sh -s - agent"));
        assert!(!script.contains("{{"));
    }

    #[test]
    fn agent_layout_disables_ssh() {
        let config = AgentConfig {
            vm: VmSettings::from_env("SLICER_HOST_GROUP", 2, 4, "25G", &[TAG, AGENT_TAG]),
            cidr: DEFAULT_AGENT_CIDR.to_string(),
            k3s_url: None,
            k3s_token: None,
        };
        let layout = config.host_group_layout();
        assert_eq!(layout.api_port, 8081);
        assert_eq!(layout.tap_prefix, "k3sa");
        assert_eq!(layout.bind_address, "0.0.0.0");
        assert!(layout.disable_ssh);
        assert_eq!(layout.gateway, "192.168.138.1/24");
    }

    #[test]
    fn missing_join_details_are_config_errors() {
        let config = AgentConfig {
            vm: VmSettings::from_env("SLICER_HOST_GROUP", 2, 4, "25G", &[TAG, AGENT_TAG]),
            cidr: DEFAULT_AGENT_CIDR.to_string(),
            k3s_url: None,
            k3s_token: None,
        };
        assert!(config.render_userdata().is_err());
    }
}

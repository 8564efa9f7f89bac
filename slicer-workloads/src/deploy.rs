//! Shared deployment plumbing for all workloads.

use slicer_client::{CreateNodeRequest, CreateNodeResponse, SlicerClient, VmRecord};
use slicer_core::Result;
use tracing::info;

/// VM shape for a workload: sizing, placement and identity.
///
/// Every field has a workload-specific default; the host group and GitHub
/// user come from the environment when set.
#[derive(Debug, Clone)]
pub struct VmSettings {
    pub host_group: String,
    pub vcpus: u32,
    pub ram_gb: u32,
    pub storage_size: String,
    pub ssh_keys: Vec<String>,
    pub github_user: Option<String>,
    pub tags: Vec<String>,
}

impl VmSettings {
    /// Resolve settings from `host_group_var` (falling back to `api`) and the
    /// workload's sizing defaults. `GITHUB_USER` is picked up when present so
    /// the VM imports that user's SSH keys.
    pub fn from_env(host_group_var: &str, vcpus: u32, ram_gb: u32, storage_size: &str, tags: &[&str]) -> Self {
        let host_group = std::env::var(host_group_var)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "api".to_string());
        let github_user = std::env::var("GITHUB_USER").ok().filter(|v| !v.is_empty());

        Self {
            host_group,
            vcpus,
            ram_gb,
            storage_size: storage_size.to_string(),
            ssh_keys: Vec::new(),
            github_user,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Runs a workload's lifecycle against one Slicer host group.
pub struct WorkloadDeployer {
    client: SlicerClient,
    settings: VmSettings,
}

impl WorkloadDeployer {
    pub fn new(client: SlicerClient, settings: VmSettings) -> Self {
        Self { client, settings }
    }

    /// Build a deployer from `SLICER_URL` and `SLICER_TOKEN`.
    pub fn from_env(user_agent: &str, settings: VmSettings) -> Result<Self> {
        Ok(Self::new(SlicerClient::from_env(user_agent)?, settings))
    }

    pub fn settings(&self) -> &VmSettings {
        &self.settings
    }

    /// Create a new VM in the host group running the given userdata at boot.
    pub async fn deploy(&self, userdata: String) -> Result<CreateNodeResponse> {
        let request = CreateNodeRequest {
            ram_gb: self.settings.ram_gb,
            cpus: self.settings.vcpus,
            userdata,
            ssh_keys: self.settings.ssh_keys.clone(),
            import_user: self.settings.github_user.clone(),
            tags: self.settings.tags.clone(),
        };

        info!(
            host_group = %self.settings.host_group,
            vcpus = self.settings.vcpus,
            ram_gb = self.settings.ram_gb,
            "creating node"
        );
        self.client.create_node(&self.settings.host_group, &request).await
    }

    /// List the host group's VMs, narrowed to this workload's primary tag.
    pub async fn list(&self) -> Result<Vec<VmRecord>> {
        let nodes = self.client.host_group_nodes(&self.settings.host_group).await?;
        match self.settings.tags.first() {
            Some(tag) => Ok(slicer_client::filter_by_tag(nodes, tag)),
            None => Ok(nodes),
        }
    }

    /// First VM in the host group carrying the given tag, used to wire
    /// workloads to each other (gitea to postgres, runners to gitea).
    pub async fn find_tagged(&self, tag: &str) -> Result<Option<VmRecord>> {
        let nodes = self.client.host_group_nodes(&self.settings.host_group).await?;
        Ok(slicer_client::filter_by_tag(nodes, tag).into_iter().next())
    }

    pub async fn delete(&self, hostname: &str) -> Result<()> {
        info!(host_group = %self.settings.host_group, hostname, "deleting VM");
        self.client.delete_vm(&self.settings.host_group, hostname).await
    }

    pub async fn logs(&self, hostname: &str, lines: u32) -> Result<String> {
        self.client.vm_logs(hostname, lines).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults() {
        std::env::remove_var("TEST_DEPLOY_HOST_GROUP");
        let vm = VmSettings::from_env("TEST_DEPLOY_HOST_GROUP", 2, 4, "25G", &["postgres"]);
        assert_eq!(vm.host_group, "api");
        assert_eq!(vm.vcpus, 2);
        assert_eq!(vm.ram_gb, 4);
        assert_eq!(vm.storage_size, "25G");
        assert_eq!(vm.tags, vec!["postgres".to_string()]);
    }

    #[test]
    fn settings_host_group_override() {
        std::env::set_var("TEST_DEPLOY_HOST_GROUP_SET", "edge");
        let vm = VmSettings::from_env("TEST_DEPLOY_HOST_GROUP_SET", 4, 8, "25G", &["buildkit"]);
        assert_eq!(vm.host_group, "edge");
        std::env::remove_var("TEST_DEPLOY_HOST_GROUP_SET");
    }
}

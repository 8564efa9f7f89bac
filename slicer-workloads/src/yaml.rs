//! Host-group YAML generation for `slicer up`.
//!
//! Workloads that need a dedicated host group (k3s control planes, agents)
//! print a ready-to-use Slicer daemon config instead of assuming one exists.

use slicer_core::Result;
use tera::Context;

use crate::deploy::VmSettings;
use crate::template;

const HOST_GROUP_TEMPLATE: &str = include_str!("../templates/host_group.yaml");

/// Derive the bridge gateway address from a network CIDR, e.g.
/// `192.168.137.0/24` becomes `192.168.137.1/24`.
pub fn gateway_from_cidr(cidr: &str) -> String {
    let Some((network, prefix)) = cidr.split_once('/') else {
        return cidr.to_string();
    };
    match network.rsplit_once('.') {
        Some((head, _)) => format!("{head}.1/{prefix}"),
        None => cidr.to_string(),
    }
}

/// One host group entry in the Slicer daemon config.
#[derive(Debug, Clone)]
pub struct HostGroupLayout {
    pub name: String,
    pub storage_size: String,
    pub count: u32,
    pub vcpus: u32,
    pub ram_gb: u32,
    pub tap_prefix: String,
    pub gateway: String,
    pub api_port: u16,
    pub bind_address: String,
    /// Agents joined over the API do not need SSH provisioning.
    pub disable_ssh: bool,
}

impl HostGroupLayout {
    pub fn new(vm: &VmSettings, cidr: &str) -> Self {
        Self {
            name: vm.host_group.clone(),
            storage_size: vm.storage_size.clone(),
            count: 0,
            vcpus: vm.vcpus,
            ram_gb: vm.ram_gb,
            tap_prefix: format!("{}tap", vm.host_group),
            gateway: gateway_from_cidr(cidr),
            api_port: 8080,
            bind_address: "127.0.0.1".to_string(),
            disable_ssh: false,
        }
    }

    pub fn render(&self, github_user: &str) -> Result<String> {
        let mut ctx = Context::new();
        ctx.insert("name", &self.name);
        ctx.insert("storage_size", &self.storage_size);
        ctx.insert("count", &self.count);
        ctx.insert("vcpus", &self.vcpus);
        ctx.insert("ram_gb", &self.ram_gb);
        ctx.insert("tap_prefix", &self.tap_prefix);
        ctx.insert("gateway", &self.gateway);
        ctx.insert("github_user", github_user);
        ctx.insert("api_port", &self.api_port);
        ctx.insert("bind_address", &self.bind_address);
        ctx.insert("disable_ssh", &self.disable_ssh);
        template::render(HOST_GROUP_TEMPLATE, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vm() -> VmSettings {
        VmSettings {
            host_group: "k3s".to_string(),
            vcpus: 2,
            ram_gb: 4,
            storage_size: "25G".to_string(),
            ssh_keys: Vec::new(),
            github_user: None,
            tags: vec!["k3s".to_string()],
        }
    }

    #[test]
    fn gateway_replaces_host_octet() {
        assert_eq!(gateway_from_cidr("192.168.137.0/24"), "192.168.137.1/24");
        assert_eq!(gateway_from_cidr("10.62.0.0/16"), "10.62.0.1/16");
    }

    #[test]
    fn gateway_passes_through_malformed_input() {
        assert_eq!(gateway_from_cidr("not-a-cidr"), "not-a-cidr");
    }

    #[test]
    fn renders_group_and_network() {
        let layout = HostGroupLayout::new(&sample_vm(), "192.168.137.0/24");
        let yaml = layout.render("alexellis").unwrap();
        assert!(yaml.contains("- name: k3s"));
        assert!(yaml.contains("bridge: brk3s0"));
        assert!(yaml.contains("tap_prefix: k3stap"));
        assert!(yaml.contains("gateway: 192.168.137.1/24"));
        assert!(yaml.contains("github_user: alexellis"));
        assert!(yaml.contains("hypervisor: firecracker"));
        assert!(!yaml.contains("find_keys"));
        assert!(!yaml.contains("{{"));
    }

    #[test]
    fn renders_ssh_opt_out() {
        let mut layout = HostGroupLayout::new(&sample_vm(), "192.168.138.0/24");
        layout.disable_ssh = true;
        layout.tap_prefix = "k3sa".to_string();
        layout.api_port = 8081;
        let yaml = layout.render("alexellis").unwrap();
        assert!(yaml.contains("find_keys: false"));
        assert!(yaml.contains("port: 8081"));
        assert!(yaml.contains("tap_prefix: k3sa"));
    }
}

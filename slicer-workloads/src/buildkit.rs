//! BuildKit daemon on a dedicated VM, listening on tcp/1234.

use crate::deploy::VmSettings;
use crate::yaml::HostGroupLayout;

pub const TAG: &str = "buildkit";
pub const USER_AGENT: &str = "slicer-buildkit/1.0";
pub const DEFAULT_CIDR: &str = "192.168.138.0/24";

const USERDATA: &str = include_str!("../templates/buildkit.sh");

pub fn settings_from_env() -> VmSettings {
    VmSettings::from_env("SLICER_HOST_GROUP", 4, 8, "25G", &[TAG])
}

/// The boot script is static, no substitution needed.
pub fn userdata() -> String {
    USERDATA.to_string()
}

pub fn host_group_layout(vm: &VmSettings) -> HostGroupLayout {
    HostGroupLayout::new(vm, DEFAULT_CIDR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn userdata_is_complete() {
        let script = userdata();
        assert!(script.starts_with("#!/bin/bash"));
        assert!(script.contains("buildkitd"));
        assert!(!script.contains("{{"));
    }

    #[test]
    fn sizing_defaults() {
        std::env::remove_var("SLICER_HOST_GROUP");
        let vm = settings_from_env();
        assert_eq!(vm.vcpus, 4);
        assert_eq!(vm.ram_gb, 8);
        assert_eq!(vm.tags, vec![TAG.to_string()]);
    }
}

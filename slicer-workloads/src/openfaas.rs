//! faasd (OpenFaaS CE) on a dedicated VM.

use crate::deploy::VmSettings;
use crate::yaml::HostGroupLayout;

pub const TAG: &str = "openfaas";
pub const USER_AGENT: &str = "slicer-openfaas/1.0";
pub const DEFAULT_CIDR: &str = "192.168.140.0/24";

const USERDATA: &str = include_str!("../templates/openfaas.sh");

pub fn settings_from_env() -> VmSettings {
    VmSettings::from_env("SLICER_HOST_GROUP", 2, 4, "25G", &[TAG])
}

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
    fn userdata_installs_faasd() {
        let script = userdata();
        assert!(script.contains("faasd"));
        assert!(!script.contains("{{"));
    }
}

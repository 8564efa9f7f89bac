//! RustFS S3-compatible object storage on a dedicated VM.

use slicer_core::{generate_password, Result};
use tera::Context;

use crate::deploy::VmSettings;
use crate::template;
use crate::yaml::HostGroupLayout;

pub const TAG: &str = "rustfs";
pub const USER_AGENT: &str = "slicer-rustfs/1.0";
pub const DEFAULT_CIDR: &str = "192.168.143.0/24";
pub const DEFAULT_ACCESS_KEY: &str = "rustfsadmin";

const USERDATA_TEMPLATE: &str = include_str!("../templates/rustfs.sh");
const SECRET_KEY_LENGTH: usize = 32;

/// Root credentials for the object store. Printed once at deploy time,
/// they are not recoverable from the API afterwards.
#[derive(Debug, Clone)]
pub struct S3Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl S3Credentials {
    pub fn generate() -> Self {
        Self {
            access_key: DEFAULT_ACCESS_KEY.to_string(),
            secret_key: generate_password(SECRET_KEY_LENGTH),
        }
    }
}

pub fn settings_from_env() -> VmSettings {
    VmSettings::from_env("SLICER_HOST_GROUP", 2, 4, "25G", &[TAG])
}

pub fn render_userdata(credentials: &S3Credentials) -> Result<String> {
    let mut ctx = Context::new();
    ctx.insert("access_key", &credentials.access_key);
    ctx.insert("secret_key", &credentials.secret_key);
    template::render(USERDATA_TEMPLATE, &ctx)
}

pub fn host_group_layout(vm: &VmSettings) -> HostGroupLayout {
    HostGroupLayout::new(vm, DEFAULT_CIDR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_credentials() {
        let creds = S3Credentials::generate();
        assert_eq!(creds.access_key, "rustfsadmin");
        assert_eq!(creds.secret_key.len(), SECRET_KEY_LENGTH);
    }

    #[test]
    fn userdata_embeds_credentials() {
        let creds = S3Credentials::generate();
        let script = render_userdata(&creds).unwrap();
        assert!(script.contains(&format!("RUSTFS_ACCESS_KEY={}", creds.access_key)));
        assert!(script.contains(&format!("RUSTFS_SECRET_KEY={}", creds.secret_key)));
        assert!(!script.contains("{{"));
    }
}

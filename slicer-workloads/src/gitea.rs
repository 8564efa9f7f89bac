//! Gitea on a dedicated VM, backed by external Postgres and S3 storage.

use slicer_core::{Result, SlicerError};
use tera::Context;

use crate::deploy::VmSettings;
use crate::template;
use crate::yaml::HostGroupLayout;

pub const TAG: &str = "gitea";
pub const USER_AGENT: &str = "slicer-gitea/1.0";
pub const DEFAULT_CIDR: &str = "192.168.141.0/24";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_NAME: &str = "giteadb";
pub const DEFAULT_DB_USER: &str = "gitea";
pub const DEFAULT_S3_BUCKET: &str = "gitea";

const USERDATA_TEMPLATE: &str = include_str!("../templates/gitea.sh");

/// External service wiring for Gitea. Hosts and secrets have no sane
/// defaults, so they stay optional until resolved from the environment
/// or discovered from tagged VMs in the host group.
#[derive(Debug, Clone)]
pub struct GiteaConfig {
    pub db_host: Option<String>,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub s3_bucket: String,
    pub s3_use_ssl: bool,
}

impl GiteaConfig {
    pub fn from_env() -> Self {
        let get = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            db_host: get("GITEA_DB_HOST"),
            db_port: get("GITEA_DB_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DB_PORT),
            db_name: get("GITEA_DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            db_user: get("GITEA_DB_USER").unwrap_or_else(|| DEFAULT_DB_USER.to_string()),
            db_password: get("GITEA_DB_PASS"),
            s3_endpoint: get("GITEA_S3_ENDPOINT"),
            s3_access_key: get("GITEA_S3_ACCESS_KEY"),
            s3_secret_key: get("GITEA_S3_SECRET_KEY"),
            s3_bucket: get("GITEA_S3_BUCKET").unwrap_or_else(|| DEFAULT_S3_BUCKET.to_string()),
            s3_use_ssl: get("GITEA_S3_USE_SSL").map(|v| v == "true").unwrap_or(false),
        }
    }

    fn require(value: &Option<String>, var: &str) -> Result<String> {
        value.clone().ok_or_else(|| {
            SlicerError::Config(format!(
                "{var} is required, set it or deploy the backing service first"
            ))
        })
    }

    pub fn render_userdata(&self) -> Result<String> {
        let mut ctx = Context::new();
        ctx.insert("db_host", &Self::require(&self.db_host, "GITEA_DB_HOST")?);
        ctx.insert("db_port", &self.db_port);
        ctx.insert("db_name", &self.db_name);
        ctx.insert("db_user", &self.db_user);
        ctx.insert("db_password", &Self::require(&self.db_password, "GITEA_DB_PASS")?);
        ctx.insert("s3_endpoint", &Self::require(&self.s3_endpoint, "GITEA_S3_ENDPOINT")?);
        ctx.insert("s3_access_key", &Self::require(&self.s3_access_key, "GITEA_S3_ACCESS_KEY")?);
        ctx.insert("s3_secret_key", &Self::require(&self.s3_secret_key, "GITEA_S3_SECRET_KEY")?);
        ctx.insert("s3_bucket", &self.s3_bucket);
        ctx.insert("s3_use_ssl", &self.s3_use_ssl);
        template::render(USERDATA_TEMPLATE, &ctx)
    }
}

pub fn settings_from_env() -> VmSettings {
    VmSettings::from_env("SLICER_HOST_GROUP", 2, 4, "25G", &[TAG])
}

pub fn host_group_layout(vm: &VmSettings) -> HostGroupLayout {
    HostGroupLayout::new(vm, DEFAULT_CIDR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> GiteaConfig {
        GiteaConfig {
            db_host: Some("192.168.139.2".to_string()),
            db_port: DEFAULT_DB_PORT,
            db_name: DEFAULT_DB_NAME.to_string(),
            db_user: DEFAULT_DB_USER.to_string(),
            db_password: Some("pgpass".to_string()),
            s3_endpoint: Some("192.168.143.2:9000".to_string()),
            s3_access_key: Some("rustfsadmin".to_string()),
            s3_secret_key: Some("s3pass".to_string()),
            s3_bucket: DEFAULT_S3_BUCKET.to_string(),
            s3_use_ssl: false,
        }
    }

    #[test]
    fn renders_database_and_storage_sections() {
        let script = full_config().render_userdata().unwrap();
        assert!(script.contains("HOST = 192.168.139.2:5432"));
        assert!(script.contains("NAME = giteadb"));
        assert!(script.contains("MINIO_ENDPOINT = 192.168.143.2:9000"));
        assert!(script.contains("MINIO_USE_SSL = false"));
        assert!(!script.contains("{{"));
    }

    #[test]
    fn missing_db_host_is_a_config_error() {
        let mut config = full_config();
        config.db_host = None;
        let err = config.render_userdata().unwrap_err();
        assert!(err.to_string().contains("GITEA_DB_HOST"));
    }
}

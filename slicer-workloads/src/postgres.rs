//! PostgreSQL on a dedicated VM with a generated application role.

use slicer_core::{generate_password, Result};
use tera::Context;

use crate::deploy::VmSettings;
use crate::template;
use crate::yaml::HostGroupLayout;

pub const TAG: &str = "postgres";
pub const USER_AGENT: &str = "slicer-postgres/1.0";
pub const DEFAULT_CIDR: &str = "192.168.139.0/24";
pub const DEFAULT_DB_NAME: &str = "app";
pub const DEFAULT_DB_USER: &str = "app";
pub const DEFAULT_PORT: u16 = 5432;

const USERDATA_TEMPLATE: &str = include_str!("../templates/postgres.sh");
const PASSWORD_LENGTH: usize = 24;

#[derive(Debug, Clone)]
pub struct DbCredentials {
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
}

impl DbCredentials {
    /// Defaults with a fresh random password, overridable via
    /// `POSTGRES_DB`, `POSTGRES_USER` and `POSTGRES_PASSWORD`.
    pub fn from_env() -> Self {
        let env = |key: &str, default: &str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            db_name: env("POSTGRES_DB", DEFAULT_DB_NAME),
            db_user: env("POSTGRES_USER", DEFAULT_DB_USER),
            db_password: std::env::var("POSTGRES_PASSWORD")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| generate_password(PASSWORD_LENGTH)),
        }
    }
}

pub fn settings_from_env() -> VmSettings {
    VmSettings::from_env("SLICER_HOST_GROUP", 2, 4, "25G", &[TAG])
}

pub fn render_userdata(credentials: &DbCredentials) -> Result<String> {
    let mut ctx = Context::new();
    ctx.insert("db_name", &credentials.db_name);
    ctx.insert("db_user", &credentials.db_user);
    ctx.insert("db_password", &credentials.db_password);
    template::render(USERDATA_TEMPLATE, &ctx)
}

pub fn host_group_layout(vm: &VmSettings) -> HostGroupLayout {
    HostGroupLayout::new(vm, DEFAULT_CIDR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_default_with_random_password() {
        std::env::remove_var("POSTGRES_DB");
        std::env::remove_var("POSTGRES_USER");
        std::env::remove_var("POSTGRES_PASSWORD");
        let creds = DbCredentials::from_env();
        assert_eq!(creds.db_name, "app");
        assert_eq!(creds.db_user, "app");
        assert_eq!(creds.db_password.len(), PASSWORD_LENGTH);
    }

    #[test]
    fn userdata_creates_role_and_database() {
        let creds = DbCredentials {
            db_name: "app".to_string(),
            db_user: "app".to_string(),
            db_password: "s3cret".to_string(),
        };
        let script = render_userdata(&creds).unwrap();
        assert!(script.contains("CREATE ROLE app WITH LOGIN PASSWORD 's3cret';"));
        assert!(script.contains("CREATE DATABASE app OWNER app;"));
        assert!(!script.contains("{{"));
    }
}

//! Crossplane control plane install.

use k8s_openapi::api::core::v1::Pod;
use slicer_core::{Result, SlicerError};
use tracing::info;

use crate::helm::Helm;
use crate::provisioner::Provisioner;

pub const RELEASE: &str = "crossplane";
pub const NAMESPACE: &str = "crossplane-system";
pub const LOG_TAIL_LINES: i64 = 100;

const REPO_NAME: &str = "crossplane-stable";
const REPO_URL: &str = "https://charts.crossplane.io/stable";
const CHART: &str = "crossplane-stable/crossplane";

#[derive(Debug, Clone)]
pub struct CrossplaneSettings {
    pub replicas: i32,
    pub enable_usages: bool,
    pub enable_realtime_compositions: bool,
    pub enable_function_response_cache: bool,
    pub enable_signature_verification: bool,
}

impl Default for CrossplaneSettings {
    fn default() -> Self {
        Self {
            replicas: 1,
            enable_usages: true,
            enable_realtime_compositions: true,
            enable_function_response_cache: false,
            enable_signature_verification: false,
        }
    }
}

impl CrossplaneSettings {
    fn feature_args(&self) -> Vec<String> {
        let flags = [
            (self.enable_usages, "--enable-usages"),
            (self.enable_realtime_compositions, "--enable-realtime-compositions"),
            (self.enable_function_response_cache, "--enable-function-response-cache"),
            (self.enable_signature_verification, "--enable-signature-verification"),
        ];
        flags
            .iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, flag)| flag.to_string())
            .collect()
    }
}

pub fn helm_values(settings: &CrossplaneSettings) -> serde_json::Value {
    serde_json::json!({
        "replicas": settings.replicas,
        "args": settings.feature_args()
    })
}

pub async fn install(
    provisioner: &Provisioner,
    helm: &Helm,
    settings: &CrossplaneSettings,
) -> Result<()> {
    provisioner.verify_connection().await?;
    helm.add_repo(REPO_NAME, REPO_URL)?;
    helm.upgrade_install(RELEASE, CHART, NAMESPACE, &helm_values(settings), "5m")?;
    info!(release = RELEASE, "crossplane installed");
    Ok(())
}

pub async fn uninstall(helm: &Helm) -> Result<()> {
    helm.uninstall(RELEASE, NAMESPACE)
}

pub async fn is_installed(provisioner: &Provisioner) -> Result<bool> {
    if !provisioner.namespace_exists(NAMESPACE).await? {
        return Ok(false);
    }
    Ok(!provisioner.pods(NAMESPACE, None).await?.is_empty())
}

/// The core crossplane pod, skipping the rbac-manager.
pub fn pick_main_pod(pods: &[Pod]) -> Option<String> {
    pods.iter()
        .filter_map(|p| p.metadata.name.clone())
        .find(|name| name.starts_with("crossplane-") && !name.contains("rbac"))
}

pub async fn logs(provisioner: &Provisioner, tail_lines: i64) -> Result<String> {
    let pods = provisioner.pods(NAMESPACE, None).await?;
    let pod = pick_main_pod(&pods).ok_or_else(|| {
        SlicerError::Kubernetes(format!("no crossplane pod found in {NAMESPACE}"))
    })?;
    provisioner.pod_logs(NAMESPACE, &pod, tail_lines).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_pod(name: &str) -> Pod {
        let mut pod = Pod::default();
        pod.metadata.name = Some(name.to_string());
        pod
    }

    #[test]
    fn default_values() {
        let values = helm_values(&CrossplaneSettings::default());
        assert_eq!(values["replicas"], 1);
        let args: Vec<_> = values["args"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert_eq!(args, vec!["--enable-usages", "--enable-realtime-compositions"]);
    }

    #[test]
    fn all_flags_off() {
        let settings = CrossplaneSettings {
            replicas: 3,
            enable_usages: false,
            enable_realtime_compositions: false,
            enable_function_response_cache: false,
            enable_signature_verification: false,
        };
        let values = helm_values(&settings);
        assert_eq!(values["replicas"], 3);
        assert!(values["args"].as_array().unwrap().is_empty());
    }

    #[test]
    fn main_pod_skips_rbac_manager() {
        let pods = vec![
            named_pod("crossplane-rbac-manager-7f9d8-abcde"),
            named_pod("crossplane-66b7c-fghij"),
        ];
        assert_eq!(pick_main_pod(&pods).as_deref(), Some("crossplane-66b7c-fghij"));
    }

    #[test]
    fn no_main_pod() {
        let pods = vec![named_pod("crossplane-rbac-manager-7f9d8-abcde")];
        assert_eq!(pick_main_pod(&pods), None);
    }
}

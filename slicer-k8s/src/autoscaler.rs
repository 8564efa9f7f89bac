//! Cluster autoscaler for Slicer-backed node groups.
//!
//! The upstream cluster-autoscaler chart is installed with a Slicer cloud
//! provider build; the provider reads its node-group bounds and API
//! credentials from a cloud-config secret mounted into the pod.

use std::collections::BTreeMap;

use k8s_openapi::api::rbac::v1::ClusterRole;
use kube::api::{Api, Patch, PatchParams};
use slicer_core::{Result, SlicerError};
use tracing::{info, warn};

use crate::helm::Helm;
use crate::provisioner::{k8s_err, Provisioner};

pub const RELEASE: &str = "slicer-cluster-autoscaler";
pub const NAMESPACE: &str = "kube-system";
pub const CLOUD_CONFIG_SECRET: &str = "cluster-autoscaler-cloud-config";
pub const LABEL_SELECTOR: &str = "app.kubernetes.io/instance=slicer-cluster-autoscaler";

const REPO_NAME: &str = "autoscaler";
const REPO_URL: &str = "https://kubernetes.github.io/autoscaler";
const CHART: &str = "autoscaler/cluster-autoscaler";
const IMAGE_REPOSITORY: &str = "docker.io/welteki/cluster-autoscaler-slicer";
const CLOUD_CONFIG_MOUNT: &str = "/etc/slicer/";

pub const DEFAULT_NODE_GROUP: &str = "api";
pub const DEFAULT_MIN_SIZE: u32 = 0;
pub const DEFAULT_MAX_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct AutoscalerSettings {
    pub node_group: String,
    pub min_size: u32,
    pub max_size: u32,
    pub slicer_url: String,
    pub slicer_token: Option<String>,
}

impl AutoscalerSettings {
    pub fn from_env() -> Self {
        let get = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            node_group: get("K3S_NODEGROUP").unwrap_or_else(|| DEFAULT_NODE_GROUP.to_string()),
            min_size: get("K3S_MIN_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MIN_SIZE),
            max_size: get("K3S_MAX_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_SIZE),
            slicer_url: get("SLICER_URL").unwrap_or_else(|| "http://127.0.0.1:8080".to_string()),
            slicer_token: get("SLICER_TOKEN"),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_size > self.max_size {
            return Err(SlicerError::Config(format!(
                "K3S_MIN_SIZE ({}) must not exceed K3S_MAX_SIZE ({})",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }
}

/// Render the cloud-config INI the Slicer provider reads from its
/// mounted secret.
pub fn cloud_config(settings: &AutoscalerSettings, k3s_url: &str, k3s_token: &str) -> String {
    let mut out = String::new();
    out.push_str("[global]\n");
    out.push_str(&format!("k3s-url={k3s_url}\n"));
    out.push_str(&format!("k3s-token={k3s_token}\n"));
    out.push_str(&format!("default-min-size={}\n", settings.min_size));
    out.push_str(&format!("default-max-size={}\n", settings.max_size));
    out.push('\n');
    out.push_str(&format!("[nodegroup \"{}\"]\n", settings.node_group));
    out.push_str(&format!("slicer-url={}\n", settings.slicer_url));
    if let Some(token) = &settings.slicer_token {
        out.push_str(&format!("slicer-token={token}\n"));
    }
    out.push_str(&format!("min-size={}\n", settings.min_size));
    out.push_str(&format!("max-size={}\n", settings.max_size));
    out
}

pub fn helm_values() -> serde_json::Value {
    serde_json::json!({
        "fullnameOverride": RELEASE,
        "cloudProvider": "slicer",
        "autoDiscovery": {
            "clusterName": "k3s-slicer"
        },
        "image": {
            "repository": IMAGE_REPOSITORY,
            "tag": "latest"
        },
        "extraArgs": {
            "cloud-config": format!("{CLOUD_CONFIG_MOUNT}cloud-config"),
            "logtostderr": true,
            "stderrthreshold": "info",
            "scale-down-enabled": true,
            "scale-down-delay-after-add": "30s",
            "scale-down-unneeded-time": "30s",
            "expander": "random",
            "expendable-pods-priority-cutoff": -10,
            "v": 4
        },
        "extraVolumeSecrets": {
            "cloud-config": {
                "name": CLOUD_CONFIG_SECRET,
                "mountPath": CLOUD_CONFIG_MOUNT
            }
        }
    })
}

/// Write the cloud-config secret without touching the Helm release.
pub async fn apply_cloud_config(
    provisioner: &Provisioner,
    settings: &AutoscalerSettings,
) -> Result<()> {
    settings.validate()?;
    let k3s_url = crate::k3s::server_url()?;
    let k3s_token = crate::k3s::join_token(provisioner).await?;

    let mut data = BTreeMap::new();
    data.insert(
        "cloud-config".to_string(),
        cloud_config(settings, &k3s_url, &k3s_token),
    );
    provisioner
        .apply_secret(NAMESPACE, CLOUD_CONFIG_SECRET, data)
        .await
}

pub async fn install(
    provisioner: &Provisioner,
    helm: &Helm,
    settings: &AutoscalerSettings,
) -> Result<()> {
    provisioner.verify_connection().await?;
    apply_cloud_config(provisioner, settings).await?;

    helm.add_repo(REPO_NAME, REPO_URL)?;
    helm.upgrade_install(RELEASE, CHART, NAMESPACE, &helm_values(), "5m")?;
    info!(release = RELEASE, "autoscaler installed");

    // The chart's role cannot remove nodes; without the extra verb
    // scale-down leaves orphaned Node objects behind.
    if let Err(e) = allow_node_deletion(provisioner).await {
        warn!("could not extend the autoscaler ClusterRole: {e}");
    }
    Ok(())
}

pub async fn uninstall(provisioner: &Provisioner, helm: &Helm) -> Result<()> {
    helm.uninstall(RELEASE, NAMESPACE)?;
    provisioner.delete_secret(NAMESPACE, CLOUD_CONFIG_SECRET).await?;
    Ok(())
}

/// Add the `delete` verb to the autoscaler's `nodes` rule.
pub async fn allow_node_deletion(provisioner: &Provisioner) -> Result<()> {
    let roles: Api<ClusterRole> = Api::all(provisioner.client());
    let mut role = roles.get(RELEASE).await.map_err(k8s_err)?;

    let mut changed = false;
    if let Some(rules) = role.rules.as_mut() {
        for rule in rules.iter_mut() {
            let covers_nodes = rule
                .resources
                .as_deref()
                .unwrap_or_default()
                .iter()
                .any(|r| r == "nodes");
            if covers_nodes && !rule.verbs.iter().any(|v| v == "delete") {
                rule.verbs.push("delete".to_string());
                changed = true;
            }
        }
    }

    if changed {
        let patch = serde_json::json!({ "rules": role.rules });
        roles
            .patch(RELEASE, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(k8s_err)?;
        info!(cluster_role = RELEASE, "granted node deletion");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_settings() -> AutoscalerSettings {
        AutoscalerSettings {
            node_group: "api".to_string(),
            min_size: 0,
            max_size: 10,
            slicer_url: "http://192.168.138.1:8081".to_string(),
            slicer_token: Some("s3cret".to_string()),
        }
    }

    #[test]
    fn cloud_config_sections() {
        let ini = cloud_config(&sample_settings(), "https://192.168.137.2:6443", "node-token");
        assert!(ini.starts_with("[global]\n"));
        assert!(ini.contains("k3s-url=https://192.168.137.2:6443\n"));
        assert!(ini.contains("k3s-token=node-token\n"));
        assert!(ini.contains("[nodegroup \"api\"]\n"));
        assert!(ini.contains("slicer-url=http://192.168.138.1:8081\n"));
        assert!(ini.contains("slicer-token=s3cret\n"));
        assert!(ini.contains("min-size=0\n"));
        assert!(ini.contains("max-size=10\n"));
    }

    #[test]
    fn cloud_config_omits_empty_token() {
        let mut settings = sample_settings();
        settings.slicer_token = None;
        let ini = cloud_config(&settings, "https://k3s:6443", "tok");
        assert!(!ini.contains("slicer-token"));
    }

    #[test]
    fn values_mount_cloud_config() {
        let values = helm_values();
        assert_eq!(values["cloudProvider"], "slicer");
        assert_eq!(values["fullnameOverride"], RELEASE);
        assert_eq!(
            values["extraVolumeSecrets"]["cloud-config"]["mountPath"],
            "/etc/slicer/"
        );
        assert_eq!(values["extraArgs"]["expander"], "random");
        assert_eq!(values["extraArgs"]["logtostderr"], true);
        assert_eq!(values["extraArgs"]["stderrthreshold"], "info");
        assert_eq!(values["extraArgs"]["scale-down-enabled"], true);
    }

    #[test]
    fn inverted_bounds_rejected() {
        let mut settings = sample_settings();
        settings.min_size = 5;
        settings.max_size = 2;
        assert!(settings.validate().is_err());
    }
}

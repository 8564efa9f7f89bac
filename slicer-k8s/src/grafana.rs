//! kube-prometheus-stack install: Grafana, Prometheus and friends.

use std::collections::BTreeMap;

use slicer_core::{generate_password, Result};
use tracing::info;

use crate::helm::Helm;
use crate::provisioner::Provisioner;

pub const RELEASE: &str = "kube-prometheus-stack";
pub const NAMESPACE: &str = "monitoring";
pub const ADMIN_SECRET: &str = "kube-prometheus-stack-grafana";
pub const ADMIN_SECRET_KEY: &str = "admin-password";
pub const SCRAPE_SECRET: &str = "additional-scrape-configs";
pub const SCRAPE_SECRET_KEY: &str = "prometheus-additional.yaml";

const REPO_NAME: &str = "prometheus-community";
const REPO_URL: &str = "https://prometheus-community.github.io/helm-charts";
const CHART: &str = "prometheus-community/kube-prometheus-stack";
const PASSWORD_LENGTH: usize = 24;

#[derive(Debug, Clone)]
pub struct GrafanaSettings {
    pub admin_password: Option<String>,
    pub retention_days: u32,
    pub storage_size: String,
    pub alertmanager_enabled: bool,
    /// Hostname for a Traefik ingress; no ingress when unset.
    pub ingress_host: Option<String>,
    /// ClusterIssuer for ingress TLS; plain HTTP when unset.
    pub cluster_issuer: Option<String>,
}

impl Default for GrafanaSettings {
    fn default() -> Self {
        Self {
            admin_password: None,
            retention_days: 15,
            storage_size: "10Gi".to_string(),
            alertmanager_enabled: true,
            ingress_host: None,
            cluster_issuer: None,
        }
    }
}

impl GrafanaSettings {
    pub fn from_env() -> Self {
        let get = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let defaults = Self::default();
        Self {
            admin_password: get("GRAFANA_ADMIN_PASSWORD"),
            retention_days: get("GRAFANA_RETENTION_DAYS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retention_days),
            storage_size: get("GRAFANA_STORAGE_SIZE").unwrap_or(defaults.storage_size),
            alertmanager_enabled: get("GRAFANA_ALERTMANAGER")
                .map(|v| v != "false")
                .unwrap_or(defaults.alertmanager_enabled),
            ingress_host: get("GRAFANA_INGRESS_HOST"),
            cluster_issuer: get("GRAFANA_CLUSTER_ISSUER"),
        }
    }
}

pub fn helm_values(
    settings: &GrafanaSettings,
    admin_password: &str,
    has_scrape_configs: bool,
) -> serde_json::Value {
    let mut grafana = serde_json::json!({
        "adminPassword": admin_password,
        "service": { "type": "NodePort" },
        "dashboardProviders": {
            "dashboardproviders.yaml": {
                "apiVersion": 1,
                "providers": [{
                    "name": "default",
                    "orgId": 1,
                    "folder": "",
                    "type": "file",
                    "disableDeletion": false,
                    "editable": true,
                    "options": { "path": "/var/lib/grafana/dashboards/default" }
                }]
            }
        },
        "dashboards": {
            "default": {
                "node-exporter-full": {
                    "gnetId": 1860,
                    "revision": 37,
                    "datasource": "Prometheus"
                }
            }
        }
    });

    if let Some(host) = &settings.ingress_host {
        let mut ingress = serde_json::json!({
            "enabled": true,
            "ingressClassName": "traefik",
            "hosts": [host]
        });
        if let Some(issuer) = &settings.cluster_issuer {
            ingress["annotations"] =
                serde_json::json!({ "cert-manager.io/cluster-issuer": issuer });
            ingress["tls"] = serde_json::json!([{
                "hosts": [host],
                "secretName": format!("{RELEASE}-grafana-tls")
            }]);
        }
        grafana["ingress"] = ingress;
    }

    let mut prometheus_spec = serde_json::json!({
        "retention": format!("{}d", settings.retention_days),
        "enableRemoteWriteReceiver": true,
        "storageSpec": {
            "volumeClaimTemplate": {
                "spec": {
                    "accessModes": ["ReadWriteOnce"],
                    "resources": {
                        "requests": { "storage": settings.storage_size }
                    }
                }
            }
        }
    });
    if has_scrape_configs {
        prometheus_spec["additionalScrapeConfigsSecret"] = serde_json::json!({
            "enabled": true,
            "name": SCRAPE_SECRET,
            "key": SCRAPE_SECRET_KEY
        });
    }

    serde_json::json!({
        "grafana": grafana,
        "prometheus": {
            "service": { "type": "NodePort" },
            "prometheusSpec": prometheus_spec
        },
        "alertmanager": { "enabled": settings.alertmanager_enabled }
    })
}

/// Install the stack. Returns the Grafana admin password in use so it
/// can be shown once at deploy time.
pub async fn install(
    provisioner: &Provisioner,
    helm: &Helm,
    settings: &GrafanaSettings,
) -> Result<String> {
    provisioner.verify_connection().await?;

    let admin_password = settings
        .admin_password
        .clone()
        .unwrap_or_else(|| generate_password(PASSWORD_LENGTH));
    let has_scrape_configs = provisioner.secret_exists(NAMESPACE, SCRAPE_SECRET).await?;

    helm.add_repo(REPO_NAME, REPO_URL)?;
    helm.upgrade_install(
        RELEASE,
        CHART,
        NAMESPACE,
        &helm_values(settings, &admin_password, has_scrape_configs),
        "10m",
    )?;
    info!(release = RELEASE, "monitoring stack installed");
    Ok(admin_password)
}

pub async fn uninstall(helm: &Helm) -> Result<()> {
    helm.uninstall(RELEASE, NAMESPACE)
}

/// Store extra Prometheus scrape configs; picked up on the next install.
pub async fn apply_scrape_configs(provisioner: &Provisioner, configs_yaml: &str) -> Result<()> {
    let mut data = BTreeMap::new();
    data.insert(SCRAPE_SECRET_KEY.to_string(), configs_yaml.to_string());
    provisioner.apply_secret(NAMESPACE, SCRAPE_SECRET, data).await
}

/// The admin password as stored by the chart.
pub async fn admin_password(provisioner: &Provisioner) -> Result<String> {
    provisioner
        .secret_text(NAMESPACE, ADMIN_SECRET, ADMIN_SECRET_KEY)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_values() {
        let values = helm_values(&GrafanaSettings::default(), "hunter2", false);
        assert_eq!(values["grafana"]["adminPassword"], "hunter2");
        assert_eq!(values["grafana"]["service"]["type"], "NodePort");
        assert_eq!(
            values["grafana"]["dashboards"]["default"]["node-exporter-full"]["gnetId"],
            1860
        );
        assert_eq!(
            values["prometheus"]["prometheusSpec"]["retention"],
            "15d"
        );
        assert_eq!(
            values["prometheus"]["prometheusSpec"]["enableRemoteWriteReceiver"],
            true
        );
        assert!(values["prometheus"]["prometheusSpec"]
            .get("additionalScrapeConfigsSecret")
            .is_none());
        assert_eq!(values["alertmanager"]["enabled"], true);
        assert!(values["grafana"].get("ingress").is_none());
    }

    #[test]
    fn scrape_secret_wired_when_present() {
        let values = helm_values(&GrafanaSettings::default(), "pw", true);
        let scrape = &values["prometheus"]["prometheusSpec"]["additionalScrapeConfigsSecret"];
        assert_eq!(scrape["name"], SCRAPE_SECRET);
        assert_eq!(scrape["key"], SCRAPE_SECRET_KEY);
    }

    #[test]
    fn ingress_with_tls() {
        let settings = GrafanaSettings {
            ingress_host: Some("grafana.example.com".to_string()),
            cluster_issuer: Some("letsencrypt-prod".to_string()),
            ..Default::default()
        };
        let values = helm_values(&settings, "pw", false);
        let ingress = &values["grafana"]["ingress"];
        assert_eq!(ingress["enabled"], true);
        assert_eq!(ingress["hosts"][0], "grafana.example.com");
        assert_eq!(
            ingress["annotations"]["cert-manager.io/cluster-issuer"],
            "letsencrypt-prod"
        );
        assert_eq!(ingress["tls"][0]["secretName"], "kube-prometheus-stack-grafana-tls");
    }

    #[test]
    fn retention_and_storage_overrides() {
        let settings = GrafanaSettings {
            retention_days: 30,
            storage_size: "50Gi".to_string(),
            alertmanager_enabled: false,
            ..Default::default()
        };
        let values = helm_values(&settings, "pw", false);
        assert_eq!(values["prometheus"]["prometheusSpec"]["retention"], "30d");
        assert_eq!(
            values["prometheus"]["prometheusSpec"]["storageSpec"]["volumeClaimTemplate"]["spec"]
                ["resources"]["requests"]["storage"],
            "50Gi"
        );
        assert_eq!(values["alertmanager"]["enabled"], false);
    }
}

//! cert-manager install and ACME ClusterIssuer management.

use kube::api::{Api, ApiResource, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::core::GroupVersionKind;
use slicer_core::{Result, SlicerError};
use tracing::info;

use crate::helm::Helm;
use crate::provisioner::{k8s_err, Provisioner};

pub const RELEASE: &str = "cert-manager";
pub const NAMESPACE: &str = "cert-manager";

const REPO_NAME: &str = "jetstack";
const REPO_URL: &str = "https://charts.jetstack.io";
const CHART: &str = "jetstack/cert-manager";

const ACME_PRODUCTION: &str = "https://acme-v02.api.letsencrypt.org/directory";
const ACME_STAGING: &str = "https://acme-staging-v02.api.letsencrypt.org/directory";

fn issuer_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk("cert-manager.io", "v1", "ClusterIssuer"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcmeEnvironment {
    Production,
    Staging,
}

impl AcmeEnvironment {
    pub fn server(&self) -> &'static str {
        match self {
            Self::Production => ACME_PRODUCTION,
            Self::Staging => ACME_STAGING,
        }
    }

    pub fn default_issuer_name(&self) -> &'static str {
        match self {
            Self::Production => "letsencrypt-prod",
            Self::Staging => "letsencrypt-staging",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClusterIssuerConfig {
    pub name: Option<String>,
    pub email: String,
    pub environment: AcmeEnvironment,
}

impl ClusterIssuerConfig {
    pub fn name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.environment.default_issuer_name())
    }

    /// ACME issuer solving http01 challenges through the bundled K3s
    /// Traefik ingress.
    pub fn manifest(&self) -> serde_json::Value {
        let name = self.name();
        serde_json::json!({
            "apiVersion": "cert-manager.io/v1",
            "kind": "ClusterIssuer",
            "metadata": { "name": name },
            "spec": {
                "acme": {
                    "server": self.environment.server(),
                    "email": self.email,
                    "privateKeySecretRef": { "name": format!("{name}-account-key") },
                    "solvers": [{
                        "http01": {
                            "ingress": { "class": "traefik" }
                        }
                    }]
                }
            }
        })
    }
}

pub fn helm_values(replicas: i32) -> serde_json::Value {
    serde_json::json!({
        "installCRDs": true,
        "replicaCount": replicas,
        "prometheus": { "enabled": true }
    })
}

pub async fn install(provisioner: &Provisioner, helm: &Helm, replicas: i32) -> Result<()> {
    provisioner.verify_connection().await?;
    helm.add_repo(REPO_NAME, REPO_URL)?;
    helm.upgrade_install(RELEASE, CHART, NAMESPACE, &helm_values(replicas), "5m")?;
    info!(release = RELEASE, "cert-manager installed");
    Ok(())
}

pub async fn uninstall(helm: &Helm) -> Result<()> {
    helm.uninstall(RELEASE, NAMESPACE)
}

/// Create or update a ClusterIssuer through the dynamic API; the typed
/// API has no cert-manager resources.
pub async fn apply_cluster_issuer(
    provisioner: &Provisioner,
    config: &ClusterIssuerConfig,
) -> Result<()> {
    let resource = issuer_resource();
    let api: Api<DynamicObject> = Api::all_with(provisioner.client(), &resource);
    let name = config.name().to_string();
    let issuer: DynamicObject = serde_json::from_value(config.manifest())
        .map_err(|e| SlicerError::Kubernetes(format!("bad issuer manifest: {e}")))?;

    match api.create(&PostParams::default(), &issuer).await {
        Ok(_) => info!(issuer = %name, "cluster issuer created"),
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            api.patch(&name, &PatchParams::default(), &Patch::Merge(config.manifest()))
                .await
                .map_err(k8s_err)?;
            info!(issuer = %name, "cluster issuer updated");
        }
        Err(e) => return Err(k8s_err(e)),
    }
    Ok(())
}

pub async fn list_cluster_issuers(provisioner: &Provisioner) -> Result<Vec<String>> {
    let resource = issuer_resource();
    let api: Api<DynamicObject> = Api::all_with(provisioner.client(), &resource);
    let issuers = api.list(&ListParams::default()).await.map_err(k8s_err)?;
    Ok(issuers
        .items
        .into_iter()
        .filter_map(|i| i.metadata.name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_install_crds() {
        let values = helm_values(2);
        assert_eq!(values["installCRDs"], true);
        assert_eq!(values["replicaCount"], 2);
        assert_eq!(values["prometheus"]["enabled"], true);
    }

    #[test]
    fn production_issuer_manifest() {
        let config = ClusterIssuerConfig {
            name: None,
            email: "ops@example.com".to_string(),
            environment: AcmeEnvironment::Production,
        };
        let manifest = config.manifest();
        assert_eq!(manifest["metadata"]["name"], "letsencrypt-prod");
        assert_eq!(manifest["spec"]["acme"]["server"], ACME_PRODUCTION);
        assert_eq!(
            manifest["spec"]["acme"]["privateKeySecretRef"]["name"],
            "letsencrypt-prod-account-key"
        );
        assert_eq!(
            manifest["spec"]["acme"]["solvers"][0]["http01"]["ingress"]["class"],
            "traefik"
        );
    }

    #[test]
    fn staging_issuer_with_custom_name() {
        let config = ClusterIssuerConfig {
            name: Some("my-issuer".to_string()),
            email: "ops@example.com".to_string(),
            environment: AcmeEnvironment::Staging,
        };
        assert_eq!(config.name(), "my-issuer");
        assert_eq!(config.manifest()["spec"]["acme"]["server"], ACME_STAGING);
    }
}

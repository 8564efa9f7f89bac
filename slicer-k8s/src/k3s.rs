//! K3s cluster details needed by agents and the autoscaler.

use kube::config::Kubeconfig;
use slicer_core::{Result, SlicerError};

use crate::provisioner::Provisioner;

pub const TOKEN_SECRET: &str = "k3s-node-token";
pub const TOKEN_SECRET_NAMESPACE: &str = "kube-system";
const TOKEN_KEY: &str = "token";

/// The API server URL of the kubeconfig's current context.
pub fn server_url() -> Result<String> {
    let kubeconfig = Kubeconfig::read()
        .map_err(|e| SlicerError::Kubernetes(format!("failed to read kubeconfig: {e}")))?;
    server_url_from(&kubeconfig)
}

pub fn server_url_from(kubeconfig: &Kubeconfig) -> Result<String> {
    let current = kubeconfig
        .current_context
        .as_deref()
        .ok_or_else(|| SlicerError::Kubernetes("kubeconfig has no current context".to_string()))?;

    let context = kubeconfig
        .contexts
        .iter()
        .find(|c| c.name == current)
        .and_then(|c| c.context.as_ref())
        .ok_or_else(|| {
            SlicerError::Kubernetes(format!("kubeconfig context {current} not found"))
        })?;

    kubeconfig
        .clusters
        .iter()
        .find(|c| c.name == context.cluster)
        .and_then(|c| c.cluster.as_ref())
        .and_then(|c| c.server.clone())
        .ok_or_else(|| {
            SlicerError::Kubernetes(format!(
                "cluster {} has no server URL in the kubeconfig",
                context.cluster
            ))
        })
}

/// The node join token, stored in-cluster so agents and the autoscaler
/// can be handed it without SSH access to a server.
pub async fn join_token(provisioner: &Provisioner) -> Result<String> {
    let token = provisioner
        .secret_text(TOKEN_SECRET_NAMESPACE, TOKEN_SECRET, TOKEN_KEY)
        .await
        .map_err(|_| {
            SlicerError::Kubernetes(format!(
                "secret {TOKEN_SECRET} not found; copy /var/lib/rancher/k3s/server/node-token \
                 from a server and run: kubectl create secret generic {TOKEN_SECRET} \
                 -n {TOKEN_SECRET_NAMESPACE} --from-literal={TOKEN_KEY}=<value>"
            ))
        })?;
    Ok(token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_url_follows_current_context() {
        let yaml = r#"
apiVersion: v1
kind: Config
current-context: k3s
clusters:
- name: k3s
  cluster:
    server: https://192.168.137.2:6443
contexts:
- name: k3s
  context:
    cluster: k3s
    user: default
users:
- name: default
  user: {}
"#;
        let kubeconfig: Kubeconfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(
            server_url_from(&kubeconfig).unwrap(),
            "https://192.168.137.2:6443"
        );
    }

    #[test]
    fn missing_context_is_an_error() {
        let kubeconfig = Kubeconfig::default();
        assert!(server_url_from(&kubeconfig).is_err());
    }
}

//! Cluster access and the handful of raw Kubernetes operations the
//! installers share.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Namespace, Node, Pod, Secret};
use kube::api::{Api, DeleteParams, ListParams, LogParams, ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Client, Config};
use slicer_core::{Result, SlicerError};
use tracing::debug;

pub(crate) fn k8s_err(e: kube::Error) -> SlicerError {
    SlicerError::Kubernetes(e.to_string())
}

pub(crate) fn is_not_found(e: &kube::Error) -> bool {
    matches!(e, kube::Error::Api(ae) if ae.code == 404)
}

/// A connected Kubernetes client plus shared helpers.
#[derive(Clone)]
pub struct Provisioner {
    client: Client,
}

impl Provisioner {
    /// Connect using `KUBECONFIG`, the default kubeconfig, or in-cluster
    /// config, in that order of discovery.
    pub async fn connect() -> Result<Self> {
        let config = Config::infer()
            .await
            .map_err(|e| SlicerError::Kubernetes(format!("kubeconfig discovery failed: {e}")))?;
        let client = Client::try_from(config)
            .map_err(|e| SlicerError::Kubernetes(format!("failed to build client: {e}")))?;
        Ok(Self { client })
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Cheap reachability check before any install work starts.
    pub async fn verify_connection(&self) -> Result<()> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        namespaces.get("kube-system").await.map_err(|e| {
            SlicerError::Kubernetes(format!("cannot reach the cluster: {e}"))
        })?;
        Ok(())
    }

    pub async fn namespace_exists(&self, name: &str) -> Result<bool> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        match namespaces.get(name).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(k8s_err(e)),
        }
    }

    pub async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match secrets.get(name).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(k8s_err(e)),
        }
    }

    /// Read one key of a secret as UTF-8 text.
    pub async fn secret_text(&self, namespace: &str, name: &str, key: &str) -> Result<String> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets.get(name).await.map_err(k8s_err)?;
        let data = secret
            .data
            .and_then(|mut d| d.remove(key))
            .ok_or_else(|| {
                SlicerError::Kubernetes(format!("secret {namespace}/{name} has no key {key}"))
            })?;
        String::from_utf8(data.0).map_err(|_| {
            SlicerError::Kubernetes(format!("secret {namespace}/{name} key {key} is not UTF-8"))
        })
    }

    /// Create or update a secret with the given string data.
    pub async fn apply_secret(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, String>,
    ) -> Result<()> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            string_data: Some(data.clone()),
            ..Default::default()
        };

        match secrets.get(name).await {
            Ok(_) => {
                debug!(namespace, name, "updating secret");
                let patch = serde_json::json!({ "stringData": data });
                secrets
                    .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
                    .await
                    .map_err(k8s_err)?;
            }
            Err(e) if is_not_found(&e) => {
                debug!(namespace, name, "creating secret");
                secrets
                    .create(&PostParams::default(), &secret)
                    .await
                    .map_err(k8s_err)?;
            }
            Err(e) => return Err(k8s_err(e)),
        }
        Ok(())
    }

    /// Delete a secret, ignoring a missing one.
    pub async fn delete_secret(&self, namespace: &str, name: &str) -> Result<()> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match secrets.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(k8s_err(e)),
        }
    }

    pub async fn nodes(&self) -> Result<Vec<Node>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        Ok(nodes.list(&ListParams::default()).await.map_err(k8s_err)?.items)
    }

    pub async fn pods(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<Pod>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }
        Ok(pods.list(&params).await.map_err(k8s_err)?.items)
    }

    pub async fn pod_logs(&self, namespace: &str, pod: &str, tail_lines: i64) -> Result<String> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            tail_lines: Some(tail_lines),
            ..Default::default()
        };
        pods.logs(pod, &params).await.map_err(k8s_err)
    }

    pub async fn deployments(&self, namespace: &str) -> Result<Vec<Deployment>> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        Ok(deployments
            .list(&ListParams::default())
            .await
            .map_err(k8s_err)?
            .items)
    }

    pub async fn statefulsets(&self, namespace: &str) -> Result<Vec<StatefulSet>> {
        let statefulsets: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        Ok(statefulsets
            .list(&ListParams::default())
            .await
            .map_err(k8s_err)?
            .items)
    }
}

/// One row of `kubectl get nodes`-style output.
#[derive(Debug, Clone)]
pub struct NodeSummary {
    pub name: String,
    pub roles: Vec<String>,
    pub ready: bool,
}

pub fn summarize_node(node: &Node) -> NodeSummary {
    let name = node.metadata.name.clone().unwrap_or_default();

    let roles = node
        .metadata
        .labels
        .as_ref()
        .map(|labels| {
            labels
                .keys()
                .filter_map(|k| k.strip_prefix("node-role.kubernetes.io/"))
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let ready = node
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or(false);

    NodeSummary { name, roles, ready }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{NodeCondition, NodeStatus};

    #[test]
    fn summarize_ready_control_plane() {
        let mut node = Node::default();
        node.metadata.name = Some("k3s-1".to_string());
        node.metadata.labels = Some(
            [(
                "node-role.kubernetes.io/control-plane".to_string(),
                "true".to_string(),
            )]
            .into_iter()
            .collect(),
        );
        node.status = Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: "True".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        });

        let summary = summarize_node(&node);
        assert_eq!(summary.name, "k3s-1");
        assert_eq!(summary.roles, vec!["control-plane".to_string()]);
        assert!(summary.ready);
    }

    #[test]
    fn summarize_unlabeled_agent() {
        let mut node = Node::default();
        node.metadata.name = Some("agent-1".to_string());
        let summary = summarize_node(&node);
        assert!(summary.roles.is_empty());
        assert!(!summary.ready);
    }
}

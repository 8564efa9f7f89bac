//! A scalable dummy workload to exercise autoscaler scale-up/down.

use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams};
use slicer_core::Result;
use tracing::info;

use crate::provisioner::{is_not_found, k8s_err, Provisioner};

pub const NAME: &str = "autoscaler-stress-test";
pub const NAMESPACE: &str = "default";

/// Busybox pods that sleep forever. The requests are tiny but non-zero,
/// so enough replicas force a scale-up without doing any work.
pub fn deployment(replicas: i32) -> Result<Deployment> {
    let deployment = serde_json::from_value(serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": NAME,
            "namespace": NAMESPACE,
            "labels": { "app": NAME }
        },
        "spec": {
            "replicas": replicas,
            "selector": { "matchLabels": { "app": NAME } },
            "template": {
                "metadata": { "labels": { "app": NAME } },
                "spec": {
                    "terminationGracePeriodSeconds": 0,
                    "containers": [{
                        "name": "sleeper",
                        "image": "busybox:stable",
                        "command": ["sleep", "infinity"],
                        "resources": {
                            "requests": {
                                "cpu": "50m",
                                "memory": "50Mi"
                            }
                        }
                    }]
                }
            }
        }
    }))?;
    Ok(deployment)
}

pub async fn start(provisioner: &Provisioner, replicas: i32) -> Result<()> {
    let api: Api<Deployment> = Api::namespaced(provisioner.client(), NAMESPACE);
    let deployment = deployment(replicas)?;

    match api.create(&PostParams::default(), &deployment).await {
        Ok(_) => {
            info!(name = NAME, replicas, "stress test started");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => scale(provisioner, replicas).await,
        Err(e) => Err(k8s_err(e)),
    }
}

pub async fn scale(provisioner: &Provisioner, replicas: i32) -> Result<()> {
    let api: Api<Deployment> = Api::namespaced(provisioner.client(), NAMESPACE);
    let patch = serde_json::json!({ "spec": { "replicas": replicas } });
    api.patch(NAME, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(k8s_err)?;
    info!(name = NAME, replicas, "stress test scaled");
    Ok(())
}

/// Ready and desired replica counts, or `None` if the deployment is gone.
pub async fn status(provisioner: &Provisioner) -> Result<Option<(i32, i32)>> {
    let api: Api<Deployment> = Api::namespaced(provisioner.client(), NAMESPACE);
    let deployment = match api.get(NAME).await {
        Ok(d) => d,
        Err(e) if is_not_found(&e) => return Ok(None),
        Err(e) => return Err(k8s_err(e)),
    };

    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(0);
    let ready = deployment
        .status
        .as_ref()
        .and_then(|s| s.ready_replicas)
        .unwrap_or(0);
    Ok(Some((ready, desired)))
}

pub async fn stop(provisioner: &Provisioner) -> Result<()> {
    let api: Api<Deployment> = Api::namespaced(provisioner.client(), NAMESPACE);
    match api.delete(NAME, &DeleteParams::default()).await {
        Ok(_) => Ok(()),
        Err(e) if is_not_found(&e) => Ok(()),
        Err(e) => Err(k8s_err(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_shape() {
        let d = deployment(5).unwrap();
        let spec = d.spec.unwrap();
        assert_eq!(spec.replicas, Some(5));

        let pod = spec.template.spec.unwrap();
        assert_eq!(pod.termination_grace_period_seconds, Some(0));

        let container = &pod.containers[0];
        assert_eq!(container.image.as_deref(), Some("busybox:stable"));
        let requests = container.resources.as_ref().unwrap().requests.as_ref().unwrap();
        assert_eq!(requests["cpu"].0, "50m");
        assert_eq!(requests["memory"].0, "50Mi");
    }
}

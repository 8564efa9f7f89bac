//! Kubernetes-side provisioning: the cluster autoscaler, Crossplane,
//! cert-manager and the Grafana monitoring stack, installed into a K3s
//! cluster running on Slicer VMs.
//!
//! Kubernetes objects are managed through `kube`; Helm charts are driven
//! through the `helm` binary since chart rendering has no native Rust
//! implementation.

pub mod autoscaler;
pub mod certmanager;
pub mod crossplane;
pub mod grafana;
pub mod helm;
pub mod k3s;
pub mod provisioner;
pub mod stress;

pub use helm::Helm;
pub use provisioner::Provisioner;

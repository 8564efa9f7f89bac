//! Workload definitions for Slicer micro-VM deployments.
//!
//! Each workload module pairs a config resolver (environment variables over
//! built-in defaults) with an embedded userdata script that provisions the
//! service on first boot. The shared [`WorkloadDeployer`] turns a resolved
//! config into Slicer API calls.

pub mod buildkit;
pub mod deploy;
pub mod gitea;
pub mod k3s;
pub mod openfaas;
pub mod postgres;
pub mod runner;
pub mod rustfs;
pub mod template;
pub mod yaml;

pub use deploy::{VmSettings, WorkloadDeployer};
pub use yaml::{gateway_from_cidr, HostGroupLayout};

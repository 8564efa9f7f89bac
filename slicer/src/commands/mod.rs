// Command dispatch and helpers shared across workloads

use std::path::PathBuf;

use slicer_client::{strip_cidr, CreateNodeResponse, VmRecord};
use slicer_core::{slicer_println, Result, SlicerError};
use slicer_k8s::Provisioner;
use slicer_workloads::VmSettings;

use crate::cli::{Args, Command};

mod buildkit;
mod certmanager;
mod crossplane;
mod gitea;
mod grafana;
mod k3s;
mod openfaas;
mod postgres;
mod runner;
mod rustfs;

pub async fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Buildkit { command } => buildkit::execute(command).await,
        Command::Openfaas { command } => openfaas::execute(command).await,
        Command::Rustfs { command } => rustfs::execute(command).await,
        Command::Postgres { command } => postgres::execute(command).await,
        Command::Gitea { command } => gitea::execute(command).await,
        Command::Runner { command } => runner::execute(command).await,
        Command::K3s { command } => k3s::execute(command).await,
        Command::Crossplane { command } => crossplane::execute(command).await,
        Command::CertManager { command } => certmanager::execute(command).await,
        Command::Grafana { command } => grafana::execute(command).await,
    }
}

fn ssh_key_path() -> Option<PathBuf> {
    match std::env::var("SSH_KEY_PATH").ok().filter(|v| !v.is_empty()) {
        Some(path) => Some(PathBuf::from(path)),
        None => dirs::home_dir().map(|home| home.join(".ssh").join("id_ed25519.pub")),
    }
}

/// The operator's public SSH key, if one can be found.
pub(crate) fn load_ssh_key() -> Result<Option<String>> {
    let Some(path) = ssh_key_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    let key = std::fs::read_to_string(&path)?;
    Ok(Some(key.trim().to_string()))
}

/// Host-group YAML embeds the GitHub user whose keys new VMs import;
/// there is no usable placeholder.
pub(crate) fn require_github_user(vm: &VmSettings) -> Result<String> {
    vm.github_user.clone().ok_or_else(|| {
        SlicerError::Config(
            "GITHUB_USER is required to render a host-group config, \
             e.g. export GITHUB_USER=alexellis"
                .to_string(),
        )
    })
}

/// Attach the operator's SSH key to the VM settings.
pub(crate) fn apply_identity(vm: &mut VmSettings) -> Result<()> {
    if let Some(key) = load_ssh_key()? {
        vm.ssh_keys.push(key);
    }
    Ok(())
}

pub(crate) fn print_created(node: &CreateNodeResponse) {
    slicer_println!("Hostname: {}", node.hostname);
    slicer_println!("IP:       {}", strip_cidr(&node.ip));
    slicer_println!("Created:  {}", node.created_at.to_rfc3339());
}

pub(crate) fn print_node_list(nodes: &[VmRecord], label: &str) {
    if nodes.is_empty() {
        slicer_println!("No {label} VMs found");
        return;
    }
    for node in nodes {
        slicer_println!(
            "{}\t{}\t{}\t{}",
            node.hostname,
            strip_cidr(&node.ip),
            node.tags.join(","),
            node.created_at.to_rfc3339()
        );
    }
}

/// `kubectl get`-style summary of a namespace's deployments and pods.
pub(crate) async fn print_namespace_status(
    provisioner: &Provisioner,
    namespace: &str,
) -> Result<()> {
    for deployment in provisioner.deployments(namespace).await? {
        let name = deployment.metadata.name.unwrap_or_default();
        let desired = deployment.spec.and_then(|s| s.replicas).unwrap_or(0);
        let ready = deployment
            .status
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0);
        slicer_println!("deployment/{name}\t{ready}/{desired}");
    }
    for pod in provisioner.pods(namespace, None).await? {
        let name = pod.metadata.name.unwrap_or_default();
        let phase = pod
            .status
            .and_then(|s| s.phase)
            .unwrap_or_else(|| "Unknown".to_string());
        slicer_println!("pod/{name}\t{phase}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vm(github_user: Option<&str>) -> VmSettings {
        VmSettings {
            host_group: "api".to_string(),
            vcpus: 2,
            ram_gb: 4,
            storage_size: "25G".to_string(),
            ssh_keys: Vec::new(),
            github_user: github_user.map(|u| u.to_string()),
            tags: vec!["postgres".to_string()],
        }
    }

    #[test]
    fn yaml_requires_github_user() {
        let err = require_github_user(&sample_vm(None)).unwrap_err();
        assert!(err.to_string().contains("GITHUB_USER"));
        assert_eq!(
            require_github_user(&sample_vm(Some("alexellis"))).unwrap(),
            "alexellis"
        );
    }

    // One test body: these share the SSH_KEY_PATH variable and must not
    // interleave with each other.
    #[test]
    fn ssh_key_resolution() {
        std::env::set_var("SSH_KEY_PATH", "/tmp/some_key.pub");
        assert_eq!(ssh_key_path(), Some(PathBuf::from("/tmp/some_key.pub")));

        std::env::set_var("SSH_KEY_PATH", "/nonexistent/key.pub");
        assert_eq!(load_ssh_key().unwrap(), None);

        std::env::remove_var("SSH_KEY_PATH");
    }
}

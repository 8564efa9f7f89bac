use slicer_client::{has_tag, strip_cidr, VmRecord};
use slicer_core::{slicer_hint, slicer_println, slicer_progress, Result, SlicerError};
use slicer_k8s::provisioner::summarize_node;
use slicer_k8s::{autoscaler, k3s as cluster, stress, Helm, Provisioner};
use slicer_workloads::k3s::{self, AgentConfig, CpConfig};
use slicer_workloads::WorkloadDeployer;

use super::{apply_identity, print_created, print_node_list, require_github_user};
use crate::cli::{K3sSubcommand, StressSubcommand};

fn cp_deployer(config: &CpConfig) -> Result<WorkloadDeployer> {
    WorkloadDeployer::from_env(k3s::USER_AGENT, config.vm.clone())
}

fn agent_deployer(config: &AgentConfig) -> Result<WorkloadDeployer> {
    WorkloadDeployer::from_env(k3s::USER_AGENT, config.vm.clone())
}

/// Both control planes and agents carry the `k3s` tag; narrow down to
/// the role-specific one.
async fn list_role(deployer: &WorkloadDeployer, role_tag: &str) -> Result<Vec<VmRecord>> {
    let nodes = deployer.list().await?;
    Ok(nodes
        .into_iter()
        .filter(|n| has_tag(&n.tags, role_tag))
        .collect())
}

/// Fill unset agent join details from the kubeconfig and the in-cluster
/// token secret.
async fn resolve_join_details(config: &mut AgentConfig) -> Result<()> {
    if config.k3s_url.is_none() {
        if let Ok(url) = cluster::server_url() {
            config.k3s_url = Some(url);
        }
    }
    if config.k3s_token.is_none() {
        if let Ok(provisioner) = Provisioner::connect().await {
            if let Ok(token) = cluster::join_token(&provisioner).await {
                config.k3s_token = Some(token);
            }
        }
    }
    Ok(())
}

pub async fn execute(command: K3sSubcommand) -> Result<()> {
    match command {
        K3sSubcommand::DeployCp => {
            let mut config = CpConfig::from_env();
            apply_identity(&mut config.vm)?;
            let deployer = cp_deployer(&config)?;
            slicer_progress!(
                "Deploying a K3s control plane into host group {}",
                config.vm.host_group
            );
            let node = deployer.deploy(config.userdata()).await?;
            print_created(&node);
            slicer_hint!(
                "Install K3s with: k3sup install --ip {} --user ubuntu",
                strip_cidr(&node.ip)
            );
        }
        K3sSubcommand::DeployAgent => {
            let mut config = AgentConfig::from_env();
            apply_identity(&mut config.vm)?;
            resolve_join_details(&mut config).await?;
            let userdata = config.render_userdata()?;
            let deployer = agent_deployer(&config)?;
            slicer_progress!(
                "Deploying a K3s agent into host group {}",
                config.vm.host_group
            );
            let node = deployer.deploy(userdata).await?;
            print_created(&node);
        }
        K3sSubcommand::ListCp => {
            let config = CpConfig::from_env();
            let nodes = list_role(&cp_deployer(&config)?, k3s::CP_TAG).await?;
            print_node_list(&nodes, "K3s control-plane");
        }
        K3sSubcommand::ListAgents => {
            let config = AgentConfig::from_env();
            let nodes = list_role(&agent_deployer(&config)?, k3s::AGENT_TAG).await?;
            print_node_list(&nodes, "K3s agent");
        }
        K3sSubcommand::DeleteCp { hostname } => {
            let config = CpConfig::from_env();
            cp_deployer(&config)?.delete(&hostname).await?;
            slicer_println!("Deleted {hostname}");
        }
        K3sSubcommand::DeleteAgent { hostname } => {
            let config = AgentConfig::from_env();
            agent_deployer(&config)?.delete(&hostname).await?;
            slicer_println!("Deleted {hostname}");
        }
        K3sSubcommand::LogsCp { hostname, lines } => {
            let config = CpConfig::from_env();
            let logs = cp_deployer(&config)?.logs(&hostname, lines).await?;
            slicer_println!("{}", logs.trim_end());
        }
        K3sSubcommand::LogsAgent { hostname, lines } => {
            let config = AgentConfig::from_env();
            let logs = agent_deployer(&config)?.logs(&hostname, lines).await?;
            slicer_println!("{}", logs.trim_end());
        }
        K3sSubcommand::UserdataCp => {
            slicer_println!("{}", CpConfig::from_env().userdata().trim_end());
        }
        K3sSubcommand::UserdataAgent => {
            let mut config = AgentConfig::from_env();
            resolve_join_details(&mut config).await?;
            slicer_println!("{}", config.render_userdata()?.trim_end());
        }
        K3sSubcommand::YamlCp => {
            let config = CpConfig::from_env();
            let user = require_github_user(&config.vm)?;
            slicer_println!("{}", config.host_group_layout().render(&user)?.trim_end());
        }
        K3sSubcommand::YamlAgent => {
            let config = AgentConfig::from_env();
            let user = require_github_user(&config.vm)?;
            slicer_println!("{}", config.host_group_layout().render(&user)?.trim_end());
        }
        K3sSubcommand::Devices => {
            let config = CpConfig::from_env();
            let nodes = list_role(&cp_deployer(&config)?, k3s::CP_TAG).await?;
            let devices: Vec<_> = nodes
                .iter()
                .map(|n| {
                    serde_json::json!({
                        "hostname": n.hostname,
                        "ip": strip_cidr(&n.ip),
                        "created_at": n.created_at,
                    })
                })
                .collect();
            slicer_println!("{}", serde_json::to_string_pretty(&devices)?);
        }
        K3sSubcommand::Nodes => {
            let provisioner = Provisioner::connect().await?;
            for node in provisioner.nodes().await? {
                let summary = summarize_node(&node);
                let roles = if summary.roles.is_empty() {
                    "<none>".to_string()
                } else {
                    summary.roles.join(",")
                };
                let state = if summary.ready { "Ready" } else { "NotReady" };
                slicer_println!("{}\t{}\t{}", summary.name, roles, state);
            }
        }
        K3sSubcommand::AutoscalerConfig => {
            let provisioner = Provisioner::connect().await?;
            let settings = autoscaler::AutoscalerSettings::from_env();
            autoscaler::apply_cloud_config(&provisioner, &settings).await?;
            slicer_println!(
                "Wrote secret {}/{}",
                autoscaler::NAMESPACE,
                autoscaler::CLOUD_CONFIG_SECRET
            );
        }
        K3sSubcommand::AutoscalerInstall => {
            let provisioner = Provisioner::connect().await?;
            let helm = Helm::locate()?;
            let settings = autoscaler::AutoscalerSettings::from_env();
            autoscaler::install(&provisioner, &helm, &settings).await?;
            slicer_println!("Autoscaler installed for node group {}", settings.node_group);
        }
        K3sSubcommand::AutoscalerUninstall => {
            let provisioner = Provisioner::connect().await?;
            let helm = Helm::locate()?;
            autoscaler::uninstall(&provisioner, &helm).await?;
            slicer_println!("Autoscaler removed");
        }
        K3sSubcommand::AutoscalerStatus => {
            let provisioner = Provisioner::connect().await?;
            slicer_println!("Nodes:");
            for node in provisioner.nodes().await? {
                let summary = summarize_node(&node);
                let state = if summary.ready { "Ready" } else { "NotReady" };
                slicer_println!("  {}\t{}", summary.name, state);
            }
            slicer_println!("Autoscaler pods:");
            let pods = provisioner
                .pods(autoscaler::NAMESPACE, Some(autoscaler::LABEL_SELECTOR))
                .await?;
            for pod in pods {
                let name = pod.metadata.name.unwrap_or_default();
                let phase = pod
                    .status
                    .and_then(|s| s.phase)
                    .unwrap_or_else(|| "Unknown".to_string());
                slicer_println!("  {name}\t{phase}");
            }
        }
        K3sSubcommand::AutoscalerLogs { lines } => {
            let provisioner = Provisioner::connect().await?;
            let pods = provisioner
                .pods(autoscaler::NAMESPACE, Some(autoscaler::LABEL_SELECTOR))
                .await?;
            let pod = pods
                .into_iter()
                .filter_map(|p| p.metadata.name)
                .next()
                .ok_or_else(|| {
                    SlicerError::Kubernetes("no autoscaler pod found, is it installed?".to_string())
                })?;
            let logs = provisioner
                .pod_logs(autoscaler::NAMESPACE, &pod, lines)
                .await?;
            slicer_println!("{}", logs.trim_end());
        }
        K3sSubcommand::StressTest { command } => {
            let provisioner = Provisioner::connect().await?;
            match command {
                StressSubcommand::Start { replicas } => {
                    stress::start(&provisioner, replicas).await?;
                    slicer_println!("Stress test running with {replicas} replicas");
                }
                StressSubcommand::Scale { replicas } => {
                    stress::scale(&provisioner, replicas).await?;
                    slicer_println!("Stress test scaled to {replicas} replicas");
                }
                StressSubcommand::Status => match stress::status(&provisioner).await? {
                    Some((ready, desired)) => {
                        slicer_println!("{ready}/{desired} replicas ready")
                    }
                    None => slicer_println!("No stress-test deployment found"),
                },
                StressSubcommand::Stop => {
                    stress::stop(&provisioner).await?;
                    slicer_println!("Stress test removed");
                }
            }
        }
    }
    Ok(())
}

use slicer_client::strip_cidr;
use slicer_core::{slicer_hint, slicer_println, slicer_progress, Result};
use slicer_workloads::gitea::{self, GiteaConfig};
use slicer_workloads::{postgres, rustfs, WorkloadDeployer};

use super::{apply_identity, print_created, print_node_list, require_github_user};
use crate::cli::VmSubcommand;

fn deployer() -> Result<WorkloadDeployer> {
    WorkloadDeployer::from_env(gitea::USER_AGENT, gitea::settings_from_env())
}

/// Fill unset db/S3 endpoints from VMs already running in the host group.
async fn autodetect_peers(deployer: &WorkloadDeployer, config: &mut GiteaConfig) -> Result<()> {
    if config.db_host.is_none() {
        if let Some(node) = deployer.find_tagged(postgres::TAG).await? {
            let ip = strip_cidr(&node.ip).to_string();
            slicer_progress!("Using postgres VM {} at {}", node.hostname, ip);
            config.db_host = Some(ip);
        }
    }
    if config.s3_endpoint.is_none() {
        if let Some(node) = deployer.find_tagged(rustfs::TAG).await? {
            let endpoint = format!("{}:9000", strip_cidr(&node.ip));
            slicer_progress!("Using rustfs VM {} at {}", node.hostname, endpoint);
            config.s3_endpoint = Some(endpoint);
        }
    }
    Ok(())
}

pub async fn execute(command: VmSubcommand) -> Result<()> {
    match command {
        VmSubcommand::Deploy => {
            let mut vm = gitea::settings_from_env();
            apply_identity(&mut vm)?;
            let deployer = WorkloadDeployer::from_env(gitea::USER_AGENT, vm)?;
            let mut config = GiteaConfig::from_env();
            autodetect_peers(&deployer, &mut config).await?;

            slicer_progress!(
                "Deploying Gitea into host group {}",
                deployer.settings().host_group
            );
            let node = deployer.deploy(config.render_userdata()?).await?;
            print_created(&node);
            slicer_hint!(
                "Open http://{}:3000 to finish the installation",
                strip_cidr(&node.ip)
            );
        }
        VmSubcommand::List => print_node_list(&deployer()?.list().await?, "Gitea"),
        VmSubcommand::Delete { hostname } => {
            deployer()?.delete(&hostname).await?;
            slicer_println!("Deleted {hostname}");
        }
        VmSubcommand::Logs { hostname, lines } => {
            slicer_println!("{}", deployer()?.logs(&hostname, lines).await?.trim_end());
        }
        VmSubcommand::Userdata => {
            let script = GiteaConfig::from_env().render_userdata()?;
            slicer_println!("{}", script.trim_end());
        }
        VmSubcommand::Yaml => {
            let vm = gitea::settings_from_env();
            let user = require_github_user(&vm)?;
            slicer_println!("{}", gitea::host_group_layout(&vm).render(&user)?.trim_end());
        }
    }
    Ok(())
}

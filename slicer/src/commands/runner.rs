use slicer_client::strip_cidr;
use slicer_core::{slicer_println, slicer_progress, Result};
use slicer_workloads::runner::{self, RunnerConfig};
use slicer_workloads::{gitea, WorkloadDeployer};

use super::{apply_identity, print_created, print_node_list, require_github_user};
use crate::cli::VmSubcommand;

fn deployer() -> Result<WorkloadDeployer> {
    WorkloadDeployer::from_env(runner::USER_AGENT, runner::settings_from_env())
}

async fn autodetect_gitea(deployer: &WorkloadDeployer, config: &mut RunnerConfig) -> Result<()> {
    if config.gitea_url.is_none() {
        if let Some(node) = deployer.find_tagged(gitea::TAG).await? {
            let url = format!("http://{}:3000", strip_cidr(&node.ip));
            slicer_progress!("Using gitea VM {} at {}", node.hostname, url);
            config.gitea_url = Some(url);
        }
    }
    Ok(())
}

pub async fn execute(command: VmSubcommand) -> Result<()> {
    match command {
        VmSubcommand::Deploy => {
            let mut vm = runner::settings_from_env();
            apply_identity(&mut vm)?;
            let deployer = WorkloadDeployer::from_env(runner::USER_AGENT, vm)?;
            let mut config = RunnerConfig::from_env();
            autodetect_gitea(&deployer, &mut config).await?;

            slicer_progress!(
                "Deploying an Actions runner into host group {}",
                deployer.settings().host_group
            );
            let node = deployer.deploy(config.render_userdata()?).await?;
            print_created(&node);
        }
        VmSubcommand::List => print_node_list(&deployer()?.list().await?, "runner"),
        VmSubcommand::Delete { hostname } => {
            deployer()?.delete(&hostname).await?;
            slicer_println!("Deleted {hostname}");
        }
        VmSubcommand::Logs { hostname, lines } => {
            slicer_println!("{}", deployer()?.logs(&hostname, lines).await?.trim_end());
        }
        VmSubcommand::Userdata => {
            let script = RunnerConfig::from_env().render_userdata()?;
            slicer_println!("{}", script.trim_end());
        }
        VmSubcommand::Yaml => {
            let vm = runner::settings_from_env();
            let user = require_github_user(&vm)?;
            slicer_println!("{}", runner::host_group_layout(&vm).render(&user)?.trim_end());
        }
    }
    Ok(())
}

use slicer_client::strip_cidr;
use slicer_core::{slicer_hint, slicer_println, slicer_progress, Result};
use slicer_workloads::{buildkit, WorkloadDeployer};

use super::{apply_identity, print_created, print_node_list, require_github_user};
use crate::cli::VmSubcommand;

fn deployer() -> Result<WorkloadDeployer> {
    WorkloadDeployer::from_env(buildkit::USER_AGENT, buildkit::settings_from_env())
}

pub async fn execute(command: VmSubcommand) -> Result<()> {
    match command {
        VmSubcommand::Deploy => {
            let mut vm = buildkit::settings_from_env();
            apply_identity(&mut vm)?;
            let deployer = WorkloadDeployer::from_env(buildkit::USER_AGENT, vm)?;
            slicer_progress!(
                "Deploying BuildKit into host group {}",
                deployer.settings().host_group
            );
            let node = deployer.deploy(buildkit::userdata()).await?;
            print_created(&node);
            slicer_hint!(
                "Build with: buildctl --addr tcp://{}:1234 build ...",
                strip_cidr(&node.ip)
            );
        }
        VmSubcommand::List => print_node_list(&deployer()?.list().await?, "BuildKit"),
        VmSubcommand::Delete { hostname } => {
            deployer()?.delete(&hostname).await?;
            slicer_println!("Deleted {hostname}");
        }
        VmSubcommand::Logs { hostname, lines } => {
            slicer_println!("{}", deployer()?.logs(&hostname, lines).await?.trim_end());
        }
        VmSubcommand::Userdata => slicer_println!("{}", buildkit::userdata().trim_end()),
        VmSubcommand::Yaml => {
            let vm = buildkit::settings_from_env();
            let user = require_github_user(&vm)?;
            slicer_println!("{}", buildkit::host_group_layout(&vm).render(&user)?.trim_end());
        }
    }
    Ok(())
}

use slicer_client::strip_cidr;
use slicer_core::{slicer_hint, slicer_println, slicer_progress, Result};
use slicer_workloads::{openfaas, WorkloadDeployer};

use super::{apply_identity, print_created, print_node_list, require_github_user};
use crate::cli::VmSubcommand;

fn deployer() -> Result<WorkloadDeployer> {
    WorkloadDeployer::from_env(openfaas::USER_AGENT, openfaas::settings_from_env())
}

pub async fn execute(command: VmSubcommand) -> Result<()> {
    match command {
        VmSubcommand::Deploy => {
            let mut vm = openfaas::settings_from_env();
            apply_identity(&mut vm)?;
            let deployer = WorkloadDeployer::from_env(openfaas::USER_AGENT, vm)?;
            slicer_progress!(
                "Deploying faasd into host group {}",
                deployer.settings().host_group
            );
            let node = deployer.deploy(openfaas::userdata()).await?;
            print_created(&node);
            let ip = strip_cidr(&node.ip);
            slicer_hint!(
                "Gateway: http://{ip}:8080, password: ssh in and read /var/lib/faasd/secrets/basic-auth-password"
            );
        }
        VmSubcommand::List => print_node_list(&deployer()?.list().await?, "faasd"),
        VmSubcommand::Delete { hostname } => {
            deployer()?.delete(&hostname).await?;
            slicer_println!("Deleted {hostname}");
        }
        VmSubcommand::Logs { hostname, lines } => {
            slicer_println!("{}", deployer()?.logs(&hostname, lines).await?.trim_end());
        }
        VmSubcommand::Userdata => slicer_println!("{}", openfaas::userdata().trim_end()),
        VmSubcommand::Yaml => {
            let vm = openfaas::settings_from_env();
            let user = require_github_user(&vm)?;
            slicer_println!("{}", openfaas::host_group_layout(&vm).render(&user)?.trim_end());
        }
    }
    Ok(())
}

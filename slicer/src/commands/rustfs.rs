use slicer_client::strip_cidr;
use slicer_core::{slicer_hint, slicer_println, slicer_progress, slicer_warning, Result};
use slicer_workloads::rustfs::{self, S3Credentials};
use slicer_workloads::WorkloadDeployer;

use super::{apply_identity, print_created, print_node_list, require_github_user};
use crate::cli::VmSubcommand;

fn deployer() -> Result<WorkloadDeployer> {
    WorkloadDeployer::from_env(rustfs::USER_AGENT, rustfs::settings_from_env())
}

pub async fn execute(command: VmSubcommand) -> Result<()> {
    match command {
        VmSubcommand::Deploy => {
            let mut vm = rustfs::settings_from_env();
            apply_identity(&mut vm)?;
            let deployer = WorkloadDeployer::from_env(rustfs::USER_AGENT, vm)?;
            slicer_progress!(
                "Deploying RustFS into host group {}",
                deployer.settings().host_group
            );
            let credentials = S3Credentials::generate();
            let node = deployer.deploy(rustfs::render_userdata(&credentials)?).await?;
            print_created(&node);
            slicer_println!("Access key: {}", credentials.access_key);
            slicer_println!("Secret key: {}", credentials.secret_key);
            slicer_warning!("Record the keys now, they are not stored anywhere");
            slicer_hint!("S3 endpoint: http://{}:9000", strip_cidr(&node.ip));
        }
        VmSubcommand::List => print_node_list(&deployer()?.list().await?, "RustFS"),
        VmSubcommand::Delete { hostname } => {
            deployer()?.delete(&hostname).await?;
            slicer_println!("Deleted {hostname}");
        }
        VmSubcommand::Logs { hostname, lines } => {
            slicer_println!("{}", deployer()?.logs(&hostname, lines).await?.trim_end());
        }
        VmSubcommand::Userdata => {
            let script = rustfs::render_userdata(&S3Credentials::generate())?;
            slicer_println!("{}", script.trim_end());
        }
        VmSubcommand::Yaml => {
            let vm = rustfs::settings_from_env();
            let user = require_github_user(&vm)?;
            slicer_println!("{}", rustfs::host_group_layout(&vm).render(&user)?.trim_end());
        }
    }
    Ok(())
}

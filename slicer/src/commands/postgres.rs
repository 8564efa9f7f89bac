use slicer_client::strip_cidr;
use slicer_core::{slicer_hint, slicer_println, slicer_progress, slicer_warning, Result};
use slicer_workloads::postgres::{self, DbCredentials};
use slicer_workloads::WorkloadDeployer;

use super::{apply_identity, print_created, print_node_list, require_github_user};
use crate::cli::VmSubcommand;

fn deployer() -> Result<WorkloadDeployer> {
    WorkloadDeployer::from_env(postgres::USER_AGENT, postgres::settings_from_env())
}

pub async fn execute(command: VmSubcommand) -> Result<()> {
    match command {
        VmSubcommand::Deploy => {
            let mut vm = postgres::settings_from_env();
            apply_identity(&mut vm)?;
            let deployer = WorkloadDeployer::from_env(postgres::USER_AGENT, vm)?;
            slicer_progress!(
                "Deploying PostgreSQL into host group {}",
                deployer.settings().host_group
            );
            let credentials = DbCredentials::from_env();
            let node = deployer.deploy(postgres::render_userdata(&credentials)?).await?;
            print_created(&node);
            slicer_println!("Database: {}", credentials.db_name);
            slicer_println!("User:     {}", credentials.db_user);
            slicer_println!("Password: {}", credentials.db_password);
            slicer_warning!("Record the password now, it is not stored anywhere");
            slicer_hint!(
                "Connect with: psql postgres://{}:<password>@{}:5432/{}",
                credentials.db_user,
                strip_cidr(&node.ip),
                credentials.db_name
            );
        }
        VmSubcommand::List => print_node_list(&deployer()?.list().await?, "PostgreSQL"),
        VmSubcommand::Delete { hostname } => {
            deployer()?.delete(&hostname).await?;
            slicer_println!("Deleted {hostname}");
        }
        VmSubcommand::Logs { hostname, lines } => {
            slicer_println!("{}", deployer()?.logs(&hostname, lines).await?.trim_end());
        }
        VmSubcommand::Userdata => {
            let script = postgres::render_userdata(&DbCredentials::from_env())?;
            slicer_println!("{}", script.trim_end());
        }
        VmSubcommand::Yaml => {
            let vm = postgres::settings_from_env();
            let user = require_github_user(&vm)?;
            slicer_println!("{}", postgres::host_group_layout(&vm).render(&user)?.trim_end());
        }
    }
    Ok(())
}

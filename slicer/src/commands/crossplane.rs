use slicer_core::{slicer_println, slicer_progress, Result};
use slicer_k8s::crossplane::{self, CrossplaneSettings};
use slicer_k8s::{Helm, Provisioner};

use super::print_namespace_status;
use crate::cli::CrossplaneSubcommand;

pub async fn execute(command: CrossplaneSubcommand) -> Result<()> {
    match command {
        CrossplaneSubcommand::Install { replicas } => {
            let provisioner = Provisioner::connect().await?;
            let helm = Helm::locate()?;
            let settings = CrossplaneSettings {
                replicas,
                ..Default::default()
            };
            slicer_progress!("Installing Crossplane into {}", crossplane::NAMESPACE);
            crossplane::install(&provisioner, &helm, &settings).await?;
            slicer_println!("Crossplane installed");
        }
        CrossplaneSubcommand::Uninstall => {
            let helm = Helm::locate()?;
            crossplane::uninstall(&helm).await?;
            slicer_println!("Crossplane removed");
        }
        CrossplaneSubcommand::Status => {
            let provisioner = Provisioner::connect().await?;
            if !crossplane::is_installed(&provisioner).await? {
                slicer_println!("Crossplane is not installed");
                return Ok(());
            }
            print_namespace_status(&provisioner, crossplane::NAMESPACE).await?;
        }
        CrossplaneSubcommand::Logs { lines } => {
            let provisioner = Provisioner::connect().await?;
            let logs = crossplane::logs(&provisioner, lines).await?;
            slicer_println!("{}", logs.trim_end());
        }
    }
    Ok(())
}

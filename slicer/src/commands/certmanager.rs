use slicer_core::{slicer_println, slicer_progress, Result};
use slicer_k8s::certmanager::{self, AcmeEnvironment, ClusterIssuerConfig};
use slicer_k8s::{Helm, Provisioner};

use super::print_namespace_status;
use crate::cli::{CertManagerSubcommand, IssuerSubcommand};

pub async fn execute(command: CertManagerSubcommand) -> Result<()> {
    match command {
        CertManagerSubcommand::Install { replicas } => {
            let provisioner = Provisioner::connect().await?;
            let helm = Helm::locate()?;
            slicer_progress!("Installing cert-manager into {}", certmanager::NAMESPACE);
            certmanager::install(&provisioner, &helm, replicas).await?;
            slicer_println!("cert-manager installed");
        }
        CertManagerSubcommand::Uninstall => {
            let helm = Helm::locate()?;
            certmanager::uninstall(&helm).await?;
            slicer_println!("cert-manager removed");
        }
        CertManagerSubcommand::Status => {
            let provisioner = Provisioner::connect().await?;
            print_namespace_status(&provisioner, certmanager::NAMESPACE).await?;
        }
        CertManagerSubcommand::Issuer { command } => match command {
            IssuerSubcommand::Create {
                email,
                staging,
                name,
            } => {
                let provisioner = Provisioner::connect().await?;
                let config = ClusterIssuerConfig {
                    name,
                    email,
                    environment: if staging {
                        AcmeEnvironment::Staging
                    } else {
                        AcmeEnvironment::Production
                    },
                };
                certmanager::apply_cluster_issuer(&provisioner, &config).await?;
                slicer_println!("ClusterIssuer {} is in place", config.name());
            }
            IssuerSubcommand::List => {
                let provisioner = Provisioner::connect().await?;
                let issuers = certmanager::list_cluster_issuers(&provisioner).await?;
                if issuers.is_empty() {
                    slicer_println!("No cluster issuers found");
                } else {
                    for issuer in issuers {
                        slicer_println!("{issuer}");
                    }
                }
            }
        },
    }
    Ok(())
}

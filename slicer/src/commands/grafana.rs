use slicer_core::{slicer_println, slicer_progress, slicer_warning, Result};
use slicer_k8s::grafana::{self, GrafanaSettings};
use slicer_k8s::{Helm, Provisioner};

use super::print_namespace_status;
use crate::cli::GrafanaSubcommand;

pub async fn execute(command: GrafanaSubcommand) -> Result<()> {
    match command {
        GrafanaSubcommand::Install => {
            let provisioner = Provisioner::connect().await?;
            let helm = Helm::locate()?;
            let settings = GrafanaSettings::from_env();
            slicer_progress!("Installing kube-prometheus-stack into {}", grafana::NAMESPACE);
            let admin_password = grafana::install(&provisioner, &helm, &settings).await?;
            slicer_println!("Grafana admin password: {admin_password}");
            slicer_warning!("The password is also stored in secret {}/{}", grafana::NAMESPACE, grafana::ADMIN_SECRET);
        }
        GrafanaSubcommand::Uninstall => {
            let helm = Helm::locate()?;
            grafana::uninstall(&helm).await?;
            slicer_println!("Monitoring stack removed");
        }
        GrafanaSubcommand::Status => {
            let provisioner = Provisioner::connect().await?;
            print_namespace_status(&provisioner, grafana::NAMESPACE).await?;
            for statefulset in provisioner.statefulsets(grafana::NAMESPACE).await? {
                let name = statefulset.metadata.name.unwrap_or_default();
                let desired = statefulset.spec.and_then(|s| s.replicas).unwrap_or(0);
                let ready = statefulset
                    .status
                    .map(|s| s.ready_replicas.unwrap_or(0))
                    .unwrap_or(0);
                slicer_println!("statefulset/{name}\t{ready}/{desired}");
            }
        }
        GrafanaSubcommand::Password => {
            let provisioner = Provisioner::connect().await?;
            slicer_println!("{}", grafana::admin_password(&provisioner).await?);
        }
        GrafanaSubcommand::ScrapeConfigs { file } => {
            let configs = std::fs::read_to_string(&file)?;
            let provisioner = Provisioner::connect().await?;
            grafana::apply_scrape_configs(&provisioner, &configs).await?;
            slicer_println!(
                "Wrote secret {}/{}; reinstall to apply",
                grafana::NAMESPACE,
                grafana::SCRAPE_SECRET
            );
        }
    }
    Ok(())
}

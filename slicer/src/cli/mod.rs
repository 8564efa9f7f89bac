// CLI argument parsing and definitions

use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "slicer")]
#[command(about = "Deploy packaged workloads onto Slicer micro-VMs")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// BuildKit daemon VM
    Buildkit {
        #[command(subcommand)]
        command: VmSubcommand,
    },
    /// faasd (OpenFaaS CE) VM
    Openfaas {
        #[command(subcommand)]
        command: VmSubcommand,
    },
    /// RustFS S3-compatible object storage VM
    Rustfs {
        #[command(subcommand)]
        command: VmSubcommand,
    },
    /// PostgreSQL VM
    Postgres {
        #[command(subcommand)]
        command: VmSubcommand,
    },
    /// Gitea VM backed by Postgres and S3 storage
    Gitea {
        #[command(subcommand)]
        command: VmSubcommand,
    },
    /// Gitea Actions runner VM
    Runner {
        #[command(subcommand)]
        command: VmSubcommand,
    },
    /// K3s control planes, agents and the cluster autoscaler
    K3s {
        #[command(subcommand)]
        command: K3sSubcommand,
    },
    /// Crossplane in-cluster install
    Crossplane {
        #[command(subcommand)]
        command: CrossplaneSubcommand,
    },
    /// cert-manager install and ACME cluster issuers
    CertManager {
        #[command(subcommand)]
        command: CertManagerSubcommand,
    },
    /// kube-prometheus-stack monitoring install
    Grafana {
        #[command(subcommand)]
        command: GrafanaSubcommand,
    },
}

/// The shared per-workload VM lifecycle.
#[derive(Debug, Clone, Subcommand)]
pub enum VmSubcommand {
    /// Create a VM and provision the workload at boot
    Deploy,
    /// List this workload's VMs in the host group
    List,
    /// Delete a VM by hostname
    Delete { hostname: String },
    /// Fetch serial-console logs
    Logs {
        hostname: String,
        /// Number of lines to fetch
        #[arg(long, default_value_t = 50)]
        lines: u32,
    },
    /// Print the rendered userdata script
    Userdata,
    /// Print a Slicer host-group config for this workload
    Yaml,
}

#[derive(Debug, Clone, Subcommand)]
pub enum K3sSubcommand {
    /// Create a control-plane VM
    DeployCp,
    /// Create an agent VM that joins the cluster at boot
    DeployAgent,
    /// List control-plane VMs
    ListCp,
    /// List agent VMs
    ListAgents,
    /// Delete a control-plane VM by hostname
    DeleteCp { hostname: String },
    /// Delete an agent VM by hostname
    DeleteAgent { hostname: String },
    /// Fetch serial-console logs from a control-plane VM
    LogsCp {
        hostname: String,
        #[arg(long, default_value_t = 50)]
        lines: u32,
    },
    /// Fetch serial-console logs from an agent VM
    LogsAgent {
        hostname: String,
        #[arg(long, default_value_t = 50)]
        lines: u32,
    },
    /// Print the control-plane userdata script
    UserdataCp,
    /// Print the rendered agent userdata script
    UserdataAgent,
    /// Print a host-group config for control planes
    YamlCp,
    /// Print a host-group config for agents
    YamlAgent,
    /// Print control-plane nodes as JSON for k3sup
    Devices,
    /// List Kubernetes nodes with role and readiness
    Nodes,
    /// Write the autoscaler cloud-config secret
    AutoscalerConfig,
    /// Install the cluster autoscaler
    AutoscalerInstall,
    /// Remove the cluster autoscaler and its secret
    AutoscalerUninstall,
    /// Show cluster nodes and autoscaler pods
    AutoscalerStatus,
    /// Tail the autoscaler pod logs
    AutoscalerLogs {
        #[arg(long, default_value_t = 100)]
        lines: i64,
    },
    /// Drive autoscaler scale-up with a dummy workload
    StressTest {
        #[command(subcommand)]
        command: StressSubcommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum StressSubcommand {
    /// Create the stress-test deployment
    Start {
        #[arg(long, default_value_t = 10)]
        replicas: i32,
    },
    /// Scale the stress-test deployment
    Scale {
        #[arg(long)]
        replicas: i32,
    },
    /// Show ready/desired replica counts
    Status,
    /// Delete the stress-test deployment
    Stop,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CrossplaneSubcommand {
    /// Install or upgrade Crossplane
    Install {
        #[arg(long, default_value_t = 1)]
        replicas: i32,
    },
    /// Uninstall Crossplane
    Uninstall,
    /// Show deployments and pods in crossplane-system
    Status,
    /// Tail the core Crossplane pod logs
    Logs {
        #[arg(long, default_value_t = 100)]
        lines: i64,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum CertManagerSubcommand {
    /// Install or upgrade cert-manager
    Install {
        #[arg(long, default_value_t = 1)]
        replicas: i32,
    },
    /// Uninstall cert-manager
    Uninstall,
    /// Show deployments and pods in cert-manager
    Status,
    /// Manage ACME cluster issuers
    Issuer {
        #[command(subcommand)]
        command: IssuerSubcommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum IssuerSubcommand {
    /// Create or update a Let's Encrypt cluster issuer
    Create {
        /// ACME registration email
        #[arg(long)]
        email: String,
        /// Use the Let's Encrypt staging endpoint
        #[arg(long)]
        staging: bool,
        /// Issuer name (defaults to letsencrypt-prod/-staging)
        #[arg(long)]
        name: Option<String>,
    },
    /// List cluster issuers
    List,
}

#[derive(Debug, Clone, Subcommand)]
pub enum GrafanaSubcommand {
    /// Install or upgrade the monitoring stack
    Install,
    /// Uninstall the monitoring stack
    Uninstall,
    /// Show deployments, statefulsets and pods in monitoring
    Status,
    /// Print the Grafana admin password
    Password,
    /// Store extra Prometheus scrape configs from a YAML file
    ScrapeConfigs { file: std::path::PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn parses_nested_subcommands() {
        let args = Args::try_parse_from(["slicer", "postgres", "deploy"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Postgres {
                command: VmSubcommand::Deploy
            }
        ));

        let args = Args::try_parse_from([
            "slicer",
            "k3s",
            "stress-test",
            "scale",
            "--replicas",
            "25",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::K3s {
                command: K3sSubcommand::StressTest {
                    command: StressSubcommand::Scale { replicas: 25 }
                }
            }
        ));
    }

    #[test]
    fn logs_lines_default() {
        let args = Args::try_parse_from(["slicer", "buildkit", "logs", "bk-1"]).unwrap();
        match args.command {
            Command::Buildkit {
                command: VmSubcommand::Logs { hostname, lines },
            } => {
                assert_eq!(hostname, "bk-1");
                assert_eq!(lines, 50);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

// CLI command definitions

use super::k8s::{
    DeleteCommand, DeployCommand, ListCommand, RenderCommand, StatusCommand, UpdateCommand,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "redis-cluster-kube",
    version,
    about = "Kubernetes manifests for password protected Redis clusters",
    long_about = "Renders and deploys replicated, password protected Redis clusters (Bitnami redis-cluster) on Kubernetes"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Print the manifests of a Redis cluster as YAML or JSON
    Render(RenderCommand),

    /// Deploy a new Redis cluster to Kubernetes (creates all resources)
    Deploy(DeployCommand),

    /// Re-apply the manifests of an existing Redis cluster
    Update(UpdateCommand),

    /// List Redis clusters
    List(ListCommand),

    /// Show cluster status
    Status(StatusCommand),

    /// Delete a cluster
    Delete(DeleteCommand),
}

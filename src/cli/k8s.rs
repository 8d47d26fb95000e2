//! Kubernetes deployment commands

use crate::cli::display::TableRenderer;
use crate::domain::config::{
    apply_to_cluster_config, parse_dynamic_configs, validate_instance_name, ClusterConfig,
};
use crate::infrastructure::constants::DEFAULT_NAMESPACE;
use crate::infrastructure::kubernetes::resources::{build, ResourceSet};
use crate::RedisClusterDescriptor;
use anyhow::Context;
use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;

/// Options that shape the manifests. Shared by `render`, `deploy` and `update`.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Instance name; prefixes every object and must be a valid DNS label
    #[arg(long, short = 'c')]
    pub name: String,

    /// Kubernetes namespace (overrides the config file)
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Cluster configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[arg(long)]
    pub replicas: Option<u32>,

    /// Redis cluster image
    #[arg(long)]
    pub image: Option<String>,

    /// Volume size of every replica (e.g. "10Gi")
    #[arg(long)]
    pub volume_size: Option<String>,

    /// EBS volume type (gp2, gp3, io1 ...)
    #[arg(long)]
    pub volume_type: Option<String>,

    #[arg(long)]
    pub volume_iops_per_gb: Option<String>,

    #[arg(long)]
    pub volume_fs_type: Option<String>,

    /// Base64 encoded password
    #[arg(long)]
    pub password: Option<String>,

    /// Append-only file ("yes" or "no")
    #[arg(long)]
    pub enable_aof: Option<String>,

    /// Addresses announced by the nodes, one per replica in ordinal order
    #[arg(long, value_delimiter = ',')]
    pub announce_ips: Vec<String>,

    /// Announce the pod IP as replica address
    #[arg(long)]
    pub announce_replica_ip: bool,

    /// Inject the Kuma sidecar into the given mesh
    #[arg(long, value_name = "MESH")]
    pub kuma_mesh: Option<String>,

    /// Extra redis.conf line (repeatable)
    #[arg(long = "redis-config", value_name = "LINE")]
    pub redis_config: Vec<String>,

    /// Dynamic configuration properties to override any settings (-D key=value)
    ///
    /// Basic: redis.namespace, redis.replicas, redis.image, redis.password, redis.aof
    /// Volume: redis.volume.size, redis.volume.type, redis.volume.iops-per-gb, redis.volume.fs-type
    /// Resources: redis.cpu, redis.memory (request and limit)
    /// Scheduling: redis.node-selector (format: key1=val1,key2=val2)
    /// Network: redis.announce-ips (comma-separated), redis.announce-replica-ip, redis.kuma.mesh
    /// Config lines: redis.config.<n> (appended in order of n)
    ///
    /// Example: -Dredis.cpu=0.5 -Dredis.config.0="maxmemory 1gb"
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

impl BuildArgs {
    /// Config file, then flags, then `-D` properties.
    pub fn cluster_config(&self) -> anyhow::Result<ClusterConfig> {
        let mut config = match self.config_file {
            Some(ref path) => {
                info!("Loading cluster configuration from {}", path.display());
                ClusterConfig::from_file(path)?
            }
            None => ClusterConfig::default(),
        };

        self.apply_flags(&mut config);

        if !self.properties.is_empty() {
            let dynamic_configs = parse_dynamic_configs(&self.properties)
                .map_err(|e| anyhow::anyhow!("Failed to parse dynamic configs: {}", e))?;
            apply_to_cluster_config(&dynamic_configs, &mut config);
        }

        Ok(config)
    }

    fn apply_flags(&self, config: &mut ClusterConfig) {
        fn set<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        set(&mut config.namespace, &self.namespace);
        set(&mut config.replicas, &self.replicas);
        set(&mut config.redis_image, &self.image);
        set(&mut config.volume_size, &self.volume_size);
        set(&mut config.volume_type, &self.volume_type);
        set(&mut config.volume_iops_per_gb, &self.volume_iops_per_gb);
        set(&mut config.volume_fs_type, &self.volume_fs_type);
        set(&mut config.redis_password, &self.password);
        set(&mut config.enable_aof, &self.enable_aof);

        if !self.announce_ips.is_empty() {
            config.announce_ips = Some(self.announce_ips.clone());
        }
        if self.announce_replica_ip {
            config.announce_replica_ip = Some(true);
        }
        if let Some(ref mesh) = self.kuma_mesh {
            config.kuma_mesh = Some(true);
            config.kuma_mesh_name = Some(mesh.clone());
        }
        if !self.redis_config.is_empty() {
            config
                .redis_config
                .get_or_insert_with(Vec::new)
                .extend(self.redis_config.iter().cloned());
        }
    }

    pub fn build_resources(&self) -> anyhow::Result<ResourceSet> {
        validate_instance_name(&self.name)?;
        let config = self.cluster_config()?;
        build(&config, &self.name)
            .with_context(|| format!("Failed to build manifests for '{}'", self.name))
    }
}

/// Cluster access options
#[derive(Args, Debug, Clone, Default)]
pub struct KubeArgs {
    /// Path to kubeconfig file
    /// If not specified, uses default kubeconfig resolution (KUBECONFIG env or ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    /// If not specified, uses current context from kubeconfig
    #[arg(long)]
    pub context: Option<String>,
}

impl KubeArgs {
    async fn descriptor(&self, namespace: String) -> anyhow::Result<RedisClusterDescriptor> {
        RedisClusterDescriptor::new_with_config(
            namespace,
            self.kubeconfig.clone(),
            self.context.clone(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create cluster descriptor: {}", e))
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Parser, Debug, Clone)]
pub struct RenderCommand {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Write to a file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug, Clone)]
pub struct DeployCommand {
    #[command(flatten)]
    pub build: BuildArgs,

    #[command(flatten)]
    pub kube: KubeArgs,

    /// Return once the objects are applied instead of waiting for readiness
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct UpdateCommand {
    #[command(flatten)]
    pub build: BuildArgs,

    #[command(flatten)]
    pub kube: KubeArgs,
}

#[derive(Parser, Debug)]
pub struct ListCommand {
    /// Namespace to search (repeatable)
    #[arg(long, short = 'n')]
    pub namespace: Vec<String>,

    #[command(flatten)]
    pub kube: KubeArgs,
}

#[derive(Parser, Debug)]
pub struct StatusCommand {
    /// Instance name
    #[arg(long, short = 'c')]
    pub name: String,

    /// Kubernetes namespace
    #[arg(long, short = 'n', default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    #[command(flatten)]
    pub kube: KubeArgs,
}

#[derive(Parser, Debug)]
pub struct DeleteCommand {
    /// Instance name
    #[arg(long, short = 'c')]
    pub name: String,

    /// Kubernetes namespace
    #[arg(long, short = 'n', default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Delete PVCs (persistent volumes)
    #[arg(long)]
    pub delete_pvcs: bool,

    #[command(flatten)]
    pub kube: KubeArgs,
}

impl RenderCommand {
    pub fn render(&self) -> anyhow::Result<String> {
        let resources = self.build.build_resources()?;
        let rendered = match self.format {
            OutputFormat::Yaml => resources.to_yaml()?,
            OutputFormat::Json => resources.to_json()?,
        };
        Ok(rendered)
    }

    pub async fn execute(&self) -> anyhow::Result<()> {
        let rendered = self.render()?;

        match self.output {
            Some(ref path) => {
                std::fs::write(path, rendered)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("✓ Manifests written to {}", path.display());
            }
            None => print!("{}", rendered),
        }
        Ok(())
    }
}

impl DeployCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let resources = self.build.build_resources()?;
        let descriptor = self
            .kube
            .descriptor(resources.namespace().to_string())
            .await?;

        descriptor
            .deploy_cluster(&resources, !self.no_wait)
            .await
            .map_err(|e| anyhow::anyhow!("Cluster deployment failed: {}", e))?;

        println!(
            "Cluster {} deployed successfully!",
            resources.instance_name()
        );
        Ok(())
    }
}

impl UpdateCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let resources = self.build.build_resources()?;
        let descriptor = self
            .kube
            .descriptor(resources.namespace().to_string())
            .await?;

        descriptor
            .update_cluster(&resources)
            .await
            .map_err(|e| anyhow::anyhow!("Cluster update failed: {}", e))?;

        println!("Cluster {} updated successfully!", resources.instance_name());
        Ok(())
    }
}

impl StatusCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let descriptor = self.kube.descriptor(self.namespace.clone()).await?;

        let status = descriptor
            .get_cluster_status(&self.name)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get cluster status: {}", e))?;

        println!("{}", TableRenderer::new().render_cluster_status(&status));
        Ok(())
    }
}

impl DeleteCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let descriptor = self.kube.descriptor(self.namespace.clone()).await?;

        let deleted = descriptor
            .delete_cluster(&self.name, self.delete_pvcs)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete cluster: {}", e))?;

        for object in &deleted {
            println!("✓ {} deleted", object);
        }
        println!("Cluster {} deleted successfully!", self.name);
        Ok(())
    }
}

impl ListCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let namespaces = if self.namespace.is_empty() {
            vec![DEFAULT_NAMESPACE.to_string()]
        } else {
            self.namespace.clone()
        };

        let mut all_clusters = Vec::new();
        for namespace in &namespaces {
            let descriptor = self.kube.descriptor(namespace.clone()).await?;
            match descriptor.list_clusters().await {
                Ok(clusters) => all_clusters.extend(clusters),
                Err(e) => tracing::warn!("Skipping namespace {}: {}", namespace, e),
            }
        }

        if all_clusters.is_empty() {
            println!(
                "No Redis clusters found in namespace(s): {}",
                namespaces.join(", ")
            );
            return Ok(());
        }

        println!("{}", TableRenderer::new().render_clusters_list(&all_clusters));
        Ok(())
    }
}

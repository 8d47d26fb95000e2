// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::client::{RedisKubeClient, RedisKubeClientImpl};
use crate::infrastructure::kubernetes::resources::ResourceSet;
use crate::shared::error::KubeError;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const APPLY_MAX_RETRIES: usize = 3;
const POD_RESTART_LIMIT: i32 = 5;
const FAILING_WAIT_REASONS: &[&str] = &["CrashLoopBackOff", "ImagePullBackOff", "ErrImagePull"];

pub struct RedisClusterDescriptor {
    client: Box<dyn RedisKubeClient>,
    namespace: String,
    retry: ExponentialBuilder,
}

impl RedisClusterDescriptor {
    pub async fn new(namespace: String) -> Result<Self, KubeError> {
        let client = RedisKubeClientImpl::new(namespace.clone()).await?;
        Ok(Self::with_client(Box::new(client)))
    }

    pub async fn new_with_config(
        namespace: String,
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self, KubeError> {
        let client =
            RedisKubeClientImpl::new_with_config(namespace, kubeconfig_path, context).await?;
        Ok(Self::with_client(Box::new(client)))
    }

    pub fn with_client(client: Box<dyn RedisKubeClient>) -> Self {
        Self {
            namespace: client.namespace().to_string(),
            client,
            retry: ExponentialBuilder::default().with_max_times(APPLY_MAX_RETRIES),
        }
    }

    /// Replace the backoff used for transient API failures.
    pub fn with_retry(mut self, retry: ExponentialBuilder) -> Self {
        self.retry = retry;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub async fn deploy_cluster(
        &self,
        resources: &ResourceSet,
        wait_ready: bool,
    ) -> Result<(), KubeError> {
        let name = resources.instance_name();

        let exists = match self.client.get_statefulset(name).await {
            Ok(_) => true,
            Err(KubeError::NotFound { .. }) => false,
            Err(e) => return Err(e),
        };

        if exists {
            return Err(KubeError::already_exists(
                "StatefulSet",
                name,
                &self.namespace,
            ));
        }

        info!("Deploying Redis cluster '{}' to '{}'", name, self.namespace);
        println!("Creating new cluster resources...");
        self.apply_resource_set(resources).await?;

        if wait_ready {
            println!("\nWaiting for cluster to be ready...");
            self.wait_for_cluster_ready(name).await?;
            println!("✓ Cluster is ready!");
        }

        Ok(())
    }

    pub async fn update_cluster(&self, resources: &ResourceSet) -> Result<(), KubeError> {
        let name = resources.instance_name();

        // Surfaces NotFound when there is nothing to update
        self.client.get_statefulset(name).await?;

        info!("Updating Redis cluster '{}' in '{}'", name, self.namespace);
        println!("Updating existing cluster resources...");
        self.apply_resource_set(resources).await?;

        println!("\n✓ Cluster resources updated successfully.");
        println!(
            "  Use 'kubectl get pods -n {} -l {}={}' to check pod status.",
            self.namespace, LABEL_APP, name
        );
        Ok(())
    }

    /// Applies in dependency order: the StatefulSet comes last so that its
    /// StorageClass, Secret, ConfigMaps and governing Service already exist.
    pub async fn apply_resource_set(&self, resources: &ResourceSet) -> Result<(), KubeError> {
        self.retrying("StorageClass", || {
            self.client.apply_storage_class(&resources.storage_class)
        })
        .await?;
        println!("✓ StorageClass applied");

        self.retrying("Secret", || self.client.apply_secret(&resources.secret))
            .await?;
        println!("✓ Secret applied");

        self.retrying("ConfigMap", || {
            self.client.apply_configmap(&resources.default_config)
        })
        .await?;
        self.retrying("ConfigMap", || self.client.apply_configmap(&resources.scripts))
            .await?;
        println!("✓ ConfigMaps applied");

        self.retrying("Service", || {
            self.client.apply_service(&resources.headless_service)
        })
        .await?;
        println!("✓ Headless Service applied");

        self.retrying("Service", || self.client.apply_service(&resources.service))
            .await?;
        println!("✓ Service applied");

        self.retrying("StatefulSet", || {
            self.client.apply_statefulset(&resources.statefulset)
        })
        .await?;
        println!("✓ StatefulSet applied");

        Ok(())
    }

    async fn retrying<F, Fut>(&self, kind: &str, op: F) -> Result<(), KubeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), KubeError>>,
    {
        op.retry(&self.retry)
            .sleep(sleep)
            .when(KubeError::is_transient)
            .notify(|e, delay| {
                warn!("Applying {} failed, retrying in {:?}: {}", kind, delay, e)
            })
            .await
    }

    pub async fn wait_for_cluster_ready(&self, instance_name: &str) -> Result<(), KubeError> {
        const MAX_WAIT_SECONDS: u64 = 300;
        const CHECK_INTERVAL_SECONDS: u64 = 5;
        const FAILURE_DETECTION_WAIT: u64 = 30;

        let mut waited = 0;
        let mut last_ready = 0;
        let mut desired = 0;

        while waited < MAX_WAIT_SECONDS {
            if waited >= FAILURE_DETECTION_WAIT {
                let mut labels = HashMap::new();
                labels.insert(LABEL_APP.to_string(), instance_name.to_string());

                if let Ok(pods) = self.client.get_pods_with_labels(&labels).await {
                    if let Some(failure) = detect_pod_failure(&pods, &self.namespace) {
                        return Err(KubeError::ValidationError(failure));
                    }
                }
            }

            if let Ok(ss) = self.client.get_statefulset(instance_name).await {
                desired = ss.spec.as_ref().and_then(|s| s.replicas).unwrap_or(0);
                last_ready = ss
                    .status
                    .as_ref()
                    .and_then(|s| s.ready_replicas)
                    .unwrap_or(0);
                debug!("{}: {}/{} replicas ready", instance_name, last_ready, desired);

                if desired > 0 && last_ready == desired {
                    return Ok(());
                }
            }

            sleep(Duration::from_secs(CHECK_INTERVAL_SECONDS)).await;
            waited += CHECK_INTERVAL_SECONDS;
        }

        Err(KubeError::Timeout(format!(
            "Redis cluster {} did not become ready within {} seconds (ready: {}/{})",
            instance_name, MAX_WAIT_SECONDS, last_ready, desired
        )))
    }

    pub async fn get_cluster_status(&self, instance_name: &str) -> Result<ClusterStatus, KubeError> {
        let mut status = ClusterStatus {
            instance_name: instance_name.to_string(),
            namespace: self.namespace.clone(),
            statefulset: None,
            services: Vec::new(),
            configmaps: Vec::new(),
        };

        match self.client.get_statefulset(instance_name).await {
            Ok(ss) => {
                status.statefulset = Some(StatefulSetStatus {
                    name: ss.metadata.name.clone().unwrap_or_default(),
                    replicas: ss.spec.as_ref().and_then(|s| s.replicas).unwrap_or(0) as u32,
                    ready_replicas: ss
                        .status
                        .as_ref()
                        .and_then(|s| s.ready_replicas)
                        .unwrap_or(0) as u32,
                    created: ss.metadata.creation_timestamp.as_ref().map(|t| t.0),
                });
            }
            Err(KubeError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        for name in [
            format!("{}{}", instance_name, SERVICE_SUFFIX_HEADLESS),
            instance_name.to_string(),
        ] {
            match self.client.get_service(&name).await {
                Ok(svc) => status.services.push(ServiceStatus {
                    name,
                    cluster_ip: svc.spec.as_ref().and_then(|s| s.cluster_ip.clone()),
                }),
                Err(KubeError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        for name in [
            format!("{}{}", instance_name, CONFIGMAP_SUFFIX_DEFAULT),
            format!("{}{}", instance_name, CONFIGMAP_SUFFIX_SCRIPTS),
        ] {
            match self.client.get_configmap(&name).await {
                Ok(_) => status.configmaps.push(ConfigMapStatus { name }),
                Err(KubeError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        if status.is_empty() {
            return Err(KubeError::not_found(
                "Redis cluster",
                instance_name,
                &self.namespace,
            ));
        }

        Ok(status)
    }

    /// Instances are found through their scripts ConfigMap.
    pub async fn list_clusters(&self) -> Result<Vec<ClusterInfo>, KubeError> {
        let configmaps = self.client.list_configmaps(LABEL_APP).await?;

        let mut clusters = Vec::new();
        for cm in configmaps {
            let Some(name) = cm.metadata.name else {
                continue;
            };
            let Some(instance_name) = name.strip_suffix(CONFIGMAP_SUFFIX_SCRIPTS) else {
                continue;
            };

            let ss = self.client.get_statefulset(instance_name).await.ok();

            let replicas = ss
                .as_ref()
                .and_then(|ss| ss.spec.as_ref())
                .and_then(|spec| spec.replicas)
                .unwrap_or(0);
            let ready = ss
                .as_ref()
                .and_then(|ss| ss.status.as_ref())
                .and_then(|status| status.ready_replicas)
                .unwrap_or(0);
            let created = ss
                .as_ref()
                .and_then(|ss| ss.metadata.creation_timestamp.as_ref())
                .map(|t| t.0);

            clusters.push(ClusterInfo {
                instance_name: instance_name.to_string(),
                namespace: self.namespace.clone(),
                replicas: replicas as u32,
                ready: ready as u32,
                created,
            });
        }

        Ok(clusters)
    }

    /// Deletes every object of the instance and returns what was removed.
    /// Claims are kept unless `delete_pvcs` is set.
    pub async fn delete_cluster(
        &self,
        instance_name: &str,
        delete_pvcs: bool,
    ) -> Result<Vec<String>, KubeError> {
        let name = instance_name.to_string();
        let headless = format!("{}{}", instance_name, SERVICE_SUFFIX_HEADLESS);
        let default_cm = format!("{}{}", instance_name, CONFIGMAP_SUFFIX_DEFAULT);
        let scripts_cm = format!("{}{}", instance_name, CONFIGMAP_SUFFIX_SCRIPTS);

        let mut deleted = Vec::new();
        let mut record = |kind: &str, name: &str, result: Result<(), KubeError>| match result {
            Ok(()) => {
                deleted.push(format!("{}/{}", kind, name));
                Ok(())
            }
            Err(KubeError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        };

        record("StatefulSet", &name, self.client.delete_statefulset(&name).await)?;
        record("Service", &headless, self.client.delete_service(&headless).await)?;
        record("Service", &name, self.client.delete_service(&name).await)?;
        record("ConfigMap", &default_cm, self.client.delete_configmap(&default_cm).await)?;
        record("ConfigMap", &scripts_cm, self.client.delete_configmap(&scripts_cm).await)?;
        record("Secret", &name, self.client.delete_secret(&name).await)?;
        record("StorageClass", &name, self.client.delete_storage_class(&name).await)?;

        if deleted.is_empty() {
            return Err(KubeError::not_found(
                "Redis cluster",
                instance_name,
                &self.namespace,
            ));
        }

        if delete_pvcs {
            let count = self.client.delete_pvcs_for_instance(instance_name).await?;
            info!("Deleted {} PersistentVolumeClaims of '{}'", count, instance_name);
            deleted.push(format!("PersistentVolumeClaim x{}", count));
        }

        Ok(deleted)
    }
}

/// First pod-level failure that will not resolve by waiting longer.
pub fn detect_pod_failure(pods: &[Pod], namespace: &str) -> Option<String> {
    for pod in pods {
        let pod_name = pod.metadata.name.as_deref().unwrap_or("unknown");
        let Some(status) = &pod.status else {
            continue;
        };

        for cs in status.container_statuses.iter().flatten() {
            let reason = cs
                .state
                .as_ref()
                .and_then(|s| s.waiting.as_ref())
                .and_then(|w| w.reason.as_deref());
            if let Some(reason) = reason.filter(|r| FAILING_WAIT_REASONS.contains(r)) {
                return Some(format!(
                    "Pod {} is in {} state. Check pod logs: kubectl logs -n {} {}",
                    pod_name, reason, namespace, pod_name
                ));
            }

            if cs.restart_count > POD_RESTART_LIMIT {
                return Some(format!(
                    "Pod {} has restarted {} times, indicating a persistent failure. Check pod logs: kubectl logs -n {} {}",
                    pod_name, cs.restart_count, namespace, pod_name
                ));
            }
        }

        if status.phase.as_deref() == Some("Failed") {
            return Some(format!(
                "Pod {} is in Failed state. Check pod events: kubectl describe pod -n {} {}",
                pod_name, namespace, pod_name
            ));
        }
    }
    None
}

#[derive(Debug, Clone)]
pub struct ClusterInfo {
    pub instance_name: String,
    pub namespace: String,
    pub replicas: u32,
    pub ready: u32,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ClusterStatus {
    pub instance_name: String,
    pub namespace: String,
    pub statefulset: Option<StatefulSetStatus>,
    pub services: Vec<ServiceStatus>,
    pub configmaps: Vec<ConfigMapStatus>,
}

impl ClusterStatus {
    pub fn is_empty(&self) -> bool {
        self.statefulset.is_none() && self.services.is_empty() && self.configmaps.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StatefulSetStatus {
    pub name: String,
    pub replicas: u32,
    pub ready_replicas: u32,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub name: String,
    pub cluster_ip: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigMapStatus {
    pub name: String,
}

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

use crate::infrastructure::constants::{FIELD_MANAGER, LABEL_APP};
use crate::shared::error::KubeError;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Secret, Service};
use k8s_openapi::api::storage::v1::StorageClass;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::debug;

#[async_trait::async_trait]
pub trait RedisKubeClient: Send + Sync {
    fn namespace(&self) -> &str;

    async fn apply_storage_class(&self, storage_class: &StorageClass) -> Result<(), KubeError>;

    async fn apply_secret(&self, secret: &Secret) -> Result<(), KubeError>;

    async fn apply_configmap(&self, configmap: &ConfigMap) -> Result<(), KubeError>;

    async fn apply_service(&self, service: &Service) -> Result<(), KubeError>;

    async fn apply_statefulset(&self, statefulset: &StatefulSet) -> Result<(), KubeError>;

    async fn get_statefulset(&self, name: &str) -> Result<StatefulSet, KubeError>;

    async fn get_service(&self, name: &str) -> Result<Service, KubeError>;

    async fn get_configmap(&self, name: &str) -> Result<ConfigMap, KubeError>;

    async fn list_configmaps(&self, label_selector: &str) -> Result<Vec<ConfigMap>, KubeError>;

    async fn get_pods_with_labels(
        &self,
        labels: &HashMap<String, String>,
    ) -> Result<Vec<Pod>, KubeError>;

    async fn delete_statefulset(&self, name: &str) -> Result<(), KubeError>;

    async fn delete_service(&self, name: &str) -> Result<(), KubeError>;

    async fn delete_configmap(&self, name: &str) -> Result<(), KubeError>;

    async fn delete_secret(&self, name: &str) -> Result<(), KubeError>;

    async fn delete_storage_class(&self, name: &str) -> Result<(), KubeError>;

    /// Deletes the claims created from the StatefulSet's claim template.
    /// Returns how many were deleted.
    async fn delete_pvcs_for_instance(&self, instance_name: &str) -> Result<usize, KubeError>;
}

pub struct RedisKubeClientImpl {
    client: Client,
    namespace: String,
}

impl RedisKubeClientImpl {
    pub async fn new(namespace: String) -> Result<Self, KubeError> {
        let client = Client::try_default().await.map_err(|e| {
            KubeError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client, namespace })
    }

    pub async fn new_with_config(
        namespace: String,
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self, KubeError> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        let kubeconfig = match kubeconfig_path {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        }
        .map_err(|e| KubeError::KubeError(format!("Failed to load kubeconfig: {}", e)))?;

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                KubeError::KubeError(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            KubeError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client, namespace })
    }

    fn namespaced<K>(&self) -> Api<K>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn not_found_or(&self, err: kube::Error, kind: &str, name: &str) -> KubeError {
        match err {
            kube::Error::Api(ae) if ae.code == 404 => {
                KubeError::not_found(kind, name, &self.namespace)
            }
            kube::Error::Api(ae) => KubeError::KubeError(ae.message),
            e => KubeError::KubeError(e.to_string()),
        }
    }

    async fn get_resource<K>(&self, api: &Api<K>, kind: &str, name: &str) -> Result<K, KubeError>
    where
        K: Resource + Clone + DeserializeOwned + Debug,
    {
        api.get(name)
            .await
            .map_err(|e| self.not_found_or(e, kind, name))
    }

    async fn delete_resource<K>(
        &self,
        api: &Api<K>,
        kind: &str,
        name: &str,
    ) -> Result<(), KubeError>
    where
        K: Resource + Clone + DeserializeOwned + Debug,
    {
        api.delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| self.not_found_or(e, kind, name))
    }
}

/// Server-side apply when the object exists, plain create otherwise.
async fn apply_resource<K>(api: &Api<K>, resource: &K, kind: &str) -> Result<(), KubeError>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
{
    let name = resource
        .meta()
        .name
        .as_deref()
        .ok_or_else(|| KubeError::ConfigError(format!("{} name is required", kind)))?;

    match api.get(name).await {
        Ok(_) => {
            debug!("Patching {} '{}'", kind, name);
            let patch_params = PatchParams::apply(FIELD_MANAGER).force();
            let patch = serde_json::to_value(resource).map_err(|e| {
                KubeError::KubeError(format!("Failed to serialize {}: {}", kind, e))
            })?;
            api.patch(name, &patch_params, &Patch::Apply(patch)).await?;
        }
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            debug!("Creating {} '{}'", kind, name);
            api.create(&PostParams::default(), resource).await?;
        }
        Err(e) => return Err(KubeError::KubeError(e.to_string())),
    }
    Ok(())
}

/// Claim templates of a StatefulSet are immutable; reject an update that
/// would change them instead of letting the API server fail the patch.
pub fn check_claim_templates_unchanged(
    existing: &StatefulSet,
    desired: &StatefulSet,
) -> Result<(), KubeError> {
    let existing = existing
        .spec
        .as_ref()
        .and_then(|s| s.volume_claim_templates.as_ref());
    let desired = desired
        .spec
        .as_ref()
        .and_then(|s| s.volume_claim_templates.as_ref());

    let (Some(existing), Some(desired)) = (existing, desired) else {
        return Ok(());
    };

    let immutable = |idx: usize, what: &str| {
        KubeError::ConfigError(format!(
            "StatefulSet volumeClaimTemplate[{}] {} cannot be changed. Please delete and recreate the instance.",
            idx, what
        ))
    };

    if existing.len() != desired.len() {
        return Err(KubeError::ConfigError(
            "StatefulSet volumeClaimTemplates count cannot be changed. Please delete and recreate the instance.".to_string(),
        ));
    }

    for (idx, (ex_pvc, new_pvc)) in existing.iter().zip(desired.iter()).enumerate() {
        if ex_pvc.metadata.name != new_pvc.metadata.name {
            return Err(immutable(idx, "name"));
        }

        let (Some(ex_spec), Some(new_spec)) = (&ex_pvc.spec, &new_pvc.spec) else {
            continue;
        };

        if ex_spec.storage_class_name != new_spec.storage_class_name {
            return Err(immutable(idx, "storageClassName"));
        }

        if ex_spec.access_modes != new_spec.access_modes {
            return Err(immutable(idx, "accessModes"));
        }

        let storage = |spec: &k8s_openapi::api::core::v1::PersistentVolumeClaimSpec| {
            spec.resources
                .as_ref()
                .and_then(|r| r.requests.as_ref())
                .and_then(|r| r.get("storage").cloned())
        };
        if storage(ex_spec) != storage(new_spec) {
            return Err(immutable(idx, "storage size"));
        }
    }

    Ok(())
}

#[async_trait::async_trait]
impl RedisKubeClient for RedisKubeClientImpl {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn apply_storage_class(&self, storage_class: &StorageClass) -> Result<(), KubeError> {
        let api: Api<StorageClass> = Api::all(self.client.clone());
        apply_resource(&api, storage_class, "StorageClass").await
    }

    async fn apply_secret(&self, secret: &Secret) -> Result<(), KubeError> {
        apply_resource(&self.namespaced(), secret, "Secret").await
    }

    async fn apply_configmap(&self, configmap: &ConfigMap) -> Result<(), KubeError> {
        apply_resource(&self.namespaced(), configmap, "ConfigMap").await
    }

    async fn apply_service(&self, service: &Service) -> Result<(), KubeError> {
        let api: Api<Service> = self.namespaced();
        let mut service = service.clone();

        // The allocated cluster IP cannot be changed by a patch
        if let Some(name) = service.metadata.name.clone() {
            if let Ok(existing) = api.get(&name).await {
                if let (Some(existing_spec), Some(new_spec)) =
                    (&existing.spec, service.spec.as_mut())
                {
                    new_spec.cluster_ip = existing_spec.cluster_ip.clone();
                    new_spec.cluster_ips = existing_spec.cluster_ips.clone();
                }
            }
        }

        apply_resource(&api, &service, "Service").await
    }

    async fn apply_statefulset(&self, statefulset: &StatefulSet) -> Result<(), KubeError> {
        let api: Api<StatefulSet> = self.namespaced();

        if let Some(name) = statefulset.metadata.name.as_deref() {
            if let Ok(existing) = api.get(name).await {
                check_claim_templates_unchanged(&existing, statefulset)?;
            }
        }

        apply_resource(&api, statefulset, "StatefulSet").await
    }

    async fn get_statefulset(&self, name: &str) -> Result<StatefulSet, KubeError> {
        self.get_resource(&self.namespaced(), "StatefulSet", name)
            .await
    }

    async fn get_service(&self, name: &str) -> Result<Service, KubeError> {
        self.get_resource(&self.namespaced(), "Service", name).await
    }

    async fn get_configmap(&self, name: &str) -> Result<ConfigMap, KubeError> {
        self.get_resource(&self.namespaced(), "ConfigMap", name)
            .await
    }

    async fn list_configmaps(&self, label_selector: &str) -> Result<Vec<ConfigMap>, KubeError> {
        let api: Api<ConfigMap> = self.namespaced();
        let list_params = ListParams::default().labels(label_selector);

        api.list(&list_params)
            .await
            .map(|list| list.items)
            .map_err(|e| KubeError::KubeError(e.to_string()))
    }

    async fn get_pods_with_labels(
        &self,
        labels: &HashMap<String, String>,
    ) -> Result<Vec<Pod>, KubeError> {
        let api: Api<Pod> = self.namespaced();
        let label_selector = labels
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");

        let lp = ListParams::default().labels(&label_selector);

        let pods = api.list(&lp).await?;
        Ok(pods.items)
    }

    async fn delete_statefulset(&self, name: &str) -> Result<(), KubeError> {
        self.delete_resource::<StatefulSet>(&self.namespaced(), "StatefulSet", name)
            .await
    }

    async fn delete_service(&self, name: &str) -> Result<(), KubeError> {
        self.delete_resource::<Service>(&self.namespaced(), "Service", name)
            .await
    }

    async fn delete_configmap(&self, name: &str) -> Result<(), KubeError> {
        self.delete_resource::<ConfigMap>(&self.namespaced(), "ConfigMap", name)
            .await
    }

    async fn delete_secret(&self, name: &str) -> Result<(), KubeError> {
        self.delete_resource::<Secret>(&self.namespaced(), "Secret", name)
            .await
    }

    async fn delete_storage_class(&self, name: &str) -> Result<(), KubeError> {
        let api: Api<StorageClass> = Api::all(self.client.clone());
        self.delete_resource(&api, "StorageClass", name).await
    }

    async fn delete_pvcs_for_instance(&self, instance_name: &str) -> Result<usize, KubeError> {
        let api: Api<PersistentVolumeClaim> = self.namespaced();
        let dp = DeleteParams::default();

        let lp = ListParams::default().labels(&format!("{}={}", LABEL_APP, instance_name));

        let pvcs = api.list(&lp).await?;

        let mut deleted = 0;
        for pvc in pvcs.items {
            if let Some(name) = pvc.metadata.name.as_ref() {
                api.delete(name, &dp).await?;
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}

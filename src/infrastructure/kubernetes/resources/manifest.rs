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

//! Manifest assembly
//!
//! `build` turns a `ClusterConfig` into the full set of objects of one Redis
//! instance. Nothing here talks to a cluster.

use crate::domain::config::ClusterConfig;
use crate::infrastructure::kubernetes::resources::{
    ConfigMapBuilder, HeadlessServiceBuilder, SecretBuilder, ServiceBuilder, StatefulSetBuilder,
    StorageClassBuilder,
};
use crate::shared::error::{KubeError, Result};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service};
use k8s_openapi::api::storage::v1::StorageClass;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::debug;

/// Every object of one Redis instance.
#[derive(Debug, Clone)]
pub struct ResourceSet {
    pub storage_class: StorageClass,
    pub secret: Secret,
    pub default_config: ConfigMap,
    pub scripts: ConfigMap,
    pub headless_service: Service,
    pub service: Service,
    pub statefulset: StatefulSet,
}

impl ResourceSet {
    pub fn instance_name(&self) -> &str {
        self.statefulset.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.statefulset
            .metadata
            .namespace
            .as_deref()
            .unwrap_or_default()
    }

    /// Objects in apply order, each carrying `apiVersion` and `kind`.
    pub fn objects(&self) -> Result<Vec<Value>> {
        Ok(vec![
            serde_json::to_value(&self.storage_class)?,
            serde_json::to_value(&self.secret)?,
            serde_json::to_value(&self.default_config)?,
            serde_json::to_value(&self.scripts)?,
            serde_json::to_value(&self.headless_service)?,
            serde_json::to_value(&self.service)?,
            serde_json::to_value(&self.statefulset)?,
        ])
    }

    /// Multi-document YAML, one document per object.
    pub fn to_yaml(&self) -> Result<String> {
        let docs = self
            .objects()?
            .iter()
            .map(serde_yaml::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(docs.join("---\n"))
    }

    /// A `v1` `List` holding every object.
    pub fn to_json(&self) -> Result<String> {
        let list = json!({
            "apiVersion": "v1",
            "kind": "List",
            "items": self.objects()?,
        });
        Ok(serde_json::to_string_pretty(&list)?)
    }

    /// References from the StatefulSet that do not resolve to an object in
    /// this set, formatted as `Kind/name`.
    pub fn dangling_references(&self) -> Vec<String> {
        let mut dangling = Vec::new();

        let services: BTreeSet<&str> = [&self.headless_service, &self.service]
            .iter()
            .filter_map(|s| s.metadata.name.as_deref())
            .collect();
        let config_maps: BTreeSet<&str> = [&self.default_config, &self.scripts]
            .iter()
            .filter_map(|c| c.metadata.name.as_deref())
            .collect();
        let secret_name = self.secret.metadata.name.as_deref();
        let secret_keys: BTreeSet<&str> = self
            .secret
            .data
            .iter()
            .flat_map(|d| d.keys().map(String::as_str))
            .collect();
        let storage_class = self.storage_class.metadata.name.as_deref();

        let Some(spec) = self.statefulset.spec.as_ref() else {
            return dangling;
        };

        if !services.contains(spec.service_name.as_str()) {
            dangling.push(format!("Service/{}", spec.service_name));
        }

        if let Some(pod) = spec.template.spec.as_ref() {
            for volume in pod.volumes.iter().flatten() {
                if let Some(cm) = volume.config_map.as_ref() {
                    if !config_maps.contains(cm.name.as_str()) {
                        dangling.push(format!("ConfigMap/{}", cm.name));
                    }
                }
            }

            let env = pod
                .containers
                .iter()
                .flat_map(|c| c.env.iter().flatten());
            for var in env {
                let Some(selector) = var
                    .value_from
                    .as_ref()
                    .and_then(|v| v.secret_key_ref.as_ref())
                else {
                    continue;
                };
                if secret_name != Some(selector.name.as_str()) {
                    dangling.push(format!("Secret/{}", selector.name));
                } else if !secret_keys.contains(selector.key.as_str()) {
                    dangling.push(format!("Secret/{}[{}]", selector.name, selector.key));
                }
            }
        }

        for claim in spec.volume_claim_templates.iter().flatten() {
            let class = claim
                .spec
                .as_ref()
                .and_then(|s| s.storage_class_name.as_deref());
            if let Some(class) = class {
                if storage_class != Some(class) {
                    dangling.push(format!("StorageClass/{}", class));
                }
            }
        }

        dangling
    }
}

pub struct ManifestBuilder {
    instance_name: String,
    config: ClusterConfig,
}

impl ManifestBuilder {
    pub fn new(instance_name: String, config: ClusterConfig) -> Self {
        Self {
            instance_name,
            config,
        }
    }

    pub fn build(&self) -> Result<ResourceSet> {
        let resolved = self.config.resolve()?;
        let name = self.instance_name.clone();
        let namespace = resolved.namespace.clone();

        debug!(
            "Building manifests for '{}' in namespace '{}' ({} replicas)",
            name, namespace, resolved.replicas
        );

        let config_maps =
            ConfigMapBuilder::new(name.clone(), namespace.clone(), resolved.redis_config.clone());

        let resources = ResourceSet {
            storage_class: StorageClassBuilder::new(
                name.clone(),
                resolved.volume_type.clone(),
                resolved.volume_iops_per_gb.clone(),
                resolved.volume_fs_type.clone(),
            )
            .build()?,
            secret: SecretBuilder::new(name.clone(), namespace.clone(), resolved.password.clone())
                .build()?,
            default_config: config_maps.build_default_config()?,
            scripts: config_maps.build_scripts()?,
            headless_service: HeadlessServiceBuilder::new(name.clone(), namespace.clone())
                .build()?,
            service: ServiceBuilder::new(name.clone(), namespace).build()?,
            statefulset: StatefulSetBuilder::new(name, resolved).build()?,
        };

        let dangling = resources.dangling_references();
        if !dangling.is_empty() {
            return Err(KubeError::InvalidResource(format!(
                "unresolved references: {}",
                dangling.join(", ")
            )));
        }

        Ok(resources)
    }
}

/// Build every object of `instance_name` from `config`.
pub fn build(config: &ClusterConfig, instance_name: &str) -> Result<ResourceSet> {
    ManifestBuilder::new(instance_name.to_string(), config.clone()).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources() -> ResourceSet {
        build(&ClusterConfig::new("10Gi", "dGVzdA=="), "redis").unwrap()
    }

    #[test]
    fn test_missing_password_fails() {
        let config = ClusterConfig {
            volume_size: Some("10Gi".to_string()),
            ..Default::default()
        };
        let err = build(&config, "redis").unwrap_err();
        assert!(matches!(err, KubeError::ValidationError(_)));
        assert!(err.to_string().contains("redis_password"));
    }

    #[test]
    fn test_object_order_and_kinds() {
        let kinds: Vec<String> = resources()
            .objects()
            .unwrap()
            .iter()
            .map(|o| o["kind"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "StorageClass",
                "Secret",
                "ConfigMap",
                "ConfigMap",
                "Service",
                "Service",
                "StatefulSet"
            ]
        );
    }

    #[test]
    fn test_no_dangling_references() {
        assert!(resources().dangling_references().is_empty());
    }

    #[test]
    fn test_detects_renamed_service() {
        let mut set = resources();
        set.headless_service.metadata.name = Some("other".to_string());
        assert_eq!(set.dangling_references(), vec!["Service/redis-headless"]);
    }

    #[test]
    fn test_detects_missing_secret_key() {
        let mut set = resources();
        set.secret.data = None;
        let dangling = set.dangling_references();
        assert_eq!(dangling.len(), 2);
        assert!(dangling[0].starts_with("Secret/redis["));
    }

    #[test]
    fn test_yaml_documents() {
        let yaml = resources().to_yaml().unwrap();
        assert_eq!(yaml.matches("---\n").count(), 6);
        assert!(yaml.starts_with("apiVersion: storage.k8s.io/v1\n"));
    }

    #[test]
    fn test_json_list() {
        let json: Value = serde_json::from_str(&resources().to_json().unwrap()).unwrap();
        assert_eq!(json["kind"], "List");
        assert_eq!(json["items"].as_array().unwrap().len(), 7);
    }
}

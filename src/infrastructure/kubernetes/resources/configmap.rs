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
use crate::infrastructure::kubernetes::resources::pod::{
    LabeledResourceBuilder, LIVENESS_SCRIPT, READINESS_SCRIPT,
};
use crate::shared::error::Result;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Builds the two ConfigMaps of an instance: the seed `redis-default.conf`
/// and the probe scripts.
pub struct ConfigMapBuilder {
    instance_name: String,
    namespace: String,
    redis_config: Vec<String>,
}

impl LabeledResourceBuilder for ConfigMapBuilder {
    fn instance_name(&self) -> &str {
        &self.instance_name
    }
}

impl ConfigMapBuilder {
    pub fn new(instance_name: String, namespace: String, redis_config: Vec<String>) -> Self {
        Self {
            instance_name,
            namespace,
            redis_config,
        }
    }

    pub fn default_config_name(&self) -> String {
        format!("{}{}", self.instance_name, CONFIGMAP_SUFFIX_DEFAULT)
    }

    pub fn scripts_name(&self) -> String {
        format!("{}{}", self.instance_name, CONFIGMAP_SUFFIX_SCRIPTS)
    }

    /// Extra config lines joined by newlines, empty when there are none.
    pub fn render_default_config(&self) -> String {
        self.redis_config.join("\n")
    }

    pub fn build_default_config(&self) -> Result<ConfigMap> {
        let mut data = BTreeMap::new();
        data.insert(
            DEFAULT_CONFIG_FILE_NAME.to_string(),
            self.render_default_config(),
        );

        Ok(self.config_map(self.default_config_name(), data))
    }

    pub fn build_scripts(&self) -> Result<ConfigMap> {
        let mut data = BTreeMap::new();
        data.insert(READINESS_SCRIPT_NAME.to_string(), READINESS_SCRIPT.to_string());
        data.insert(LIVENESS_SCRIPT_NAME.to_string(), LIVENESS_SCRIPT.to_string());

        Ok(self.config_map(self.scripts_name(), data))
    }

    fn config_map(&self, name: String, data: BTreeMap<String, String>) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name),
                namespace: Some(self.namespace.clone()),
                labels: Some(self.get_labels()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(lines: &[&str]) -> ConfigMapBuilder {
        ConfigMapBuilder::new(
            "redis".to_string(),
            "default".to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        )
    }

    #[test]
    fn test_empty_default_config() {
        let cm = builder(&[]).build_default_config().unwrap();
        assert_eq!(cm.metadata.name.as_deref(), Some("redis-default"));
        assert_eq!(cm.data.unwrap()["redis-default.conf"], "");
    }

    #[test]
    fn test_default_config_lines() {
        let cm = builder(&["maxmemory 1gb", "maxmemory-policy allkeys-lru"])
            .build_default_config()
            .unwrap();
        assert_eq!(
            cm.data.unwrap()["redis-default.conf"],
            "maxmemory 1gb\nmaxmemory-policy allkeys-lru"
        );
    }

    #[test]
    fn test_scripts_config_map() {
        let cm = builder(&[]).build_scripts().unwrap();
        assert_eq!(cm.metadata.name.as_deref(), Some("redis-scripts"));

        let data = cm.data.unwrap();
        assert!(data["ping_readiness_local.sh"].contains("cluster_state:ok"));
        assert!(data["ping_liveness_local.sh"].contains("LOADING"));
    }
}

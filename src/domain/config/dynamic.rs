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

use crate::domain::config::redis::ClusterConfig;
use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

const CONFIG_LINE_PREFIX: &str = "redis.config.";

pub fn apply_to_cluster_config(configs: &HashMap<String, String>, config: &mut ClusterConfig) {
    if let Some(replicas_str) = configs.get("redis.replicas") {
        match replicas_str.parse::<u32>() {
            Ok(replicas) => config.replicas = Some(replicas),
            Err(_) => warn!(value = %replicas_str, "ignoring unparsable redis.replicas"),
        }
    }

    if let Some(image) = configs.get("redis.image") {
        config.redis_image = Some(image.clone());
    }

    if let Some(namespace) = configs.get("redis.namespace") {
        config.namespace = Some(namespace.clone());
    }

    if let Some(size) = configs.get("redis.volume.size") {
        config.volume_size = Some(size.clone());
    }

    if let Some(volume_type) = configs.get("redis.volume.type") {
        config.volume_type = Some(volume_type.clone());
    }

    if let Some(iops) = configs.get("redis.volume.iops-per-gb") {
        config.volume_iops_per_gb = Some(iops.clone());
    }

    if let Some(fs_type) = configs.get("redis.volume.fs-type") {
        config.volume_fs_type = Some(fs_type.clone());
    }

    if let Some(password) = configs.get("redis.password") {
        config.redis_password = Some(password.clone());
    }

    if let Some(aof) = configs.get("redis.aof") {
        config.enable_aof = Some(aof.clone());
    }

    if let Some(selector_str) = configs.get("redis.node-selector") {
        let selectors = parse_key_value_pairs(selector_str);
        if !selectors.is_empty() {
            config
                .node_selector
                .get_or_insert_with(BTreeMap::new)
                .extend(selectors);
        }
    }

    if let Some(ips_str) = configs.get("redis.announce-ips") {
        let ips: Vec<String> = ips_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        config.announce_ips = if ips.is_empty() { None } else { Some(ips) };
    }

    if let Some(flag) = configs.get("redis.announce-replica-ip") {
        match flag.parse::<bool>() {
            Ok(value) => config.announce_replica_ip = Some(value),
            Err(_) => warn!(value = %flag, "ignoring unparsable redis.announce-replica-ip"),
        }
    }

    if let Some(mesh) = configs.get("redis.kuma.mesh") {
        if mesh.is_empty() {
            config.kuma_mesh = Some(false);
            config.kuma_mesh_name = None;
        } else {
            config.kuma_mesh = Some(true);
            config.kuma_mesh_name = Some(mesh.clone());
        }
    }

    let mut lines: Vec<(u32, &String)> = configs
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(CONFIG_LINE_PREFIX)
                .and_then(|idx| idx.parse::<u32>().ok())
                .map(|idx| (idx, value))
        })
        .collect();
    if !lines.is_empty() {
        lines.sort_by_key(|(idx, _)| *idx);
        config
            .redis_config
            .get_or_insert_with(Vec::new)
            .extend(lines.into_iter().map(|(_, line)| line.clone()));
    }

    if let Some(cpu_str) = configs.get("redis.cpu") {
        if let Ok(cpu_float) = cpu_str.parse::<f64>() {
            let cpu_milli = (cpu_float * 1000.0) as i32;
            set_resource(config, "cpu", Quantity(format!("{}m", cpu_milli)));
        } else {
            warn!(value = %cpu_str, "ignoring unparsable redis.cpu");
        }
    }

    if let Some(mem_str) = configs.get("redis.memory") {
        set_resource(config, "memory", Quantity(mem_str.clone()));
    }
}

/// Sets both the request and the limit of one resource.
fn set_resource(config: &mut ClusterConfig, resource: &str, quantity: Quantity) {
    let resources = config
        .resources
        .get_or_insert_with(ResourceRequirements::default);

    let requests = resources.requests.get_or_insert_with(BTreeMap::new);
    requests.insert(resource.to_string(), quantity.clone());

    let limits = resources.limits.get_or_insert_with(BTreeMap::new);
    limits.insert(resource.to_string(), quantity);
}

fn parse_key_value_pairs(input: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for pair in input.split(',') {
        let parts: Vec<&str> = pair.splitn(2, '=').collect();
        if parts.len() == 2 {
            map.insert(parts[0].trim().to_string(), parts[1].trim().to_string());
        }
    }
    map
}

/// Parse dynamic configuration properties from -D key=value format
pub fn parse_dynamic_configs(configs: &[String]) -> Result<HashMap<String, String>, String> {
    let mut map = HashMap::new();

    for config in configs {
        let parts: Vec<&str> = config.splitn(2, '=').collect();
        if parts.len() != 2 {
            return Err(format!(
                "Invalid config format: '{}'. Expected 'key=value'",
                config
            ));
        }

        let key = parts[0].trim();
        let value = parts[1].trim();

        if key.is_empty() {
            return Err(format!("Empty key in config: '{}'", config));
        }

        map.insert(key.to_string(), value.to_string());
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_scalar_overrides() {
        let mut config = ClusterConfig::new("10Gi", "dGVzdA==");
        apply_to_cluster_config(
            &configs(&[
                ("redis.replicas", "6"),
                ("redis.volume.type", "io1"),
                ("redis.aof", "no"),
                ("redis.announce-replica-ip", "true"),
            ]),
            &mut config,
        );

        assert_eq!(config.replicas, Some(6));
        assert_eq!(config.volume_type.as_deref(), Some("io1"));
        assert_eq!(config.enable_aof.as_deref(), Some("no"));
        assert_eq!(config.announce_replica_ip, Some(true));
    }

    #[test]
    fn test_unparsable_replicas_ignored() {
        let mut config = ClusterConfig::new("10Gi", "dGVzdA==");
        config.replicas = Some(4);
        apply_to_cluster_config(&configs(&[("redis.replicas", "many")]), &mut config);
        assert_eq!(config.replicas, Some(4));
    }

    #[test]
    fn test_config_lines_ordered_by_index() {
        let mut config = ClusterConfig::new("10Gi", "dGVzdA==");
        config.redis_config = Some(vec!["maxmemory 1gb".to_string()]);
        apply_to_cluster_config(
            &configs(&[
                ("redis.config.10", "appendfsync always"),
                ("redis.config.2", "maxmemory-policy allkeys-lru"),
                ("redis.config.x", "ignored"),
            ]),
            &mut config,
        );

        assert_eq!(
            config.redis_config,
            Some(vec![
                "maxmemory 1gb".to_string(),
                "maxmemory-policy allkeys-lru".to_string(),
                "appendfsync always".to_string(),
            ])
        );
    }

    #[test]
    fn test_mesh_override() {
        let mut config = ClusterConfig::new("10Gi", "dGVzdA==");
        apply_to_cluster_config(&configs(&[("redis.kuma.mesh", "default")]), &mut config);
        assert_eq!(config.kuma_mesh, Some(true));
        assert_eq!(config.kuma_mesh_name.as_deref(), Some("default"));
    }

    #[test]
    fn test_resource_overrides() {
        let mut config = ClusterConfig::new("10Gi", "dGVzdA==");
        apply_to_cluster_config(
            &configs(&[("redis.cpu", "0.5"), ("redis.memory", "1Gi")]),
            &mut config,
        );

        let resources = config.resources.unwrap();
        let requests = resources.requests.unwrap();
        assert_eq!(requests.get("cpu"), Some(&Quantity("500m".to_string())));
        assert_eq!(requests.get("memory"), Some(&Quantity("1Gi".to_string())));
        assert_eq!(resources.limits.unwrap().len(), 2);
    }

    #[test]
    fn test_parse_dynamic_configs() {
        let parsed = parse_dynamic_configs(&[
            "redis.replicas=3".to_string(),
            "redis.config.0=save 900 1".to_string(),
        ])
        .unwrap();
        assert_eq!(parsed.get("redis.config.0").map(String::as_str), Some("save 900 1"));

        assert!(parse_dynamic_configs(&["novalue".to_string()]).is_err());
        assert!(parse_dynamic_configs(&["=value".to_string()]).is_err());
    }
}

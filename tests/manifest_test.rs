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

use pretty_assertions::assert_eq;
use k8s_openapi::api::core::v1::{ResourceRequirements, Toleration};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use redis_cluster_kube::{build, ClusterConfig, KubeError, ResourceSet};
use std::collections::BTreeMap;
use serde_json::Value;
use std::io::Write;

fn base_config() -> ClusterConfig {
    ClusterConfig::new("10Gi", "dGVzdA==")
}

fn object<'a>(objects: &'a [Value], kind: &str, name: &str) -> &'a Value {
    objects
        .iter()
        .find(|o| o["kind"] == kind && o["metadata"]["name"] == name)
        .unwrap_or_else(|| panic!("{}/{} not rendered", kind, name))
}

fn env_value<'a>(statefulset: &'a Value, name: &str) -> &'a Value {
    statefulset["spec"]["template"]["spec"]["containers"][0]["env"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["name"] == name)
        .unwrap_or_else(|| panic!("env {} missing", name))
}

fn bootstrap(resources: &ResourceSet) -> String {
    resources.statefulset.spec.as_ref().unwrap().template.spec.as_ref().unwrap().containers[0]
        .args
        .as_ref()
        .unwrap()[0]
        .clone()
}

#[test]
fn test_minimal_cluster() {
    let resources = build(&base_config(), "redis").unwrap();
    let objects = resources.objects().unwrap();

    let statefulset = object(&objects, "StatefulSet", "redis");
    assert_eq!(statefulset["spec"]["replicas"], 3);
    assert_eq!(statefulset["spec"]["serviceName"], "redis-headless");
    assert_eq!(
        env_value(statefulset, "REDIS_NODES")["value"],
        "redis-0.redis-headless redis-1.redis-headless redis-2.redis-headless"
    );

    let headless = object(&objects, "Service", "redis-headless");
    assert_eq!(headless["spec"]["clusterIP"], "None");

    let default_config = object(&objects, "ConfigMap", "redis-default");
    assert_eq!(default_config["data"]["redis-default.conf"], "");
}

#[test]
fn test_object_order_and_kinds() {
    let objects = build(&base_config(), "cache").unwrap().objects().unwrap();
    let kinds: Vec<(&str, &str)> = objects
        .iter()
        .map(|o| {
            (
                o["kind"].as_str().unwrap(),
                o["metadata"]["name"].as_str().unwrap(),
            )
        })
        .collect();

    assert_eq!(
        kinds,
        vec![
            ("StorageClass", "cache"),
            ("Secret", "cache"),
            ("ConfigMap", "cache-default"),
            ("ConfigMap", "cache-scripts"),
            ("Service", "cache-headless"),
            ("Service", "cache"),
            ("StatefulSet", "cache"),
        ]
    );
}

#[test]
fn test_defaults_applied() {
    let objects = build(&base_config(), "redis").unwrap().objects().unwrap();

    let storage_class = object(&objects, "StorageClass", "redis");
    assert_eq!(storage_class["provisioner"], "kubernetes.io/aws-ebs");
    assert_eq!(storage_class["parameters"]["type"], "gp2");
    assert_eq!(storage_class["parameters"]["iopsPerGB"], "3");
    assert_eq!(storage_class["parameters"]["fsType"], "ext4");

    let statefulset = object(&objects, "StatefulSet", "redis");
    assert_eq!(statefulset["metadata"]["namespace"], "default");
    assert_eq!(
        statefulset["spec"]["template"]["spec"]["containers"][0]["image"],
        "docker.io/bitnami/redis-cluster:6.2.6-debian-10-r49"
    );
    assert_eq!(env_value(statefulset, "REDIS_AOF_ENABLED")["value"], "yes");
    assert_eq!(
        statefulset["spec"]["volumeClaimTemplates"][0]["spec"]["resources"]["requests"]["storage"],
        "10Gi"
    );
}

#[test]
fn test_password_round_trips_through_secret() {
    let objects = build(&base_config(), "redis").unwrap().objects().unwrap();
    let secret = object(&objects, "Secret", "redis");

    assert_eq!(secret["type"], "Opaque");
    assert_eq!(secret["data"]["redis-password"], "dGVzdA==");
}

#[test]
fn test_references_resolve() {
    let config = ClusterConfig {
        replicas: Some(6),
        namespace: Some("caches".to_string()),
        redis_config: Some(vec!["maxmemory 1gb".to_string()]),
        ..base_config()
    };
    let resources = build(&config, "sessions").unwrap();

    assert!(resources.dangling_references().is_empty());
    assert_eq!(resources.namespace(), "caches");
    assert_eq!(resources.instance_name(), "sessions");
}

#[test]
fn test_redis_config_lines_in_order() {
    let config = ClusterConfig {
        redis_config: Some(vec![
            "maxmemory 1gb".to_string(),
            "maxmemory-policy allkeys-lru".to_string(),
        ]),
        ..base_config()
    };
    let objects = build(&config, "redis").unwrap().objects().unwrap();

    assert_eq!(
        object(&objects, "ConfigMap", "redis-default")["data"]["redis-default.conf"],
        "maxmemory 1gb\nmaxmemory-policy allkeys-lru"
    );
}

#[test]
fn test_mesh_annotations() {
    let meshed = ClusterConfig {
        kuma_mesh: Some(true),
        kuma_mesh_name: Some("payments".to_string()),
        ..base_config()
    };
    let objects = build(&meshed, "redis").unwrap().objects().unwrap();
    let annotations =
        &object(&objects, "StatefulSet", "redis")["spec"]["template"]["metadata"]["annotations"];
    assert_eq!(annotations["kuma.io/sidecar-injection"], "enabled");
    assert_eq!(annotations["kuma.io/mesh"], "payments");

    let objects = build(&base_config(), "redis").unwrap().objects().unwrap();
    let annotations =
        &object(&objects, "StatefulSet", "redis")["spec"]["template"]["metadata"]["annotations"];
    assert_eq!(annotations["kuma.io/sidecar-injection"], "disabled");
    assert!(annotations.get("kuma.io/mesh").is_none());
}

#[test]
fn test_bootstrap_fragments() {
    let plain = bootstrap(&build(&base_config(), "redis").unwrap());
    assert!(!plain.contains("REDIS_CLUSTER_ANNOUNCE_IP"));
    assert!(!plain.contains("replica-announce-ip"));

    let announced = ClusterConfig {
        announce_ips: Some(vec![
            "10.0.0.1".to_string(),
            "10.0.0.2".to_string(),
            "10.0.0.3".to_string(),
        ]),
        announce_replica_ip: Some(true),
        ..base_config()
    };
    let script = bootstrap(&build(&announced, "redis").unwrap());
    assert!(script.contains(r#"echo "[10.0.0.1 10.0.0.2 10.0.0.3]""#));
    assert!(script.contains(r#"echo "replica-announce-ip $POD_IP""#));
}

#[test]
fn test_scheduling_and_resources_reach_pod() {
    let toleration = Toleration {
        key: Some("dedicated".to_string()),
        operator: Some("Equal".to_string()),
        value: Some("redis".to_string()),
        effect: Some("NoSchedule".to_string()),
        ..Default::default()
    };
    let limits = BTreeMap::from([
        ("cpu".to_string(), Quantity("500m".to_string())),
        ("memory".to_string(), Quantity("1Gi".to_string())),
    ]);
    let config = ClusterConfig {
        tolerations: Some(vec![toleration.clone()]),
        resources: Some(ResourceRequirements {
            limits: Some(limits.clone()),
            requests: Some(limits.clone()),
            ..Default::default()
        }),
        ..base_config()
    };

    let resources = build(&config, "redis").unwrap();
    let pod = resources.statefulset.spec.unwrap().template.spec.unwrap();

    assert_eq!(pod.tolerations, Some(vec![toleration]));
    let container = pod.containers[0].resources.as_ref().unwrap();
    assert_eq!(container.limits.as_ref(), Some(&limits));
    assert_eq!(container.requests.as_ref(), Some(&limits));
}

#[test]
fn test_invalid_inputs_rejected() {
    let missing_volume = ClusterConfig {
        redis_password: Some("dGVzdA==".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        build(&missing_volume, "redis"),
        Err(KubeError::ValidationError(_))
    ));

    let bad_password = ClusterConfig::new("10Gi", "not base64!");
    assert!(build(&bad_password, "redis").is_err());

    let too_many = ClusterConfig {
        replicas: Some(u32::MAX),
        ..base_config()
    };
    assert!(matches!(
        build(&too_many, "redis"),
        Err(KubeError::ValidationError(_))
    ));

    let bad_address = ClusterConfig {
        announce_ips: Some(vec!["10.0.0.1; rm -rf /".to_string()]),
        ..base_config()
    };
    assert!(build(&bad_address, "redis").is_err());
}

#[test]
fn test_line_wrapped_password() {
    let encoded = format!("{}\nYWFhYQ==", "YWFh".repeat(19));
    let objects = build(&ClusterConfig::new("10Gi", encoded), "redis")
        .unwrap()
        .objects()
        .unwrap();

    let expected = format!("{}YWFhYQ==", "YWFh".repeat(19));
    assert_eq!(
        object(&objects, "Secret", "redis")["data"]["redis-password"],
        expected.as_str()
    );
}

#[test]
fn test_yaml_documents() {
    let yaml = build(&base_config(), "redis").unwrap().to_yaml().unwrap();
    let documents: Vec<serde_yaml::Value> = serde_yaml::Deserializer::from_str(&yaml)
        .map(|doc| serde::Deserialize::deserialize(doc).unwrap())
        .collect();

    assert_eq!(documents.len(), 7);
    assert_eq!(documents[6]["kind"], serde_yaml::Value::from("StatefulSet"));
}

#[test]
fn test_json_list() {
    let json = build(&base_config(), "redis").unwrap().to_json().unwrap();
    let list: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(list["kind"], "List");
    assert_eq!(list["items"].as_array().unwrap().len(), 7);
}

#[test]
fn test_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
replicas = 6
volume_size = "20Gi"
redis_password = "dGVzdA=="
namespace = "caches"
enable_aof = "no"
redis_config = ["maxmemory 2gb"]

[node_selector]
pool = "redis"
"#
    )
    .unwrap();

    let config = ClusterConfig::from_file(file.path()).unwrap();
    let objects = build(&config, "redis").unwrap().objects().unwrap();
    let statefulset = object(&objects, "StatefulSet", "redis");

    assert_eq!(statefulset["spec"]["replicas"], 6);
    assert_eq!(statefulset["metadata"]["namespace"], "caches");
    assert_eq!(
        statefulset["spec"]["template"]["spec"]["nodeSelector"]["pool"],
        "redis"
    );
    assert_eq!(env_value(statefulset, "REDIS_AOF_ENABLED")["value"], "no");
}

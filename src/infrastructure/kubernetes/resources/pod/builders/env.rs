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

//! Environment variable builder for the Redis container
//!
//! The Bitnami redis-cluster entrypoint is driven entirely by environment
//! variables. Their order is stable so rendered manifests diff cleanly.

use crate::infrastructure::constants::{REDIS_PORT, SECRET_PASSWORD_KEY, SERVICE_SUFFIX_HEADLESS};
use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, ObjectFieldSelector, SecretKeySelector};

/// Space separated stable DNS names of every replica, ordinal 0 first.
pub fn redis_nodes(instance_name: &str, replicas: i32) -> String {
    (0..replicas)
        .map(|i| {
            format!(
                "{}-{}.{}{}",
                instance_name, i, instance_name, SERVICE_SUFFIX_HEADLESS
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The password is read from the Secret named after the instance.
pub struct EnvironmentBuilder {
    instance_name: String,
    replicas: i32,
    aof_enabled: String,
}

impl EnvironmentBuilder {
    pub fn new(instance_name: String, replicas: i32, aof_enabled: String) -> Self {
        Self {
            instance_name,
            replicas,
            aof_enabled,
        }
    }

    pub fn build(self) -> Vec<EnvVar> {
        vec![
            field_ref_var("POD_NAME", "metadata.name"),
            value_var(
                "REDIS_NODES",
                redis_nodes(&self.instance_name, self.replicas),
            ),
            self.password_var("REDISCLI_AUTH"),
            self.password_var("REDIS_PASSWORD"),
            value_var("REDIS_AOF_ENABLED", self.aof_enabled.clone()),
            value_var("REDIS_TLS_ENABLED", "no".to_string()),
            value_var("REDIS_PORT", REDIS_PORT.to_string()),
            field_ref_var("POD_IP", "status.podIP"),
        ]
    }

    fn password_var(&self, name: &str) -> EnvVar {
        EnvVar {
            name: name.to_string(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: self.instance_name.clone(),
                    key: SECRET_PASSWORD_KEY.to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

fn value_var(name: &str, value: String) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value),
        ..Default::default()
    }
}

fn field_ref_var(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_nodes() {
        assert_eq!(
            redis_nodes("redis", 3),
            "redis-0.redis-headless redis-1.redis-headless redis-2.redis-headless"
        );
        assert_eq!(redis_nodes("redis", 0), "");
    }

    #[test]
    fn test_env_order() {
        let env = EnvironmentBuilder::new("redis".to_string(), 3, "yes".to_string()).build();
        let names: Vec<&str> = env.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "POD_NAME",
                "REDIS_NODES",
                "REDISCLI_AUTH",
                "REDIS_PASSWORD",
                "REDIS_AOF_ENABLED",
                "REDIS_TLS_ENABLED",
                "REDIS_PORT",
                "POD_IP",
            ]
        );
    }

    #[test]
    fn test_password_from_secret() {
        let env = EnvironmentBuilder::new("cache".to_string(), 1, "no".to_string()).build();
        let auth = env.iter().find(|e| e.name == "REDIS_PASSWORD").unwrap();
        let selector = auth
            .value_from
            .as_ref()
            .and_then(|v| v.secret_key_ref.as_ref())
            .unwrap();
        assert_eq!(selector.name, "cache");
        assert_eq!(selector.key, "redis-password");

        let aof = env.iter().find(|e| e.name == "REDIS_AOF_ENABLED").unwrap();
        assert_eq!(aof.value.as_deref(), Some("no"));
    }
}

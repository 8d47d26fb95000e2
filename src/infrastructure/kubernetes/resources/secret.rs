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

use crate::infrastructure::constants::{SECRET_PASSWORD_KEY, SECRET_TYPE_OPAQUE};
use crate::infrastructure::kubernetes::resources::pod::LabeledResourceBuilder;
use crate::shared::error::Result;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

pub struct SecretBuilder {
    instance_name: String,
    namespace: String,
    password: Vec<u8>,
}

impl LabeledResourceBuilder for SecretBuilder {
    fn instance_name(&self) -> &str {
        &self.instance_name
    }
}

impl SecretBuilder {
    /// `password` is the raw secret; it is base64 encoded on serialization.
    pub fn new(instance_name: String, namespace: String, password: Vec<u8>) -> Self {
        Self {
            instance_name,
            namespace,
            password,
        }
    }

    pub fn build(&self) -> Result<Secret> {
        let mut data = BTreeMap::new();
        data.insert(
            SECRET_PASSWORD_KEY.to_string(),
            ByteString(self.password.clone()),
        );

        Ok(Secret {
            metadata: ObjectMeta {
                name: Some(self.instance_name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(self.get_labels()),
                ..Default::default()
            },
            type_: Some(SECRET_TYPE_OPAQUE.to_string()),
            data: Some(data),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trips_as_base64() {
        let secret = SecretBuilder::new("redis".to_string(), "cache".to_string(), b"test".to_vec())
            .build()
            .unwrap();

        assert_eq!(secret.type_.as_deref(), Some("Opaque"));
        assert_eq!(secret.metadata.namespace.as_deref(), Some("cache"));

        let json = serde_json::to_value(&secret).unwrap();
        assert_eq!(json["data"]["redis-password"], "dGVzdA==");
        assert_eq!(json["metadata"]["labels"]["app"], "redis");
    }
}

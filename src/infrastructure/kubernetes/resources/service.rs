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
use crate::infrastructure::kubernetes::resources::headless_service::named_target_port;
use crate::infrastructure::kubernetes::resources::pod::LabeledResourceBuilder;
use crate::shared::error::Result;
use k8s_openapi::api::core::v1::{Service, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Client-facing ClusterIP service on the Redis port.
pub struct ServiceBuilder {
    instance_name: String,
    namespace: String,
}

impl LabeledResourceBuilder for ServiceBuilder {
    fn instance_name(&self) -> &str {
        &self.instance_name
    }
}

impl ServiceBuilder {
    pub fn new(instance_name: String, namespace: String) -> Self {
        Self {
            instance_name,
            namespace,
        }
    }

    pub fn build(&self) -> Result<Service> {
        let mut port = named_target_port(PORT_NAME_REDIS, REDIS_PORT);
        port.protocol = Some(PROTOCOL_TCP.to_string());

        Ok(Service {
            metadata: ObjectMeta {
                name: Some(self.instance_name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(self.get_labels()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some(SERVICE_TYPE_CLUSTER_IP.to_string()),
                ports: Some(vec![port]),
                selector: Some(self.get_selector_labels()),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_ip_service() {
        let svc = ServiceBuilder::new("redis".to_string(), "cache".to_string())
            .build()
            .unwrap();
        assert_eq!(svc.metadata.name.as_deref(), Some("redis"));
        assert_eq!(svc.metadata.namespace.as_deref(), Some("cache"));

        let spec = svc.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        assert!(spec.cluster_ip.is_none());

        let ports = spec.ports.unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].port, 6379);
        assert_eq!(ports[0].protocol.as_deref(), Some("TCP"));
    }
}

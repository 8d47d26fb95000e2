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
use crate::infrastructure::kubernetes::resources::pod::LabeledResourceBuilder;
use crate::shared::error::Result;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

const HEADLESS_SERVICE_PORTS: &[(&str, i32)] = &[
    (PORT_NAME_REDIS, REDIS_PORT),
    (PORT_NAME_REDIS_BUS, REDIS_BUS_PORT),
];

/// Governing service of the StatefulSet. Gives every pod a stable DNS name
/// and publishes pods before they are ready so the cluster can form.
pub struct HeadlessServiceBuilder {
    instance_name: String,
    namespace: String,
}

impl LabeledResourceBuilder for HeadlessServiceBuilder {
    fn instance_name(&self) -> &str {
        &self.instance_name
    }
}

impl HeadlessServiceBuilder {
    pub fn new(instance_name: String, namespace: String) -> Self {
        Self {
            instance_name,
            namespace,
        }
    }

    pub fn service_name(&self) -> String {
        format!("{}{}", self.instance_name, SERVICE_SUFFIX_HEADLESS)
    }

    pub fn build(&self) -> Result<Service> {
        let ports = HEADLESS_SERVICE_PORTS
            .iter()
            .map(|(name, port)| named_target_port(name, *port))
            .collect();

        Ok(Service {
            metadata: ObjectMeta {
                name: Some(self.service_name()),
                namespace: Some(self.namespace.clone()),
                labels: Some(self.get_labels()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some(SERVICE_TYPE_CLUSTER_IP.to_string()),
                cluster_ip: Some(CLUSTER_IP_NONE.to_string()),
                publish_not_ready_addresses: Some(true),
                ports: Some(ports),
                selector: Some(self.get_selector_labels()),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

/// Port whose target is the container port of the same name.
pub(crate) fn named_target_port(name: &str, port: i32) -> ServicePort {
    ServicePort {
        name: Some(name.to_string()),
        port,
        target_port: Some(IntOrString::String(name.to_string())),
        ..Default::default()
    }
}

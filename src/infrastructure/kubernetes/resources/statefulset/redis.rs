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

use crate::domain::config::ResolvedConfig;
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::resources::pod::{
    liveness_probe, readiness_probe, BootstrapScript, EnvironmentBuilder, LabeledResourceBuilder,
    PodBuilder,
};
use crate::shared::error::Result;
use k8s_openapi::api::apps::v1::{
    RollingUpdateStatefulSetStrategy, StatefulSet, StatefulSetSpec, StatefulSetUpdateStrategy,
};
use k8s_openapi::api::core::v1::{
    Affinity, ConfigMapVolumeSource, Container, ContainerPort, EmptyDirVolumeSource,
    PersistentVolumeClaim, PersistentVolumeClaimSpec, PodAffinityTerm, PodAntiAffinity,
    PodSecurityContext, PodSpec, PodTemplateSpec, SecurityContext, Volume, VolumeMount,
    VolumeResourceRequirements, WeightedPodAffinityTerm,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

pub struct StatefulSetBuilder {
    instance_name: String,
    config: ResolvedConfig,
}

impl LabeledResourceBuilder for StatefulSetBuilder {
    fn instance_name(&self) -> &str {
        &self.instance_name
    }
}

impl PodBuilder for StatefulSetBuilder {
    fn build_main_container(&self) -> Result<Container> {
        let env = EnvironmentBuilder::new(
            self.instance_name.clone(),
            self.config.replicas,
            self.config.enable_aof.clone(),
        )
        .build();

        let script = BootstrapScript::new()
            .with_announce_ips(self.config.announce_ips.clone())
            .with_replica_announce(self.config.announce_replica_ip)
            .render();

        Ok(Container {
            name: self.main_container_name().to_string(),
            image: Some(self.config.image.clone()),
            image_pull_policy: Some(IMAGE_PULL_POLICY_IF_NOT_PRESENT.to_string()),
            security_context: Some(SecurityContext {
                run_as_non_root: Some(true),
                run_as_user: Some(REDIS_USER_ID),
                ..Default::default()
            }),
            command: Some(vec!["/bin/bash".to_string(), "-c".to_string()]),
            args: Some(vec![script]),
            env: Some(env),
            ports: Some(vec![
                ContainerPort {
                    name: Some(PORT_NAME_REDIS.to_string()),
                    container_port: REDIS_PORT,
                    ..Default::default()
                },
                ContainerPort {
                    name: Some(PORT_NAME_REDIS_BUS.to_string()),
                    container_port: REDIS_BUS_PORT,
                    ..Default::default()
                },
            ]),
            liveness_probe: Some(liveness_probe()),
            readiness_probe: Some(readiness_probe()),
            resources: self.config.resources.clone(),
            volume_mounts: Some(self.build_volume_mounts()?),
            ..Default::default()
        })
    }

    fn build_volumes(&self) -> Result<Vec<Volume>> {
        Ok(vec![
            Volume {
                name: VOLUME_NAME_SCRIPTS.to_string(),
                config_map: Some(ConfigMapVolumeSource {
                    name: format!("{}{}", self.instance_name, CONFIGMAP_SUFFIX_SCRIPTS),
                    default_mode: Some(SCRIPTS_FILE_MODE),
                    ..Default::default()
                }),
                ..Default::default()
            },
            Volume {
                name: VOLUME_NAME_DEFAULT_CONFIG.to_string(),
                config_map: Some(ConfigMapVolumeSource {
                    name: format!("{}{}", self.instance_name, CONFIGMAP_SUFFIX_DEFAULT),
                    ..Default::default()
                }),
                ..Default::default()
            },
            Volume {
                name: VOLUME_NAME_TMP_CONF.to_string(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Default::default()
            },
        ])
    }

    fn build_volume_mounts(&self) -> Result<Vec<VolumeMount>> {
        Ok(vec![
            VolumeMount {
                name: VOLUME_NAME_SCRIPTS.to_string(),
                mount_path: SCRIPTS_MOUNT_PATH.to_string(),
                ..Default::default()
            },
            VolumeMount {
                name: VOLUME_NAME_DATA.to_string(),
                mount_path: REDIS_DATA_DIR.to_string(),
                ..Default::default()
            },
            VolumeMount {
                name: VOLUME_NAME_DEFAULT_CONFIG.to_string(),
                mount_path: REDIS_DEFAULT_CONF_FILE.to_string(),
                sub_path: Some(DEFAULT_CONFIG_FILE_NAME.to_string()),
                ..Default::default()
            },
            VolumeMount {
                name: VOLUME_NAME_TMP_CONF.to_string(),
                mount_path: REDIS_ETC_DIR.to_string(),
                ..Default::default()
            },
        ])
    }

    fn build_pod_template(&self) -> Result<PodTemplateSpec> {
        Ok(PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: Some(self.get_selector_labels()),
                annotations: Some(self.mesh_annotations()),
                ..Default::default()
            }),
            spec: Some(PodSpec {
                security_context: Some(PodSecurityContext {
                    fs_group: Some(REDIS_FS_GROUP),
                    run_as_user: Some(REDIS_USER_ID),
                    ..Default::default()
                }),
                service_account_name: Some(SERVICE_ACCOUNT_DEFAULT.to_string()),
                affinity: Some(self.build_anti_affinity()),
                containers: vec![self.build_main_container()?],
                node_selector: self.config.node_selector.clone(),
                tolerations: self.config.tolerations.clone(),
                volumes: Some(self.build_volumes()?),
                ..Default::default()
            }),
        })
    }
}

impl StatefulSetBuilder {
    pub fn new(instance_name: String, config: ResolvedConfig) -> Self {
        Self {
            instance_name,
            config,
        }
    }

    pub fn build(&self) -> Result<StatefulSet> {
        Ok(StatefulSet {
            metadata: ObjectMeta {
                name: Some(self.instance_name.clone()),
                namespace: Some(self.config.namespace.clone()),
                labels: Some(self.get_labels()),
                ..Default::default()
            },
            spec: Some(StatefulSetSpec {
                replicas: Some(self.config.replicas),
                service_name: format!("{}{}", self.instance_name, SERVICE_SUFFIX_HEADLESS),
                selector: LabelSelector {
                    match_labels: Some(self.get_selector_labels()),
                    ..Default::default()
                },
                update_strategy: Some(StatefulSetUpdateStrategy {
                    type_: Some(STRATEGY_TYPE_ROLLING_UPDATE.to_string()),
                    rolling_update: Some(RollingUpdateStatefulSetStrategy {
                        partition: Some(0),
                        ..Default::default()
                    }),
                }),
                pod_management_policy: Some(POD_MANAGEMENT_POLICY_PARALLEL.to_string()),
                template: self.build_pod_template()?,
                volume_claim_templates: Some(vec![self.build_volume_claim_template()]),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    /// Sidecar injection is always stated explicitly. The mesh name is set
    /// only when injection is enabled.
    pub fn mesh_annotations(&self) -> BTreeMap<String, String> {
        let mut annotations = BTreeMap::new();
        match self.config.kuma_mesh {
            Some(ref mesh) => {
                annotations.insert(
                    ANNOTATION_KUMA_SIDECAR_INJECTION.to_string(),
                    KUMA_INJECTION_ENABLED.to_string(),
                );
                annotations.insert(ANNOTATION_KUMA_MESH.to_string(), mesh.clone());
            }
            None => {
                annotations.insert(
                    ANNOTATION_KUMA_SIDECAR_INJECTION.to_string(),
                    KUMA_INJECTION_DISABLED.to_string(),
                );
            }
        }
        annotations
    }

    fn build_anti_affinity(&self) -> Affinity {
        Affinity {
            pod_anti_affinity: Some(PodAntiAffinity {
                preferred_during_scheduling_ignored_during_execution: Some(vec![
                    WeightedPodAffinityTerm {
                        weight: ANTI_AFFINITY_WEIGHT,
                        pod_affinity_term: PodAffinityTerm {
                            label_selector: Some(LabelSelector {
                                match_labels: Some(self.get_selector_labels()),
                                ..Default::default()
                            }),
                            namespaces: Some(vec![self.config.namespace.clone()]),
                            topology_key: TOPOLOGY_KEY_HOSTNAME.to_string(),
                            ..Default::default()
                        },
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn build_volume_claim_template(&self) -> PersistentVolumeClaim {
        let mut requests = BTreeMap::new();
        requests.insert(
            "storage".to_string(),
            Quantity(self.config.volume_size.clone()),
        );

        PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(VOLUME_NAME_DATA.to_string()),
                labels: Some(self.get_labels()),
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec![DEFAULT_ACCESS_MODE.to_string()]),
                storage_class_name: Some(self.instance_name.clone()),
                resources: Some(VolumeResourceRequirements {
                    requests: Some(requests),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

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

/// Image defaults
pub const DEFAULT_REDIS_IMAGE: &str = "docker.io/bitnami/redis-cluster:6.2.6-debian-10-r49";
pub const IMAGE_PULL_POLICY_IF_NOT_PRESENT: &str = "IfNotPresent";

/// Cluster defaults
pub const DEFAULT_REPLICAS: u32 = 3;
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_AOF_ENABLED: &str = "yes";

/// Volume defaults (aws-ebs parameters)
pub const STORAGE_PROVISIONER: &str = "kubernetes.io/aws-ebs";
pub const DEFAULT_VOLUME_TYPE: &str = "gp2";
pub const DEFAULT_VOLUME_IOPS_PER_GB: &str = "3";
pub const DEFAULT_VOLUME_FS_TYPE: &str = "ext4";
pub const DEFAULT_ACCESS_MODE: &str = "ReadWriteOnce";

/// Redis paths inside the Bitnami image
pub const REDIS_ETC_DIR: &str = "/opt/bitnami/redis/etc/";
pub const REDIS_CONF_FILE: &str = "/opt/bitnami/redis/etc/redis.conf";
pub const REDIS_DEFAULT_CONF_FILE: &str = "/opt/bitnami/redis/etc/redis-default.conf";
pub const REDIS_DATA_DIR: &str = "/bitnami/redis/data";
pub const REDIS_ENTRYPOINT: &str = "/opt/bitnami/scripts/redis-cluster/entrypoint.sh";
pub const REDIS_RUN_SCRIPT: &str = "/opt/bitnami/scripts/redis-cluster/run.sh";
pub const SCRIPTS_MOUNT_PATH: &str = "/scripts";

/// Redis ports
pub const REDIS_PORT: i32 = 6379;
pub const REDIS_BUS_PORT: i32 = 16379;
pub const PORT_NAME_REDIS: &str = "tcp-redis";
pub const PORT_NAME_REDIS_BUS: &str = "tcp-redis-bus";

/// Health check configuration
pub const PROBE_INITIAL_DELAY: i32 = 5;
pub const PROBE_PERIOD: i32 = 5;
pub const PROBE_SUCCESS_THRESHOLD: i32 = 1;
pub const PROBE_FAILURE_THRESHOLD: i32 = 5;
pub const LIVENESS_TIMEOUT: i32 = 6;
pub const READINESS_TIMEOUT: i32 = 2;
pub const LIVENESS_SCRIPT_TIMEOUT: u32 = 5;
pub const READINESS_SCRIPT_TIMEOUT: u32 = 1;

/// Security context
pub const REDIS_USER_ID: i64 = 1001;
pub const REDIS_FS_GROUP: i64 = 1001;
pub const SERVICE_ACCOUNT_DEFAULT: &str = "default";

/// Resource labels
pub const LABEL_APP: &str = "app";

/// Kuma service mesh annotations
pub const ANNOTATION_KUMA_SIDECAR_INJECTION: &str = "kuma.io/sidecar-injection";
pub const ANNOTATION_KUMA_MESH: &str = "kuma.io/mesh";
pub const KUMA_INJECTION_ENABLED: &str = "enabled";
pub const KUMA_INJECTION_DISABLED: &str = "disabled";

/// StatefulSet pod management policy
pub const POD_MANAGEMENT_POLICY_PARALLEL: &str = "Parallel";

/// Update strategy
pub const STRATEGY_TYPE_ROLLING_UPDATE: &str = "RollingUpdate";

/// Service names and suffixes
pub const SERVICE_SUFFIX_HEADLESS: &str = "-headless";
pub const CONFIGMAP_SUFFIX_DEFAULT: &str = "-default";
pub const CONFIGMAP_SUFFIX_SCRIPTS: &str = "-scripts";
pub const SERVICE_TYPE_CLUSTER_IP: &str = "ClusterIP";
pub const CLUSTER_IP_NONE: &str = "None";
pub const PROTOCOL_TCP: &str = "TCP";

/// Volume and VolumeMount names
pub const VOLUME_NAME_SCRIPTS: &str = "scripts";
pub const VOLUME_NAME_DATA: &str = "redis-data";
pub const VOLUME_NAME_DEFAULT_CONFIG: &str = "default-config";
pub const VOLUME_NAME_TMP_CONF: &str = "redis-tmp-conf";

/// ConfigMap keys
pub const DEFAULT_CONFIG_FILE_NAME: &str = "redis-default.conf";
pub const READINESS_SCRIPT_NAME: &str = "ping_readiness_local.sh";
pub const LIVENESS_SCRIPT_NAME: &str = "ping_liveness_local.sh";
pub const SCRIPTS_FILE_MODE: i32 = 0o755;

/// Secret configuration
pub const SECRET_TYPE_OPAQUE: &str = "Opaque";
pub const SECRET_PASSWORD_KEY: &str = "redis-password";

/// Affinity topology key
pub const TOPOLOGY_KEY_HOSTNAME: &str = "kubernetes.io/hostname";
pub const ANTI_AFFINITY_WEIGHT: i32 = 1;

/// Server-side apply field manager
pub const FIELD_MANAGER: &str = "redis-cluster-kube";

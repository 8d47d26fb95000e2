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

//! Redis cluster configuration
//!
//! `ClusterConfig` is the user-facing value object, read from TOML or built in code.
//! Every optional field is resolved once into a `ResolvedConfig` before any
//! Kubernetes object is built.

use crate::infrastructure::constants::*;
use crate::shared::error::{KubeError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use k8s_openapi::api::core::v1::{ResourceRequirements, Toleration};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;
use std::sync::LazyLock;

/// Redis cluster configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub replicas: Option<u32>,
    pub redis_image: Option<String>,
    pub volume_size: Option<String>,
    /// gp2/gp3/io1/io2 etc
    pub volume_type: Option<String>,
    pub volume_iops_per_gb: Option<String>,
    /// ext4/ext3/xfs etc
    pub volume_fs_type: Option<String>,
    /// Base64 encoded password
    pub redis_password: Option<String>,
    pub node_selector: Option<BTreeMap<String, String>>,
    pub tolerations: Option<Vec<Toleration>>,
    pub namespace: Option<String>,
    pub resources: Option<ResourceRequirements>,
    /// Lines appended to the seeded redis.conf
    pub redis_config: Option<Vec<String>>,
    pub enable_aof: Option<String>,
    pub announce_ips: Option<Vec<String>>,
    pub kuma_mesh: Option<bool>,
    pub kuma_mesh_name: Option<String>,
    pub announce_replica_ip: Option<bool>,
}

impl ClusterConfig {
    /// Configuration with only the two required fields set.
    pub fn new(volume_size: impl Into<String>, redis_password: impl Into<String>) -> Self {
        Self {
            volume_size: Some(volume_size.into()),
            redis_password: Some(redis_password.into()),
            ..Default::default()
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|e| {
            KubeError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn namespace(&self) -> &str {
        self.namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Apply defaults and check the required fields.
    ///
    /// Only per-field checks are made: the announce list is not compared with
    /// the replica count, and the mesh name is not required when injection is off.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let volume_size = required(&self.volume_size, "volume_size")?;
        if !is_valid_quantity(volume_size) {
            return Err(KubeError::invalid_field(
                "volume_size",
                format!("'{}' is not a Kubernetes quantity", volume_size),
            ));
        }

        let replicas = self.replicas.unwrap_or(DEFAULT_REPLICAS);
        let replicas = i32::try_from(replicas).map_err(|_| {
            KubeError::invalid_field("replicas", format!("{} exceeds {}", replicas, i32::MAX))
        })?;

        // base64(1) wraps its output at 76 columns
        let encoded_password = required(&self.redis_password, "redis_password")?
            .split_ascii_whitespace()
            .collect::<String>();
        let password = STANDARD
            .decode(encoded_password)
            .map_err(|e| KubeError::invalid_field("redis_password", format!("not base64: {}", e)))?;

        let announce_ips = match &self.announce_ips {
            Some(ips) => {
                if let Some(bad) = ips.iter().find(|ip| !is_valid_announce_address(ip)) {
                    return Err(KubeError::invalid_field(
                        "announce_ips",
                        format!("'{}' is not an address", bad),
                    ));
                }
                Some(ips.clone())
            }
            None => None,
        };

        let kuma_mesh = match (self.kuma_mesh, self.kuma_mesh_name.as_deref()) {
            (Some(true), Some(mesh)) if !mesh.is_empty() => Some(mesh.to_string()),
            _ => None,
        };

        Ok(ResolvedConfig {
            replicas,
            image: or_default(&self.redis_image, DEFAULT_REDIS_IMAGE),
            volume_size: volume_size.to_string(),
            volume_type: or_default(&self.volume_type, DEFAULT_VOLUME_TYPE),
            volume_iops_per_gb: or_default(&self.volume_iops_per_gb, DEFAULT_VOLUME_IOPS_PER_GB),
            volume_fs_type: or_default(&self.volume_fs_type, DEFAULT_VOLUME_FS_TYPE),
            password,
            node_selector: self.node_selector.clone(),
            tolerations: self.tolerations.clone(),
            namespace: self.namespace().to_string(),
            resources: self.resources.clone(),
            redis_config: self.redis_config.clone().unwrap_or_default(),
            enable_aof: or_default(&self.enable_aof, DEFAULT_AOF_ENABLED),
            announce_ips,
            kuma_mesh,
            announce_replica_ip: self.announce_replica_ip.unwrap_or(false),
        })
    }
}

/// `ClusterConfig` after the defaulting pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub replicas: i32,
    pub image: String,
    pub volume_size: String,
    pub volume_type: String,
    pub volume_iops_per_gb: String,
    pub volume_fs_type: String,
    /// Decoded password bytes
    pub password: Vec<u8>,
    pub node_selector: Option<BTreeMap<String, String>>,
    pub tolerations: Option<Vec<Toleration>>,
    pub namespace: String,
    pub resources: Option<ResourceRequirements>,
    pub redis_config: Vec<String>,
    pub enable_aof: String,
    pub announce_ips: Option<Vec<String>>,
    /// Mesh name, set only when sidecar injection is enabled
    pub kuma_mesh: Option<String>,
    pub announce_replica_ip: bool,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| KubeError::missing_field(field))
}

fn or_default(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

pub(crate) fn is_valid_quantity(value: &str) -> bool {
    static QUANTITY_RE: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?([KMGTPE]i|[mkMGTPE])?$").ok());
    QUANTITY_RE.as_ref().is_some_and(|re| re.is_match(value))
}

/// Announce addresses are spliced into the bootstrap script, so only address
/// characters are accepted.
pub(crate) fn is_valid_announce_address(value: &str) -> bool {
    static ADDRESS_RE: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(r"^[0-9A-Za-z.:\-]+$").ok());
    ADDRESS_RE.as_ref().is_some_and(|re| re.is_match(value))
}

pub(crate) fn is_valid_k8s_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    if !name.chars().next().unwrap_or(' ').is_ascii_alphanumeric() {
        return false;
    }
    if !name.chars().last().unwrap_or(' ').is_ascii_alphanumeric() {
        return false;
    }

    name.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Instance names become object names with suffixes, DNS labels of the
/// headless service and pod host names, so they are held to DNS-1123 label rules.
pub fn validate_instance_name(name: &str) -> Result<()> {
    if !is_valid_k8s_name(name) {
        return Err(KubeError::ConfigError(format!(
            "Invalid instance name: '{}' (lowercase alphanumerics and '-')",
            name
        )));
    }

    // "<name>-headless" must stay within a 63 character DNS label
    if name.len() > 45 {
        return Err(KubeError::ConfigError(format!(
            "Instance name too long (max 45 chars): {}",
            name
        )));
    }

    Ok(())
}

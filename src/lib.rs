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

//! Kubernetes manifests for password protected, replicated Redis clusters.
//!
//! [`build`] turns a [`ClusterConfig`] and an instance name into a
//! [`ResourceSet`]; [`RedisClusterDescriptor`] applies one to a live cluster.

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use domain::cluster::{ClusterInfo, ClusterStatus, RedisClusterDescriptor};
pub use domain::config::{ClusterConfig, ResolvedConfig};
pub use infrastructure::kubernetes::resources::{build, ManifestBuilder, ResourceSet};
pub use infrastructure::kubernetes::{RedisKubeClient, RedisKubeClientImpl};
pub use shared::{KubeError, Result};

#[doc(hidden)]
pub use infrastructure::kubernetes::resources::{
    ConfigMapBuilder, HeadlessServiceBuilder, SecretBuilder, ServiceBuilder, StatefulSetBuilder,
    StorageClassBuilder,
};

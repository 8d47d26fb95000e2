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

//! Kubernetes resource builders, one per kind, and the manifest assembly

pub mod configmap;
pub mod headless_service;
pub mod manifest;
pub mod pod;
pub mod secret;
pub mod service;
pub mod statefulset;
pub mod storage_class;

pub use self::configmap::ConfigMapBuilder;
pub use self::headless_service::HeadlessServiceBuilder;
pub use self::manifest::{build, ManifestBuilder, ResourceSet};
pub use self::secret::SecretBuilder;
pub use self::service::ServiceBuilder;
pub use self::statefulset::StatefulSetBuilder;
pub use self::storage_class::StorageClassBuilder;

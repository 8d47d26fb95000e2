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

use crate::infrastructure::constants::STORAGE_PROVISIONER;
use crate::infrastructure::kubernetes::resources::pod::LabeledResourceBuilder;
use crate::shared::error::Result;
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Cluster-scoped aws-ebs class named after the instance.
pub struct StorageClassBuilder {
    instance_name: String,
    volume_type: String,
    iops_per_gb: String,
    fs_type: String,
}

impl LabeledResourceBuilder for StorageClassBuilder {
    fn instance_name(&self) -> &str {
        &self.instance_name
    }
}

impl StorageClassBuilder {
    pub fn new(
        instance_name: String,
        volume_type: String,
        iops_per_gb: String,
        fs_type: String,
    ) -> Self {
        Self {
            instance_name,
            volume_type,
            iops_per_gb,
            fs_type,
        }
    }

    pub fn build(&self) -> Result<StorageClass> {
        let mut parameters = BTreeMap::new();
        parameters.insert("type".to_string(), self.volume_type.clone());
        parameters.insert("iopsPerGB".to_string(), self.iops_per_gb.clone());
        parameters.insert("fsType".to_string(), self.fs_type.clone());

        Ok(StorageClass {
            metadata: ObjectMeta {
                name: Some(self.instance_name.clone()),
                labels: Some(self.get_labels()),
                ..Default::default()
            },
            provisioner: STORAGE_PROVISIONER.to_string(),
            parameters: Some(parameters),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_class_parameters() {
        let sc = StorageClassBuilder::new(
            "redis".to_string(),
            "io1".to_string(),
            "10".to_string(),
            "xfs".to_string(),
        )
        .build()
        .unwrap();

        assert_eq!(sc.metadata.name.as_deref(), Some("redis"));
        assert!(sc.metadata.namespace.is_none());
        assert_eq!(sc.provisioner, "kubernetes.io/aws-ebs");

        let params = sc.parameters.unwrap();
        assert_eq!(params["type"], "io1");
        assert_eq!(params["iopsPerGB"], "10");
        assert_eq!(params["fsType"], "xfs");
    }
}

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

use proptest::prelude::*;
use redis_cluster_kube::{build, ClusterConfig};

fn instance_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}[a-z0-9]"
}

proptest! {
    #[test]
    fn every_replica_is_listed_once(name in instance_name(), replicas in 1u32..12) {
        let config = ClusterConfig {
            replicas: Some(replicas),
            ..ClusterConfig::new("1Gi", "c2VjcmV0")
        };
        let resources = build(&config, &name).unwrap();
        let pod = resources.statefulset.spec.unwrap().template.spec.unwrap();
        let nodes = pod.containers[0]
            .env
            .as_ref()
            .unwrap()
            .iter()
            .find(|e| e.name == "REDIS_NODES")
            .and_then(|e| e.value.clone())
            .unwrap();

        let expected: Vec<String> = (0..replicas)
            .map(|i| format!("{}-{}.{}-headless", name, i, name))
            .collect();
        prop_assert_eq!(nodes.split(' ').map(String::from).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn references_always_resolve(
        name in instance_name(),
        replicas in 1u32..12,
        namespace in "[a-z]{1,10}",
        lines in proptest::collection::vec("[a-z]+ [0-9]+", 0..4),
        mesh in proptest::option::of("[a-z]{1,8}"),
    ) {
        let config = ClusterConfig {
            replicas: Some(replicas),
            namespace: Some(namespace),
            redis_config: Some(lines),
            kuma_mesh: Some(mesh.is_some()),
            kuma_mesh_name: mesh,
            ..ClusterConfig::new("5Gi", "c2VjcmV0")
        };
        let resources = build(&config, &name).unwrap();

        prop_assert!(resources.dangling_references().is_empty());
        prop_assert_eq!(resources.objects().unwrap().len(), 7);
    }
}

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

//! Round trip against a real cluster. Needs a kubeconfig with rights to
//! create StorageClasses; run with `cargo test --test live_cluster_test -- --ignored`.

use redis_cluster_kube::{build, ClusterConfig, RedisClusterDescriptor};

const NAMESPACE: &str = "default";
const INSTANCE: &str = "rck-live-test";

#[tokio::test]
#[ignore] // Requires Kubernetes cluster
async fn test_deploy_status_delete() {
    let resources = build(&ClusterConfig::new("1Gi", "bGl2ZS10ZXN0"), INSTANCE).unwrap();
    let descriptor = RedisClusterDescriptor::new(NAMESPACE.to_string())
        .await
        .unwrap();

    descriptor.deploy_cluster(&resources, false).await.unwrap();

    let status = descriptor.get_cluster_status(INSTANCE).await.unwrap();
    assert!(status.statefulset.is_some());
    assert_eq!(status.services.len(), 2);

    let clusters = descriptor.list_clusters().await.unwrap();
    assert!(clusters.iter().any(|c| c.instance_name == INSTANCE));

    descriptor.update_cluster(&resources).await.unwrap();

    let deleted = descriptor.delete_cluster(INSTANCE, true).await.unwrap();
    assert!(deleted.iter().any(|d| d == &format!("StatefulSet/{}", INSTANCE)));
}

#[tokio::test]
#[ignore] // Requires Kubernetes cluster
async fn test_status_of_unknown_instance() {
    let descriptor = RedisClusterDescriptor::new(NAMESPACE.to_string())
        .await
        .unwrap();
    assert!(descriptor.get_cluster_status("rck-missing").await.is_err());
}

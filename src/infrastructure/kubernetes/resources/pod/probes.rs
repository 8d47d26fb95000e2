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
use k8s_openapi::api::core::v1::{ExecAction, Probe};

/// Ready once the node answers PING and has seen `cluster_state:ok` once.
pub const READINESS_SCRIPT: &str = r#"#!/bin/sh
set -e

REDIS_STATUS_FILE=/tmp/.redis_cluster_check
if [ ! -z "$REDIS_PASSWORD" ]; then export REDISCLI_AUTH=$REDIS_PASSWORD; fi;
response=$(
  timeout -s 3 $1 \
  redis-cli \
    -h localhost \
    -p $REDIS_PORT \
    ping
)
if [ "$response" != "PONG" ]; then
  echo "$response"
  exit 1
fi
if [ ! -f "$REDIS_STATUS_FILE" ]; then
  response=$(
    timeout -s 3 $1 \
    redis-cli \
      -h localhost \
      -p $REDIS_PORT \
      CLUSTER INFO | grep cluster_state | tr -d '[:space:]'
  )
  if [ "$response" != "cluster_state:ok" ]; then
    echo "$response"
    exit 1
  else
    touch "$REDIS_STATUS_FILE"
  fi
fi
"#;

/// Alive while the node answers PING, including while it loads its dataset.
pub const LIVENESS_SCRIPT: &str = r#"#!/bin/sh
if [ ! -z "$REDIS_PASSWORD" ]; then export REDISCLI_AUTH=$REDIS_PASSWORD; fi;
response=$(
  timeout -s 3 $1 \
  redis-cli \
    -h localhost \
    -p $REDIS_PORT \
    ping
)
if [ "$response" != "PONG" ] && [ "$response" != "LOADING Redis is loading the dataset in memory" ]; then
  echo "$response"
  exit 1
fi
"#;

pub fn liveness_probe() -> Probe {
    exec_probe(LIVENESS_SCRIPT_NAME, LIVENESS_SCRIPT_TIMEOUT, LIVENESS_TIMEOUT)
}

pub fn readiness_probe() -> Probe {
    exec_probe(
        READINESS_SCRIPT_NAME,
        READINESS_SCRIPT_TIMEOUT,
        READINESS_TIMEOUT,
    )
}

fn exec_probe(script_name: &str, script_timeout: u32, probe_timeout: i32) -> Probe {
    Probe {
        exec: Some(ExecAction {
            command: Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("{}/{} {}", SCRIPTS_MOUNT_PATH, script_name, script_timeout),
            ]),
        }),
        initial_delay_seconds: Some(PROBE_INITIAL_DELAY),
        period_seconds: Some(PROBE_PERIOD),
        timeout_seconds: Some(probe_timeout),
        success_threshold: Some(PROBE_SUCCESS_THRESHOLD),
        failure_threshold: Some(PROBE_FAILURE_THRESHOLD),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_commands() {
        let liveness = liveness_probe();
        assert_eq!(
            liveness.exec.unwrap().command.unwrap(),
            vec!["sh", "-c", "/scripts/ping_liveness_local.sh 5"]
        );
        assert_eq!(liveness.timeout_seconds, Some(6));

        let readiness = readiness_probe();
        assert_eq!(
            readiness.exec.unwrap().command.unwrap(),
            vec!["sh", "-c", "/scripts/ping_readiness_local.sh 1"]
        );
        assert_eq!(readiness.timeout_seconds, Some(2));
        assert_eq!(readiness.failure_threshold, Some(5));
    }
}

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

//! Container bootstrap script
//!
//! Runs under `/bin/bash -c` before the image entrypoint. Everything that
//! depends on the pod (its ordinal, its IP) is evaluated there at start-up;
//! this module only assembles the text.

use crate::infrastructure::constants::{
    REDIS_CONF_FILE, REDIS_DEFAULT_CONF_FILE, REDIS_ENTRYPOINT, REDIS_RUN_SCRIPT,
};

/// Appended when replicas should announce their pod IP.
pub fn replica_announce_fragment() -> String {
    format!(r#"echo "replica-announce-ip $POD_IP" >> {}"#, REDIS_CONF_FILE)
}

/// Picks this pod's entry out of the advertised list and replaces the node
/// list with the advertised addresses. Needs `pod_index` to be set.
pub fn announce_ips_fragment(ips: &[String]) -> String {
    format!(
        r#"ips=($(echo "[{ips}]" | cut -d [ -f2 | cut -d ] -f 1))
export REDIS_CLUSTER_ANNOUNCE_IP="${{ips[$pod_index]}}"
export REDIS_NODES="${{ips[@]}}""#,
        ips = ips.join(" ")
    )
}

#[derive(Debug, Clone, Default)]
pub struct BootstrapScript {
    announce_ips: Option<Vec<String>>,
    announce_replica_ip: bool,
}

impl BootstrapScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_announce_ips(mut self, ips: Option<Vec<String>>) -> Self {
        self.announce_ips = ips;
        self
    }

    pub fn with_replica_announce(mut self, enabled: bool) -> Self {
        self.announce_replica_ip = enabled;
        self
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            // Seed redis.conf on first boot only, later restarts keep runtime changes
            format!("if ! [[ -f {} ]]; then", REDIS_CONF_FILE),
            "    echo COPYING FILE".to_string(),
            format!("    cp {} {}", REDIS_DEFAULT_CONF_FILE, REDIS_CONF_FILE),
            "fi".to_string(),
            r#"pod_index=($(echo "$POD_NAME" | tr "-" "\n"))"#.to_string(),
            r#"pod_index="${pod_index[-1]}""#.to_string(),
        ];

        if let Some(ref ips) = self.announce_ips {
            lines.push(announce_ips_fragment(ips));
        }

        lines.extend([
            r#"if [[ "$pod_index" == "0" ]]; then"#.to_string(),
            r#"  export REDIS_CLUSTER_CREATOR="yes""#.to_string(),
            r#"  export REDIS_CLUSTER_REPLICAS="1""#.to_string(),
            "fi".to_string(),
        ]);

        if self.announce_replica_ip {
            lines.push(replica_announce_fragment());
        }

        lines.push(format!("{} {}", REDIS_ENTRYPOINT, REDIS_RUN_SCRIPT));

        let mut script = lines.join("\n");
        script.push('\n');
        script
    }
}

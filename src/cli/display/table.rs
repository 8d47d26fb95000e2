//! Table rendering for CLI output

use super::ReplicaHealth;
use crate::domain::cluster::{ClusterInfo, ClusterStatus};
use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};

/// Age in the short form kubectl prints, e.g. `42s`, `7m`, `5h`, `3d`.
pub fn format_age(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created) = created else {
        return "-".to_string();
    };

    let seconds = (now - created).num_seconds().max(0);
    match seconds {
        s if s < 60 => format!("{}s", s),
        s if s < 3_600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3_600),
        s => format!("{}d", s / 86_400),
    }
}

#[derive(Debug, Default)]
pub struct TableRenderer;

impl TableRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_clusters_list(&self, clusters: &[ClusterInfo]) -> String {
        if clusters.is_empty() {
            return "No Redis clusters found".to_string();
        }

        let now = Utc::now();
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("NAME").set_alignment(CellAlignment::Left),
                Cell::new("NAMESPACE").set_alignment(CellAlignment::Left),
                Cell::new("READY").set_alignment(CellAlignment::Center),
                Cell::new("STATUS").set_alignment(CellAlignment::Center),
                Cell::new("AGE").set_alignment(CellAlignment::Right),
            ]);

        for cluster in clusters {
            let health = ReplicaHealth::from_replicas(cluster.ready, cluster.replicas);

            table.add_row(vec![
                Cell::new(&cluster.instance_name),
                Cell::new(&cluster.namespace),
                Cell::new(format!("{}/{}", cluster.ready, cluster.replicas)).fg(health.color()),
                Cell::new(format!("{} {}", health.icon(), health.label())).fg(health.color()),
                Cell::new(format_age(cluster.created, now)).set_alignment(CellAlignment::Right),
            ]);
        }

        let mut output = String::new();
        output.push_str(&format!(
            "╭─ Redis Clusters {} ─╮\n",
            format!("[{} clusters]", clusters.len()).bright_black()
        ));
        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&format!(
            "Legend: {} Healthy  {} Degraded  {} Failed\n",
            ReplicaHealth::Healthy.icon().green(),
            ReplicaHealth::Degraded.icon().yellow(),
            ReplicaHealth::Failed.icon().red()
        ));

        output
    }

    pub fn render_cluster_status(&self, status: &ClusterStatus) -> String {
        let (ready, replicas) = status
            .statefulset
            .as_ref()
            .map(|ss| (ss.ready_replicas, ss.replicas))
            .unwrap_or((0, 0));
        let health = ReplicaHealth::from_replicas(ready, replicas);

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.add_row(vec![
            Cell::new("📊 Redis Cluster Status").set_alignment(CellAlignment::Center)
        ]);
        table.add_row(vec![Cell::new(format!(
            "Cluster: {} | Namespace: {}",
            status.instance_name, status.namespace
        ))]);
        table.add_row(vec![
            Cell::new(format!("Status: {} {}", health.icon(), health.label())).fg(health.color()),
        ]);

        let nodes_text = match status.statefulset {
            Some(ref ss) => format!(
                "🔷 Redis Nodes\n  StatefulSet: {}\n  Ready: {}/{}\n  Age: {}",
                ss.name,
                ss.ready_replicas,
                ss.replicas,
                format_age(ss.created, Utc::now())
            ),
            None => "🔷 Redis Nodes\n  StatefulSet not found".to_string(),
        };

        let mut network_text = "🌐 Services".to_string();
        if status.services.is_empty() {
            network_text.push_str("\n  Service not found");
        }
        for svc in &status.services {
            network_text.push_str(&format!(
                "\n  {} ({})",
                svc.name,
                svc.cluster_ip.as_deref().unwrap_or("-")
            ));
        }
        for cm in &status.configmaps {
            network_text.push_str(&format!("\n  ConfigMap: {}", cm.name));
        }

        table.add_row(vec![
            Cell::new(nodes_text).fg(health.color()),
            Cell::new(network_text).fg(Color::Cyan),
        ]);

        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cluster::{ServiceStatus, StatefulSetStatus};
    use chrono::Duration;

    #[test]
    fn test_format_age() {
        let now = Utc::now();
        assert_eq!(format_age(None, now), "-");
        assert_eq!(format_age(Some(now - Duration::seconds(42)), now), "42s");
        assert_eq!(format_age(Some(now - Duration::minutes(7)), now), "7m");
        assert_eq!(format_age(Some(now - Duration::hours(5)), now), "5h");
        assert_eq!(format_age(Some(now - Duration::days(3)), now), "3d");
    }

    #[test]
    fn test_render_empty_clusters() {
        let output = TableRenderer::new().render_clusters_list(&[]);
        assert!(output.contains("No Redis clusters found"));
    }

    #[test]
    fn test_render_single_cluster() {
        let clusters = vec![ClusterInfo {
            instance_name: "cache".to_string(),
            namespace: "default".to_string(),
            replicas: 6,
            ready: 6,
            created: None,
        }];

        let output = TableRenderer::new().render_clusters_list(&clusters);
        assert!(output.contains("cache"));
        assert!(output.contains("6/6"));
        assert!(output.contains("Running"));
    }

    #[test]
    fn test_render_status() {
        let status = ClusterStatus {
            instance_name: "cache".to_string(),
            namespace: "redis".to_string(),
            statefulset: Some(StatefulSetStatus {
                name: "cache".to_string(),
                replicas: 3,
                ready_replicas: 1,
                created: None,
            }),
            services: vec![ServiceStatus {
                name: "cache-headless".to_string(),
                cluster_ip: Some("None".to_string()),
            }],
            configmaps: Vec::new(),
        };

        let output = TableRenderer::new().render_cluster_status(&status);
        assert!(output.contains("Degraded"));
        assert!(output.contains("Ready: 1/3"));
        assert!(output.contains("cache-headless (None)"));
    }
}

//! Replica health as shown by `status` and `list`

use comfy_table::Color as TableColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaHealth {
    /// Every desired replica is ready
    Healthy,
    Degraded,
    /// No replica is ready
    Failed,
    /// No replicas are desired, or the StatefulSet is missing
    Unknown,
}

impl ReplicaHealth {
    pub fn from_replicas(ready: u32, desired: u32) -> Self {
        if desired == 0 {
            Self::Unknown
        } else if ready >= desired {
            Self::Healthy
        } else if ready > 0 {
            Self::Degraded
        } else {
            Self::Failed
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Healthy => "✓",
            Self::Degraded => "⚠",
            Self::Failed => "✗",
            Self::Unknown => "?",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Healthy => "Running",
            Self::Degraded => "Degraded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }

    pub fn color(self) -> TableColor {
        match self {
            Self::Healthy => TableColor::Green,
            Self::Degraded => TableColor::Yellow,
            Self::Failed => TableColor::Red,
            Self::Unknown => TableColor::DarkGrey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_replicas() {
        assert_eq!(ReplicaHealth::from_replicas(3, 3), ReplicaHealth::Healthy);
        assert_eq!(ReplicaHealth::from_replicas(2, 3), ReplicaHealth::Degraded);
        assert_eq!(ReplicaHealth::from_replicas(0, 3), ReplicaHealth::Failed);
        assert_eq!(ReplicaHealth::from_replicas(0, 0), ReplicaHealth::Unknown);
    }

    #[test]
    fn test_presentation() {
        let degraded = ReplicaHealth::from_replicas(1, 6);
        assert_eq!(degraded.icon(), "⚠");
        assert_eq!(degraded.label(), "Degraded");
        assert_eq!(degraded.color(), TableColor::Yellow);
    }
}

//! Common types shared by container runtimes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Container ID wrapper
///
/// Opaque; allocated by the runtime on create and the only key callers hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        if self.0.len() > 12 {
            &self.0[..12]
        } else {
            &self.0
        }
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContainerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle state as reported by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Suspended,
    Stopped,
    Closed,
    Unknown,
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Suspended => write!(f, "suspended"),
            Self::Stopped => write!(f, "stopped"),
            Self::Closed => write!(f, "closed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<&str> for ContainerState {
    fn from(s: &str) -> Self {
        // Engine status strings; "paused" and "exited" are the engine's
        // names for suspended and stopped.
        match s.to_lowercase().as_str() {
            "created" => Self::Created,
            "running" | "restarting" => Self::Running,
            "paused" | "suspended" => Self::Suspended,
            "exited" | "stopped" => Self::Stopped,
            "removing" | "dead" | "closed" => Self::Closed,
            _ => Self::Unknown,
        }
    }
}

/// Resource limits requested at create time
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Resources {
    /// Memory limit in megabytes; 0 means unlimited
    pub memory_mb: u64,
    /// CPU share; 0.0 means unlimited
    pub cpu: f64,
}

/// Parameters for creating a container
#[derive(Debug, Clone, Default)]
pub struct ContainerSpec {
    /// Image to use
    pub image: String,
    /// Environment variables
    pub env_vars: HashMap<String, String>,
    /// Container port -> host port ("8080/tcp" -> "8080"; empty host port
    /// lets the engine pick one)
    pub port_bindings: HashMap<String, String>,
    /// Labels
    pub labels: HashMap<String, String>,
    /// Bind mounts as `source:target[:ro]` strings
    pub mounts: Vec<String>,
    /// Resource limits
    pub resources: Resources,
    /// Command override
    pub cmd: Vec<String>,
    /// DNS servers
    pub dns: Vec<String>,
    /// Extra container ports to expose with engine-assigned host ports
    pub used_ports: Vec<u32>,
    /// Attach to the engine's bridge network
    pub use_bridge: bool,
}

/// Runtime information
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    /// Runtime flavor ("docker")
    pub runtime_type: String,
    /// Engine API version spoken
    pub api_version: String,
}

/// Snapshot of a container as reported by the runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerHandle {
    pub id: ContainerId,
    pub state: ContainerState,
    pub image: String,
    /// Runtime flavor that owns the container ("docker")
    pub container_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_short() {
        let id = ContainerId::new("0123456789abcdef0123");
        assert_eq!(id.short(), "0123456789ab");

        let short = ContainerId::new("abc");
        assert_eq!(short.short(), "abc");
    }

    #[test]
    fn test_state_from_engine_status() {
        assert_eq!(ContainerState::from("created"), ContainerState::Created);
        assert_eq!(ContainerState::from("Running"), ContainerState::Running);
        assert_eq!(ContainerState::from("paused"), ContainerState::Suspended);
        assert_eq!(ContainerState::from("exited"), ContainerState::Stopped);
        assert_eq!(ContainerState::from("dead"), ContainerState::Closed);
        assert_eq!(ContainerState::from("whatever"), ContainerState::Unknown);
    }

    #[test]
    fn test_state_display_round_trip() {
        for state in [
            ContainerState::Created,
            ContainerState::Running,
            ContainerState::Suspended,
            ContainerState::Stopped,
            ContainerState::Closed,
        ] {
            assert_eq!(ContainerState::from(state.to_string().as_str()), state);
        }
    }
}

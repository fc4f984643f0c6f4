//! Docker runtime implementation using bollard

use crate::{
    ContainerHandle, ContainerId, ContainerRuntime, ContainerSpec, ContainerState, Result,
    RuntimeError, RuntimeInfo,
};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
    StopContainerOptions,
};
use bollard::service::{HostConfig, Mount, MountTypeEnum, PortBinding};
use bollard::Docker;
use std::collections::HashMap;

const NANO_CPUS: f64 = 1_000_000_000.0;
const STOP_TIMEOUT_SECS: i64 = 10;

/// Docker runtime using the bollard crate
pub struct DockerRuntime {
    client: Docker,
}

impl DockerRuntime {
    /// Connect to the Docker engine and verify it responds
    pub async fn new(socket_path: &str) -> Result<Self> {
        let client = if socket_path.starts_with("http://") || socket_path.starts_with("https://") {
            Docker::connect_with_http(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| RuntimeError::ConnectionError(e.to_string()))?
        } else {
            let path = socket_path.trim_start_matches("unix://");
            Docker::connect_with_socket(path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| RuntimeError::ConnectionError(e.to_string()))?
        };

        client
            .ping()
            .await
            .map_err(|e| RuntimeError::ConnectionError(e.to_string()))?;

        Ok(Self { client })
    }

    /// Get the underlying Docker client
    pub fn client(&self) -> &Docker {
        &self.client
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        if spec.image.is_empty() {
            return Err(RuntimeError::InvalidSpec("image must not be empty".into()));
        }

        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();

        for (container_port, host_port) in &spec.port_bindings {
            let key = normalize_port_key(container_port);
            exposed_ports.insert(key.clone(), HashMap::new());

            let binding = PortBinding {
                host_ip: None,
                host_port: if host_port.is_empty() {
                    None
                } else {
                    Some(host_port.clone())
                },
            };
            port_bindings.insert(key, Some(vec![binding]));
        }

        // Extra ports exposed with an engine-assigned host port
        for port in &spec.used_ports {
            let key = format!("{}/tcp", port);
            exposed_ports.entry(key.clone()).or_default();
            port_bindings.entry(key).or_insert_with(|| {
                Some(vec![PortBinding {
                    host_ip: None,
                    host_port: None,
                }])
            });
        }

        let mounts = spec
            .mounts
            .iter()
            .map(|m| parse_mount(m))
            .collect::<Result<Vec<Mount>>>()?;

        let host_config = HostConfig {
            mounts: if mounts.is_empty() {
                None
            } else {
                Some(mounts)
            },
            port_bindings: if port_bindings.is_empty() {
                None
            } else {
                Some(port_bindings)
            },
            network_mode: if spec.use_bridge {
                Some("bridge".to_string())
            } else {
                None
            },
            dns: if spec.dns.is_empty() {
                None
            } else {
                Some(spec.dns.clone())
            },
            memory: if spec.resources.memory_mb > 0 {
                Some((spec.resources.memory_mb * 1024 * 1024) as i64)
            } else {
                None
            },
            nano_cpus: if spec.resources.cpu > 0.0 {
                Some((spec.resources.cpu * NANO_CPUS) as i64)
            } else {
                None
            },
            ..Default::default()
        };

        let env: Vec<String> = spec
            .env_vars
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let container_config = Config {
            image: Some(spec.image.clone()),
            cmd: if spec.cmd.is_empty() {
                None
            } else {
                Some(spec.cmd.clone())
            },
            env: if env.is_empty() { None } else { Some(env) },
            labels: if spec.labels.is_empty() {
                None
            } else {
                Some(spec.labels.clone())
            },
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            host_config: Some(host_config),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(None::<CreateContainerOptions<String>>, container_config)
            .await?;

        tracing::info!(id = %response.id, image = %spec.image, "created container");
        Ok(ContainerId::new(response.id))
    }

    async fn start(&self, id: &ContainerId) -> Result<()> {
        self.client
            .start_container(&id.0, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn suspend(&self, id: &ContainerId) -> Result<()> {
        self.client.pause_container(&id.0).await?;
        Ok(())
    }

    async fn stop(&self, id: &ContainerId) -> Result<()> {
        let options = StopContainerOptions {
            t: STOP_TIMEOUT_SECS,
        };
        self.client.stop_container(&id.0, Some(options)).await?;
        Ok(())
    }

    async fn close(&self, id: &ContainerId) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        self.client.remove_container(&id.0, Some(options)).await?;
        Ok(())
    }

    async fn inspect(&self, id: &ContainerId) -> Result<ContainerHandle> {
        let info = self.client.inspect_container(&id.0, None).await?;

        let state = info
            .state
            .as_ref()
            .and_then(|s| s.status)
            .map(|s| ContainerState::from(format!("{:?}", s).to_lowercase().as_str()))
            .unwrap_or(ContainerState::Unknown);

        Ok(ContainerHandle {
            id: id.clone(),
            state,
            image: info
                .config
                .as_ref()
                .and_then(|c| c.image.clone())
                .unwrap_or_default(),
            container_type: "docker".to_string(),
        })
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeError::ConnectionError(e.to_string()))?;
        Ok(())
    }

    fn info(&self) -> RuntimeInfo {
        RuntimeInfo {
            runtime_type: "docker".to_string(),
            api_version: bollard::API_DEFAULT_VERSION.to_string(),
        }
    }
}

/// Normalize a port key to the engine's `port/proto` form
fn normalize_port_key(port: &str) -> String {
    if port.contains('/') {
        port.to_string()
    } else {
        format!("{}/tcp", port)
    }
}

/// Parse a `source:target[:ro]` mount string into an engine bind mount
fn parse_mount(raw: &str) -> Result<Mount> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(RuntimeError::InvalidSpec(format!(
            "mount must be source:target[:ro], got {:?}",
            raw
        )));
    }

    Ok(Mount {
        source: Some(parts[0].to_string()),
        target: Some(parts[1].to_string()),
        typ: Some(MountTypeEnum::BIND),
        read_only: Some(parts.get(2) == Some(&"ro")),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_port_key() {
        assert_eq!(normalize_port_key("8080"), "8080/tcp");
        assert_eq!(normalize_port_key("53/udp"), "53/udp");
    }

    #[test]
    fn test_parse_mount() {
        let mount = parse_mount("/host/data:/data").unwrap();
        assert_eq!(mount.source.as_deref(), Some("/host/data"));
        assert_eq!(mount.target.as_deref(), Some("/data"));
        assert_eq!(mount.read_only, Some(false));

        let ro = parse_mount("/host/conf:/conf:ro").unwrap();
        assert_eq!(ro.read_only, Some(true));
    }

    #[test]
    fn test_parse_mount_rejects_bare_path() {
        assert!(parse_mount("/just/a/path").is_err());
        assert!(parse_mount(":/target").is_err());
    }
}

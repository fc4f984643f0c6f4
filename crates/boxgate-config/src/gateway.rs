//! Gateway configuration
//!
//! Located at `~/.config/boxgate/config.toml`

use crate::{ConfigError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerSettings,
    pub tls: TlsSettings,
    pub auth: AuthSettings,
    pub runtime: RuntimeSettings,
}

/// Listen address for the gRPC endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4444,
        }
    }
}

/// Transport security material
///
/// When `enabled`, the server presents `cert_file`/`key_file` and requires
/// clients to present a certificate signed by `ca_file`. Disabling TLS is an
/// operational escape hatch, not a default worth keeping in production.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    /// Enable mutual TLS on the listener
    pub enabled: bool,
    /// PEM certificate presented by this endpoint
    pub cert_file: String,
    /// PEM private key matching `cert_file`
    pub key_file: String,
    /// PEM bundle of trusted authority certificates used to verify the peer
    pub ca_file: String,
}

/// Token verification keys
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 key the per-call token signature is verified against
    pub sign_key: String,
    /// Additional authorization key the token's `ak` claim must match.
    /// Empty disables the claim check.
    pub auth_key: String,
}

/// Container runtime connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Docker engine socket path or URL
    pub socket: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            socket: default_docker_socket(),
        }
    }
}

#[cfg(windows)]
fn default_docker_socket() -> String {
    "//./pipe/docker_engine".to_string()
}

#[cfg(not(windows))]
fn default_docker_socket() -> String {
    "/var/run/docker.sock".to_string()
}

impl GatewayConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            path: path.clone(),
            source: e,
        })?;

        tracing::debug!(
            "Loaded config from {:?}: tls_enabled={}",
            path,
            config.tls.enabled
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.clone(),
                source: e,
            })?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "boxgate").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Check that the configuration is serviceable before the gateway binds
    /// a listener. Token verification always needs a sign key; mutual TLS
    /// needs all three PEM paths.
    pub fn validate(&self) -> Result<()> {
        if self.auth.sign_key.is_empty() {
            return Err(ConfigError::Invalid(
                "auth.sign_key must be set; the gateway refuses unauthenticated calls".to_string(),
            ));
        }

        if self.tls.enabled {
            for (field, value) in [
                ("tls.cert_file", &self.tls.cert_file),
                ("tls.key_file", &self.tls.key_file),
                ("tls.ca_file", &self.tls.ca_file),
            ] {
                if value.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "{} must be set when tls.enabled = true",
                        field
                    )));
                }
            }
        }

        Ok(())
    }

    /// Listen address in `host:port` form
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Linker node configuration.

use linkmesh::config::{ConfigError, MeshConfig};
use linkmesh::NodeAddr;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Linker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkerConfig {
    /// Address to bind to (default: 0.0.0.0)
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// UDP port to listen on. Port 0 binds an ephemeral port.
    #[serde(default)]
    pub port: u16,

    /// The other linkers in the mesh, fixed for the process lifetime.
    #[serde(default)]
    pub peers: Vec<NodeAddr>,

    /// How long a suspect has to answer a liveness probe (milliseconds).
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// Per-peer wait for a registry table during bootstrap (milliseconds).
    #[serde(default = "default_bootstrap_timeout")]
    pub bootstrap_timeout_ms: u64,

    /// Receive buffer size; one datagram is one envelope.
    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,
}

fn default_bind_address() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_probe_timeout() -> u64 {
    1000
}

fn default_bootstrap_timeout() -> u64 {
    1000
}

fn default_max_datagram_size() -> usize {
    4096
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: 0,
            peers: Vec::new(),
            probe_timeout_ms: default_probe_timeout(),
            bootstrap_timeout_ms: default_bootstrap_timeout(),
            max_datagram_size: default_max_datagram_size(),
        }
    }
}

impl LinkerConfig {
    /// Build a linker config from the shared mesh file: the linker at
    /// `index` binds its listed port and peers with everyone else.
    pub fn from_mesh(mesh: &MeshConfig, index: usize) -> Result<Self, ConfigError> {
        let (own, peers) = mesh.split(index)?;
        Ok(Self {
            port: own.port,
            peers,
            ..Default::default()
        })
    }

    /// Probe timeout as a Duration.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Bootstrap per-peer timeout as a Duration.
    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_millis(self.bootstrap_timeout_ms)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::Invalid("probe_timeout_ms cannot be 0".into()));
        }
        if self.bootstrap_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "bootstrap_timeout_ms cannot be 0".into(),
            ));
        }
        if self.max_datagram_size < linkmesh::wire::HEADER_LEN + linkmesh::MAX_PAYLOAD {
            return Err(ConfigError::Invalid(format!(
                "max_datagram_size must hold a full envelope ({} bytes minimum)",
                linkmesh::wire::HEADER_LEN + linkmesh::MAX_PAYLOAD
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LinkerConfig::default();
        assert_eq!(config.probe_timeout(), Duration::from_secs(1));
        assert_eq!(config.bootstrap_timeout(), Duration::from_secs(1));
        assert!(config.peers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_probe_timeout() {
        let config = LinkerConfig {
            probe_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_tiny_datagram_size() {
        let config = LinkerConfig {
            max_datagram_size: 128,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_mesh() {
        let mesh = MeshConfig {
            linkers: vec![
                "127.0.0.1:9310".into(),
                "127.0.0.1:9311".into(),
                "127.0.0.1:9312".into(),
            ],
        };
        let config = LinkerConfig::from_mesh(&mesh, 1).unwrap();
        assert_eq!(config.port, 9311);
        assert_eq!(
            config.peers,
            vec![
                NodeAddr::new("127.0.0.1", 9310),
                NodeAddr::new("127.0.0.1", 9312),
            ]
        );
    }

    #[test]
    fn test_from_mesh_bad_index() {
        let mesh = MeshConfig {
            linkers: vec!["127.0.0.1:9310".into()],
        };
        assert!(LinkerConfig::from_mesh(&mesh, 3).is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = LinkerConfig {
            port: 9310,
            peers: vec![NodeAddr::new("127.0.0.1", 9311)],
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: LinkerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.port, 9310);
        assert_eq!(parsed.peers, config.peers);
    }
}

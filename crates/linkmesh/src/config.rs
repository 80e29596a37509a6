// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared mesh configuration.
//!
//! Every participant - linker, service, client - reads the same JSON file
//! naming the full set of linkers:
//!
//! ```json
//! {
//!   "linkers": [
//!     "127.0.0.1:9310",
//!     "127.0.0.1:9311",
//!     "127.0.0.1:9312"
//!   ]
//! }
//! ```
//!
//! The list is static: linkers cannot be added after initialization, and
//! no participant discovers or forgets linkers at runtime.

use crate::addr::NodeAddr;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// The static list of linker endpoints, identical on every node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Linker addresses as `host:port` strings, in mesh order. A linker's
    /// identity is its index into this list.
    pub linkers: Vec<String>,
}

impl MeshConfig {
    /// Load the mesh file (JSON).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the list is non-empty and every entry parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.linkers.is_empty() {
            return Err(ConfigError::Invalid("linker list is empty".into()));
        }
        for entry in &self.linkers {
            entry
                .parse::<NodeAddr>()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    /// The full linker list as addresses.
    pub fn linker_addrs(&self) -> Result<Vec<NodeAddr>, ConfigError> {
        self.linkers
            .iter()
            .map(|entry| {
                entry
                    .parse::<NodeAddr>()
                    .map_err(|e| ConfigError::Invalid(e.to_string()))
            })
            .collect()
    }

    /// Split the list for the linker at `index`: its own address and the
    /// peer list (everyone else, in mesh order).
    pub fn split(&self, index: usize) -> Result<(NodeAddr, Vec<NodeAddr>), ConfigError> {
        let mut addrs = self.linker_addrs()?;
        if index >= addrs.len() {
            return Err(ConfigError::Invalid(format!(
                "linker index {} out of range ({} linkers configured)",
                index,
                addrs.len()
            )));
        }
        let own = addrs.remove(index);
        Ok((own, addrs))
    }
}

/// Configuration error types.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn mesh(entries: &[&str]) -> MeshConfig {
        MeshConfig {
            linkers: entries.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(mesh(&["127.0.0.1:9310", "127.0.0.1:9311"]).validate().is_ok());
    }

    #[test]
    fn test_validate_empty_list() {
        assert!(matches!(
            mesh(&[]).validate(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_validate_bad_entry() {
        assert!(mesh(&["127.0.0.1:9310", "not-an-address"]).validate().is_err());
    }

    #[test]
    fn test_split() {
        let config = mesh(&["h0:1", "h1:2", "h2:3"]);
        let (own, peers) = config.split(1).unwrap();
        assert_eq!(own, NodeAddr::new("h1", 2));
        assert_eq!(peers, vec![NodeAddr::new("h0", 1), NodeAddr::new("h2", 3)]);
    }

    #[test]
    fn test_split_out_of_range() {
        let config = mesh(&["h0:1"]);
        assert!(config.split(1).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"linkers": ["127.0.0.1:9310", "127.0.0.1:9311"]}}"#
        )
        .unwrap();

        let config = MeshConfig::from_file(file.path()).unwrap();
        assert_eq!(config.linkers.len(), 2);
    }

    #[test]
    fn test_from_file_missing() {
        let err = MeshConfig::from_file(Path::new("/nonexistent/linkers.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_from_file_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "linkers = nope").unwrap();
        assert!(matches!(
            MeshConfig::from_file(file.path()).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }
}

//! Bus network registry.
//!
//! `networks.json` is edited by hand and maps a network name to the
//! directory holding its lines and a display color:
//!
//! ```json
//! { "TaM": { "path": "tam", "color": "#0066cc" } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::InputError;

/// Registry entry as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct NetworkEntry {
    path: String,
    color: String,
}

/// A bus network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub name: String,
    /// Directory of the network's lines, relative to the lines root.
    pub path: String,
    pub color: String,
}

/// All known networks, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: Vec<Network>,
}

impl NetworkRegistry {
    /// Build a registry from networks; they are sorted by name.
    pub fn new(mut networks: Vec<Network>) -> Self {
        networks.sort_by(|a, b| a.name.cmp(&b.name));
        Self { networks }
    }

    /// Load the registry from a JSON file.
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let contents = std::fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| InputError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse the registry from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: BTreeMap<String, NetworkEntry> = serde_json::from_str(json)?;
        let networks = entries
            .into_iter()
            .map(|(name, e)| Network {
                name,
                path: e.path,
                color: e.color,
            })
            .collect();
        Ok(Self::new(networks))
    }

    /// Networks with their 1-based ids.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &Network)> {
        self.networks.iter().zip(1..).map(|(n, id)| (id, n))
    }

    /// Id of the first network whose path occurs in `source`.
    ///
    /// `source` is relative to the raw directory, so the directories above
    /// it never select a network.
    pub fn network_id_for(&self, source: &Path) -> Option<i64> {
        let source = source.to_string_lossy();
        self.iter()
            .find(|(_, n)| source.contains(n.path.as_str()))
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

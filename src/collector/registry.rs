// Logical-network registry: the networks the host is told to carry.

use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkRegistry {
    #[serde(default)]
    pub networks: BTreeMap<String, RegisteredNetwork>,
}

/// A bridged network's bridge carries the network's own name.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredNetwork {
    pub bridged: bool,
    #[serde(default)]
    pub iface: Option<String>,
}

impl NetworkRegistry {
    /// Loads the registry; a missing file means no networks are defined yet.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let s = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "network registry absent");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        Self::load_from_str(&s).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let registry: NetworkRegistry = toml::from_str(s)?;
        for (name, net) in &registry.networks {
            anyhow::ensure!(
                net.bridged || net.iface.as_deref().is_some_and(|i| !i.is_empty()),
                "bridgeless network {} must name its iface",
                name
            );
        }
        Ok(registry)
    }
}

// Typed failures of topology construction and queries.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Category of the entity a lookup expected to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Network,
    Bonding,
    Nic,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Network => "network",
            EntityKind::Bonding => "bonding",
            EntityKind::Nic => "nic",
        };
        f.write_str(s)
    }
}

/// The snapshot contradicts itself. Never repaired by the topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyViolation {
    #[error("network {network} rides on more than one vlan ({first}, {second})")]
    MultipleVlans {
        network: String,
        first: String,
        second: String,
    },
    #[error("network {network} reaches vlan {vlan} stacked on vlan {parent}")]
    NestedVlan {
        network: String,
        vlan: String,
        parent: String,
    },
    #[error("vlan {vlan} is named after {named} but reports parent {reported}")]
    VlanParentMismatch {
        vlan: String,
        named: String,
        reported: String,
    },
    #[error("network {network} rides on more than one bonding ({first}, {second})")]
    MultipleBondings {
        network: String,
        first: String,
        second: String,
    },
    #[error("nic {nic} is enslaved to more than one bonding: {}", .bondings.join(", "))]
    NicInMultipleBondings { nic: String, bondings: Vec<String> },
}

/// The snapshot lacks the structure a topology needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSnapshot {
    #[error("vlan name {0:?} is not of the form <parent>.<tag>")]
    VlanName(String),
    #[error("bridgeless network {0} has no backing iface")]
    MissingIface(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("unknown {kind} {name}")]
    NotFound { kind: EntityKind, name: String },
    #[error("inconsistent topology: {0}")]
    Consistency(#[from] ConsistencyViolation),
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] MalformedSnapshot),
}

impl TopologyError {
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        TopologyError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TopologyError::NotFound { .. })
    }

    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, TopologyError::Consistency(_))
    }
}

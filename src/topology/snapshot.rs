// Point-in-time facts about host network devices, as handed over by the collectors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat mappings from device name to attributes. The topology only relies on
/// key presence plus `bridged`/`ports`/`iface`/`slaves`; everything else is
/// carried for callers that render it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkAttrs>,
    #[serde(default)]
    pub vlans: BTreeMap<String, VlanAttrs>,
    #[serde(default)]
    pub nics: BTreeMap<String, NicAttrs>,
    #[serde(default)]
    pub bondings: BTreeMap<String, BondingAttrs>,
    #[serde(default)]
    pub bridges: BTreeMap<String, BridgeAttrs>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkAttrs {
    pub bridged: bool,
    /// Devices enslaved to the network's bridge (bridged networks only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// Backing device (bridgeless networks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
}

impl NetworkAttrs {
    pub fn bridged<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bridged: true,
            ports: ports.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn bridgeless(iface: impl Into<String>) -> Self {
        Self {
            bridged: false,
            iface: Some(iface.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VlanAttrs {
    /// Parent device the VLAN is layered on.
    pub iface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
}

impl VlanAttrs {
    pub fn on(parent: impl Into<String>) -> Self {
        Self {
            iface: parent.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NicAttrs {
    /// Link speed in Mb/s, 0 when unknown or down.
    #[serde(default)]
    pub speed: u64,
    #[serde(default)]
    pub hwaddr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permhwaddr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BondingAttrs {
    pub slaves: Vec<String>,
    #[serde(default)]
    pub hwaddr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
}

impl BondingAttrs {
    pub fn with_slaves<I, S>(slaves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slaves: slaves.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeAttrs {
    pub ports: Vec<String>,
    /// "on" or "off".
    #[serde(default)]
    pub stp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
}

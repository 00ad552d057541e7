// Typed device references, resolved once when a topology is built.

use super::error::MalformedSnapshot;
use serde::Serialize;

/// Highest assignable 802.1Q VLAN id.
const MAX_VLAN_ID: u16 = 4094;

/// What a device name refers to in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Device {
    Nic { name: String },
    Bonding { name: String },
    Vlan(Vlan),
    /// Present on a bridge but unknown to the snapshot (VM taps and the like).
    Other { name: String },
}

impl Device {
    pub fn name(&self) -> &str {
        match self {
            Device::Nic { name } | Device::Bonding { name } | Device::Other { name } => name,
            Device::Vlan(vlan) => vlan.name(),
        }
    }
}

/// A VLAN sub-interface named `<parent>.<tag>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vlan {
    name: String,
    parent: String,
    tag: String,
    #[serde(skip)]
    named_parent: String,
}

impl Vlan {
    /// Splits `name` on its first `.`; `parent` is the device the snapshot
    /// reports underneath it.
    pub fn parse(name: &str, parent: &str) -> Result<Self, MalformedSnapshot> {
        match name.split_once('.') {
            Some((named_parent, tag)) if !named_parent.is_empty() && !tag.is_empty() => Ok(Vlan {
                name: name.to_string(),
                parent: parent.to_string(),
                tag: tag.to_string(),
                named_parent: named_parent.to_string(),
            }),
            _ => Err(MalformedSnapshot::VlanName(name.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Parent as encoded in the VLAN's own name.
    pub fn named_parent(&self) -> &str {
        &self.named_parent
    }

    pub fn parent_matches_name(&self) -> bool {
        self.parent == self.named_parent
    }

    /// The tag as an 802.1Q id, if it is one.
    pub fn vlan_id(&self) -> Option<u16> {
        self.tag.parse::<u16>().ok().filter(|id| *id <= MAX_VLAN_ID)
    }
}

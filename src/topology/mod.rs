// Host network topology: networks, VLANs, bondings and NICs assembled from one snapshot.

mod device;
mod error;
mod snapshot;

pub use device::{Device, Vlan};
pub use error::{ConsistencyViolation, EntityKind, MalformedSnapshot, TopologyError};
pub use snapshot::{BondingAttrs, BridgeAttrs, NetworkAttrs, NicAttrs, Snapshot, VlanAttrs};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Where a network attaches to the host's devices.
#[derive(Debug, Clone)]
enum Attachment {
    Bridged(Vec<Device>),
    Bridgeless(Device),
}

impl Attachment {
    fn points(&self) -> &[Device] {
        match self {
            Attachment::Bridged(ports) => ports,
            Attachment::Bridgeless(iface) => std::slice::from_ref(iface),
        }
    }
}

/// The physical stack carrying one network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decomposition {
    pub nics: Vec<String>,
    pub vlan: Option<String>,
    pub bonding: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeGraph {
    pub bridge: String,
    pub ports: Vec<PortGraph>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortGraph {
    pub port: String,
    /// Bonding slaves under the port, after stripping a VLAN layer.
    pub slaves: Vec<String>,
}

/// Immutable view over a snapshot. Safe to share across threads; rebuild from
/// a fresh snapshot to observe changes.
#[derive(Debug, Clone)]
pub struct Topology {
    networks: BTreeMap<String, Attachment>,
    vlans: BTreeMap<String, Vlan>,
    nics: BTreeSet<String>,
    bondings: BTreeMap<String, Vec<String>>,
}

impl Topology {
    /// Resolves every device name a network refers to. Fails only when the
    /// snapshot is structurally malformed; contradictions surface at query time.
    pub fn build(snapshot: &Snapshot) -> Result<Self, TopologyError> {
        let vlans = snapshot
            .vlans
            .iter()
            .map(|(name, attrs)| Ok((name.clone(), Vlan::parse(name, &attrs.iface)?)))
            .collect::<Result<BTreeMap<_, _>, MalformedSnapshot>>()?;

        let mut topology = Topology {
            networks: BTreeMap::new(),
            vlans,
            nics: snapshot.nics.keys().cloned().collect(),
            bondings: snapshot
                .bondings
                .iter()
                .map(|(name, attrs)| (name.clone(), attrs.slaves.clone()))
                .collect(),
        };

        for (name, attrs) in &snapshot.networks {
            let attachment = if attrs.bridged {
                Attachment::Bridged(attrs.ports.iter().map(|p| topology.resolve(p)).collect())
            } else {
                let iface = attrs
                    .iface
                    .as_deref()
                    .ok_or_else(|| MalformedSnapshot::MissingIface(name.clone()))?;
                Attachment::Bridgeless(topology.resolve(iface))
            };
            topology.networks.insert(name.clone(), attachment);
        }

        Ok(topology)
    }

    /// Classifies a device name. VLANs win over bondings, bondings over NICs.
    pub fn resolve(&self, name: &str) -> Device {
        if let Some(vlan) = self.vlans.get(name) {
            Device::Vlan(vlan.clone())
        } else if self.bondings.contains_key(name) {
            Device::Bonding {
                name: name.to_string(),
            }
        } else if self.nics.contains(name) {
            Device::Nic {
                name: name.to_string(),
            }
        } else {
            Device::Other {
                name: name.to_string(),
            }
        }
    }

    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    pub fn nics(&self) -> impl Iterator<Item = &str> {
        self.nics.iter().map(String::as_str)
    }

    pub fn bondings(&self) -> impl Iterator<Item = &str> {
        self.bondings.keys().map(String::as_str)
    }

    pub fn vlans(&self) -> impl Iterator<Item = &Vlan> {
        self.vlans.values()
    }

    /// Networks carried by `device`, directly or through a VLAN on top of it,
    /// with the VLAN tag when one was crossed. Each network is reported once.
    pub fn networks_and_vlans_for_device<'a>(
        &'a self,
        device: &str,
    ) -> impl Iterator<Item = (&'a str, Option<&'a str>)> {
        self.networks.iter().filter_map(move |(network, attachment)| {
            attachment
                .points()
                .iter()
                .find_map(|point| match point {
                    Device::Vlan(vlan) if vlan.parent() == device => Some(Some(vlan.tag())),
                    point if point.name() == device => Some(None),
                    _ => None,
                })
                .map(|tag| (network.as_str(), tag))
        })
    }

    /// Tags of the VLANs layered directly on `device`.
    pub fn vlans_for_device<'a>(&'a self, device: &str) -> impl Iterator<Item = &'a str> {
        self.vlans
            .values()
            .filter(move |vlan| vlan.parent() == device)
            .map(Vlan::tag)
    }

    /// Networks whose bridge port or backing iface is exactly `device`.
    pub fn networks_for_device(&self, device: &str) -> BTreeSet<&str> {
        self.networks
            .iter()
            .filter(|(_, attachment)| attachment.points().iter().any(|p| p.name() == device))
            .map(|(network, _)| network.as_str())
            .collect()
    }

    pub fn bondings_for_nic<'a>(&'a self, nic: &str) -> impl Iterator<Item = &'a str> {
        self.bondings
            .iter()
            .filter(move |(_, slaves)| slaves.iter().any(|slave| slave == nic))
            .map(|(bonding, _)| bonding.as_str())
    }

    /// The bonding `nic` is enslaved to, if any.
    pub fn bonding_for_nic(&self, nic: &str) -> Result<Option<&str>, TopologyError> {
        let bondings: Vec<&str> = self.bondings_for_nic(nic).collect();
        match bondings.as_slice() {
            [] => Ok(None),
            [bonding] => Ok(Some(*bonding)),
            _ => Err(ConsistencyViolation::NicInMultipleBondings {
                nic: nic.to_string(),
                bondings: bondings.iter().map(|b| b.to_string()).collect(),
            }
            .into()),
        }
    }

    pub fn nics_for_bonding(&self, bonding: &str) -> Result<&[String], TopologyError> {
        self.bondings
            .get(bonding)
            .map(Vec::as_slice)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Bonding, bonding))
    }

    /// True when more than one network rides on `bonding`.
    pub fn is_bonding_shared(&self, bonding: &str) -> Result<bool, TopologyError> {
        if !self.bondings.contains_key(bonding) {
            return Err(TopologyError::not_found(EntityKind::Bonding, bonding));
        }
        Ok(self.networks_and_vlans_for_device(bonding).nth(1).is_some())
    }

    /// Walks `network` down to its NICs, collecting the single VLAN tag and
    /// bonding met on the way. Bridge ports unknown to the snapshot are skipped.
    pub fn decompose(&self, network: &str) -> Result<Decomposition, TopologyError> {
        let attachment = self
            .networks
            .get(network)
            .ok_or_else(|| TopologyError::not_found(EntityKind::Network, network))?;

        let mut result = Decomposition::default();
        let mut vlan_seen: Option<&str> = None;

        for point in attachment.points() {
            let device = match point {
                Device::Vlan(vlan) => {
                    let parent = self.resolve(vlan.parent());
                    if let Device::Vlan(inner) = &parent {
                        return Err(ConsistencyViolation::NestedVlan {
                            network: network.to_string(),
                            vlan: vlan.name().to_string(),
                            parent: inner.name().to_string(),
                        }
                        .into());
                    }
                    if !vlan.parent_matches_name() {
                        return Err(ConsistencyViolation::VlanParentMismatch {
                            vlan: vlan.name().to_string(),
                            named: vlan.named_parent().to_string(),
                            reported: vlan.parent().to_string(),
                        }
                        .into());
                    }
                    if let Some(first) = vlan_seen {
                        return Err(ConsistencyViolation::MultipleVlans {
                            network: network.to_string(),
                            first: first.to_string(),
                            second: vlan.name().to_string(),
                        }
                        .into());
                    }
                    vlan_seen = Some(vlan.name());
                    result.vlan = Some(vlan.tag().to_string());
                    parent
                }
                other => other.clone(),
            };

            match device {
                Device::Bonding { name } => {
                    if let Some(first) = &result.bonding {
                        return Err(ConsistencyViolation::MultipleBondings {
                            network: network.to_string(),
                            first: first.clone(),
                            second: name,
                        }
                        .into());
                    }
                    for slave in self.nics_for_bonding(&name)? {
                        if !self.nics.contains(slave) {
                            return Err(TopologyError::not_found(EntityKind::Nic, slave));
                        }
                        result.nics.push(slave.clone());
                    }
                    result.bonding = Some(name);
                }
                Device::Nic { name } => result.nics.push(name),
                // VLAN parents were checked above; ports unknown to the snapshot carry no NICs.
                Device::Vlan(_) | Device::Other { .. } => {}
            }
        }

        Ok(result)
    }

    pub fn bridgeless_networks(&self) -> BTreeSet<&str> {
        self.networks
            .iter()
            .filter(|(_, attachment)| matches!(attachment, Attachment::Bridgeless(_)))
            .map(|(network, _)| network.as_str())
            .collect()
    }

    /// Bridged networks with their ports and, for bonding ports, the slaves.
    pub fn graph(&self) -> Vec<BridgeGraph> {
        self.networks
            .iter()
            .filter_map(|(network, attachment)| match attachment {
                Attachment::Bridged(ports) => Some(BridgeGraph {
                    bridge: network.clone(),
                    ports: ports.iter().map(|port| self.port_graph(port)).collect(),
                }),
                Attachment::Bridgeless(_) => None,
            })
            .collect()
    }

    fn port_graph(&self, port: &Device) -> PortGraph {
        let lower = match port {
            Device::Vlan(vlan) => self.resolve(vlan.parent()),
            other => other.clone(),
        };
        let slaves = match &lower {
            Device::Bonding { name } => self.bondings.get(name).cloned().unwrap_or_default(),
            _ => Vec::new(),
        };
        PortGraph {
            port: port.name().to_string(),
            slaves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        let mut s = Snapshot::default();
        for nic in ["eth0", "eth1", "eth2", "eth3"] {
            s.nics.insert(nic.into(), NicAttrs::default());
        }
        s.bondings
            .insert("bond0".into(), BondingAttrs::with_slaves(["eth1", "eth2"]));
        s.vlans.insert("eth0.100".into(), VlanAttrs::on("eth0"));
        s.vlans.insert("bond0.200".into(), VlanAttrs::on("bond0"));
        s.networks
            .insert("ovirtmgmt".into(), NetworkAttrs::bridged(["eth3", "vnet0"]));
        s.networks
            .insert("red".into(), NetworkAttrs::bridgeless("eth0.100"));
        s.networks
            .insert("blue".into(), NetworkAttrs::bridged(["bond0.200"]));
        s.networks.insert("green".into(), NetworkAttrs::bridged(["bond0"]));
        s
    }

    #[test]
    fn resolve_classifies_names() {
        let topology = Topology::build(&snapshot()).unwrap();
        assert!(matches!(topology.resolve("eth0.100"), Device::Vlan(_)));
        assert!(matches!(topology.resolve("bond0"), Device::Bonding { .. }));
        assert!(matches!(topology.resolve("eth3"), Device::Nic { .. }));
        assert!(matches!(topology.resolve("vnet0"), Device::Other { .. }));
    }

    #[test]
    fn build_rejects_vlan_without_separator() {
        let mut s = snapshot();
        s.vlans.insert("vlan100".into(), VlanAttrs::on("eth0"));
        let err = Topology::build(&s).unwrap_err();
        assert_eq!(
            err,
            TopologyError::Malformed(MalformedSnapshot::VlanName("vlan100".into()))
        );
    }

    #[test]
    fn build_rejects_bridgeless_network_without_iface() {
        let mut s = snapshot();
        s.networks.insert("orphan".into(), NetworkAttrs::default());
        let err = Topology::build(&s).unwrap_err();
        assert_eq!(
            err,
            TopologyError::Malformed(MalformedSnapshot::MissingIface("orphan".into()))
        );
    }

    #[test]
    fn networks_and_vlans_for_device_unwraps_one_vlan() {
        let topology = Topology::build(&snapshot()).unwrap();
        let for_bond: Vec<_> = topology.networks_and_vlans_for_device("bond0").collect();
        assert_eq!(for_bond, vec![("blue", Some("200")), ("green", None)]);
        let for_eth0: Vec<_> = topology.networks_and_vlans_for_device("eth0").collect();
        assert_eq!(for_eth0, vec![("red", Some("100"))]);
        assert_eq!(topology.networks_and_vlans_for_device("eth9").count(), 0);
    }

    #[test]
    fn networks_for_device_is_direct_only() {
        let topology = Topology::build(&snapshot()).unwrap();
        assert_eq!(
            topology.networks_for_device("bond0"),
            BTreeSet::from(["green"])
        );
        assert_eq!(
            topology.networks_for_device("eth0.100"),
            BTreeSet::from(["red"])
        );
        assert!(topology.networks_for_device("eth0").is_empty());
    }

    #[test]
    fn vlans_for_device_lists_tags() {
        let topology = Topology::build(&snapshot()).unwrap();
        assert_eq!(topology.vlans_for_device("eth0").collect::<Vec<_>>(), vec!["100"]);
        assert_eq!(topology.vlans_for_device("eth3").count(), 0);
    }

    #[test]
    fn decompose_skips_ports_unknown_to_snapshot() {
        let topology = Topology::build(&snapshot()).unwrap();
        let d = topology.decompose("ovirtmgmt").unwrap();
        assert_eq!(d.nics, vec!["eth3"]);
        assert_eq!(d.vlan, None);
        assert_eq!(d.bonding, None);
    }

    #[test]
    fn decompose_vlan_over_bonding() {
        let topology = Topology::build(&snapshot()).unwrap();
        let d = topology.decompose("blue").unwrap();
        assert_eq!(
            d,
            Decomposition {
                nics: vec!["eth1".into(), "eth2".into()],
                vlan: Some("200".into()),
                bonding: Some("bond0".into()),
            }
        );
    }

    #[test]
    fn decompose_unknown_network_is_not_found() {
        let topology = Topology::build(&snapshot()).unwrap();
        let err = topology.decompose("nope").unwrap_err();
        assert_eq!(err, TopologyError::not_found(EntityKind::Network, "nope"));
    }

    #[test]
    fn decompose_rejects_two_bondings() {
        let mut s = snapshot();
        s.bondings
            .insert("bond1".into(), BondingAttrs::with_slaves(["eth3"]));
        s.networks
            .insert("twobonds".into(), NetworkAttrs::bridged(["bond0", "bond1"]));
        let topology = Topology::build(&s).unwrap();
        let err = topology.decompose("twobonds").unwrap_err();
        assert!(matches!(
            err,
            TopologyError::Consistency(ConsistencyViolation::MultipleBondings { .. })
        ));
    }

    #[test]
    fn decompose_rejects_vlan_on_vlan() {
        let mut s = snapshot();
        s.vlans
            .insert("eth0.100.5".into(), VlanAttrs::on("eth0.100"));
        s.networks
            .insert("qinq".into(), NetworkAttrs::bridgeless("eth0.100.5"));
        let topology = Topology::build(&s).unwrap();
        let err = topology.decompose("qinq").unwrap_err();
        assert!(matches!(
            err,
            TopologyError::Consistency(ConsistencyViolation::NestedVlan { .. })
        ));
    }

    #[test]
    fn decompose_rejects_vlan_reporting_foreign_parent() {
        let mut s = snapshot();
        s.vlans.insert("eth2.7".into(), VlanAttrs::on("eth1"));
        s.networks
            .insert("skewed".into(), NetworkAttrs::bridgeless("eth2.7"));
        let topology = Topology::build(&s).unwrap();
        let err = topology.decompose("skewed").unwrap_err();
        assert!(matches!(
            err,
            TopologyError::Consistency(ConsistencyViolation::VlanParentMismatch { .. })
        ));
    }

    #[test]
    fn bonding_sharing() {
        let topology = Topology::build(&snapshot()).unwrap();
        assert!(topology.is_bonding_shared("bond0").unwrap());
        assert!(topology.is_bonding_shared("bond9").unwrap_err().is_not_found());
    }

    #[test]
    fn graph_expands_bonding_behind_vlan() {
        let topology = Topology::build(&snapshot()).unwrap();
        let graph = topology.graph();
        assert_eq!(graph.len(), 3);
        let blue = graph.iter().find(|g| g.bridge == "blue").unwrap();
        assert_eq!(
            blue.ports,
            vec![PortGraph {
                port: "bond0.200".into(),
                slaves: vec!["eth1".into(), "eth2".into()],
            }]
        );
        let mgmt = graph.iter().find(|g| g.bridge == "ovirtmgmt").unwrap();
        assert!(mgmt.ports.iter().all(|p| p.slaves.is_empty()));
    }

    #[test]
    fn bridgeless_networks_only() {
        let topology = Topology::build(&snapshot()).unwrap();
        assert_eq!(topology.bridgeless_networks(), BTreeSet::from(["red"]));
    }
}

// Snapshot collection from /sys/class/net, /proc/net, sysinfo and the network registry.

mod linux;
pub mod parse;
mod registry;

pub use registry::{NetworkRegistry, RegisteredNetwork};

use crate::config::CollectorConfig;
use crate::topology::{BondingAttrs, BridgeAttrs, NetworkAttrs, NicAttrs, Snapshot, VlanAttrs};
use anyhow::Context;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysinfo::Networks;
use tracing::instrument;

/// Placeholder bridge kept by the host agent; never a real network.
const DUMMY_BRIDGE: &str = ";vdsmdummy;";

/// Gateway reported for devices without a default route.
const NO_GATEWAY: &str = "0.0.0.0";

pub struct SysfsCollector {
    sysfs_root: PathBuf,
    procfs_net_root: PathBuf,
    networks_file: PathBuf,
    hidden_nics: Vec<Regex>,
    fake_nics: Vec<Regex>,
    read_addresses: bool,
}

fn compile(patterns: &[String]) -> anyhow::Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| parse::glob_to_regex(p).with_context(|| format!("nic pattern {:?}", p)))
        .collect()
}

fn matches_any(name: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|re| re.is_match(name))
}

impl SysfsCollector {
    pub fn new(config: &CollectorConfig) -> anyhow::Result<Self> {
        Ok(Self {
            sysfs_root: PathBuf::from(&config.sysfs_root),
            procfs_net_root: PathBuf::from(&config.procfs_net_root),
            networks_file: PathBuf::from(&config.networks_file),
            hidden_nics: compile(&config.hidden_nics)?,
            fake_nics: compile(&config.fake_nics)?,
            read_addresses: config.read_addresses,
        })
    }

    fn dev_dir(&self, name: &str) -> PathBuf {
        self.sysfs_root.join(name)
    }

    fn interfaces(&self) -> Vec<String> {
        linux::list_names(&self.sysfs_root)
            .into_iter()
            .filter(|name| self.dev_dir(name).is_dir())
            .collect()
    }

    /// Physical NICs, minus hidden ones, plus device-less interfaces matching `fake_nics`.
    pub fn nics(&self) -> Vec<String> {
        self.interfaces()
            .into_iter()
            .filter(|name| {
                if self.dev_dir(name).join("device").exists() {
                    !matches_any(name, &self.hidden_nics)
                } else {
                    matches_any(name, &self.fake_nics)
                }
            })
            .collect()
    }

    pub fn bondings(&self) -> Vec<String> {
        self.interfaces()
            .into_iter()
            .filter(|name| self.dev_dir(name).join("bonding").is_dir())
            .collect()
    }

    pub fn vlans(&self) -> Vec<String> {
        self.interfaces()
            .into_iter()
            .filter(|name| name.contains('.'))
            .collect()
    }

    pub fn bridges(&self) -> Vec<String> {
        self.interfaces()
            .into_iter()
            .filter(|name| name != DUMMY_BRIDGE && self.dev_dir(name).join("bridge").is_dir())
            .collect()
    }

    pub fn ports(&self, bridge: &str) -> Vec<String> {
        linux::list_names(&self.dev_dir(bridge).join("brif"))
    }

    /// Parent of a VLAN per /proc/net/vlan, else the part of its name before the first `.`.
    pub fn vlan_parent(&self, vlan: &str) -> String {
        linux::read_trimmed(&self.procfs_net_root.join("vlan").join(vlan))
            .and_then(|content| parse::parse_vlan_device(&content))
            .unwrap_or_else(|| vlan.split_once('.').map_or(vlan, |(parent, _)| parent).to_string())
    }

    fn gateways(&self) -> BTreeMap<String, String> {
        linux::read_trimmed(&self.procfs_net_root.join("route"))
            .map(|content| parse::parse_default_gateways(&content))
            .unwrap_or_default()
    }

    fn permanent_addresses(&self, bondings: &[String]) -> BTreeMap<String, String> {
        bondings
            .iter()
            .filter_map(|bond| {
                linux::read_trimmed(&self.procfs_net_root.join("bonding").join(bond))
            })
            .flat_map(|content| parse::parse_permanent_addresses(&content))
            .collect()
    }

    /// First IPv4 address and netmask per interface.
    fn addresses(&self) -> HashMap<String, (String, String)> {
        if !self.read_addresses {
            return HashMap::new();
        }
        let networks = Networks::new_with_refreshed_list();
        networks
            .list()
            .iter()
            .filter_map(|(name, data)| {
                let ip = data.ip_networks().iter().find(|n| n.addr.is_ipv4())?;
                Some((
                    name.clone(),
                    (ip.addr.to_string(), parse::prefix_to_netmask(ip.prefix)),
                ))
            })
            .collect()
    }

    /// Takes a fresh snapshot of the host. Blocking: reads sysfs and procfs.
    #[instrument(skip(self), fields(collector = "sysfs", operation = "collect"))]
    pub fn collect(&self) -> anyhow::Result<Snapshot> {
        let registry = NetworkRegistry::load(&self.networks_file)?;
        let addresses = self.addresses();
        let address_of = |dev: &str| addresses.get(dev).cloned().unzip();
        let gateways = self.gateways();
        let gateway_of = |dev: &str| {
            Some(
                gateways
                    .get(dev)
                    .cloned()
                    .unwrap_or_else(|| NO_GATEWAY.to_string()),
            )
        };

        let mut snapshot = Snapshot::default();

        for (name, net) in &registry.networks {
            let attrs = if net.bridged {
                let dir = self.dev_dir(name);
                if !dir.join("brif").is_dir() {
                    tracing::info!(network = %name, "bridge no longer exists, not reporting network");
                    continue;
                }
                let (addr, netmask) = address_of(name);
                NetworkAttrs {
                    bridged: true,
                    ports: self.ports(name),
                    iface: None,
                    stp: Some(linux::read_stp_state(&dir)),
                    mtu: linux::read_mtu(&dir),
                    gateway: gateway_of(name),
                    addr,
                    netmask,
                }
            } else {
                let iface = net
                    .iface
                    .as_deref()
                    .with_context(|| format!("bridgeless network {} has no iface", name))?;
                let dir = self.dev_dir(iface);
                if !dir.is_dir() {
                    tracing::info!(network = %name, iface, "backing device no longer exists, not reporting network");
                    continue;
                }
                let (addr, netmask) = address_of(iface);
                NetworkAttrs {
                    bridged: false,
                    ports: Vec::new(),
                    iface: Some(iface.to_string()),
                    stp: None,
                    mtu: linux::read_mtu(&dir),
                    gateway: gateway_of(iface),
                    addr,
                    netmask,
                }
            };
            snapshot.networks.insert(name.clone(), attrs);
        }

        let bondings = self.bondings();
        let permanent = self.permanent_addresses(&bondings);

        for nic in self.nics() {
            let dir = self.dev_dir(&nic);
            let (addr, netmask) = address_of(&nic);
            let attrs = NicAttrs {
                speed: linux::read_speed(&dir),
                hwaddr: linux::read_hwaddr(&dir),
                permhwaddr: permanent.get(&nic).cloned(),
                mtu: linux::read_mtu(&dir),
                addr,
                netmask,
            };
            snapshot.nics.insert(nic, attrs);
        }

        for bond in bondings {
            let dir = self.dev_dir(&bond);
            let (addr, netmask) = address_of(&bond);
            let attrs = BondingAttrs {
                slaves: linux::read_slaves(&dir),
                hwaddr: linux::read_hwaddr(&dir),
                mtu: linux::read_mtu(&dir),
                addr,
                netmask,
            };
            snapshot.bondings.insert(bond, attrs);
        }

        for vlan in self.vlans() {
            let dir = self.dev_dir(&vlan);
            let (addr, netmask) = address_of(&vlan);
            let attrs = VlanAttrs {
                iface: self.vlan_parent(&vlan),
                mtu: linux::read_mtu(&dir),
                addr,
                netmask,
            };
            snapshot.vlans.insert(vlan, attrs);
        }

        for bridge in self.bridges() {
            let dir = self.dev_dir(&bridge);
            let attrs = BridgeAttrs {
                ports: self.ports(&bridge),
                stp: linux::read_stp_state(&dir),
                mtu: linux::read_mtu(&dir),
            };
            snapshot.bridges.insert(bridge, attrs);
        }

        tracing::debug!(
            networks = snapshot.networks.len(),
            nics = snapshot.nics.len(),
            bondings = snapshot.bondings.len(),
            vlans = snapshot.vlans.len(),
            bridges = snapshot.bridges.len(),
            "snapshot collected"
        );
        Ok(snapshot)
    }

    /// Runs [`collect`](Self::collect) on the blocking pool.
    pub async fn snapshot(self: &Arc<Self>) -> anyhow::Result<Snapshot> {
        let collector = self.clone();
        tokio::task::spawn_blocking(move || collector.collect())
            .await
            .map_err(|e| anyhow::anyhow!("collector task join: {}", e))?
    }

    pub fn sysfs_root(&self) -> &Path {
        &self.sysfs_root
    }
}

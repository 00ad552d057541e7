// Shared test helpers: a fake /sys/class/net and /proc/net tree

#![allow(dead_code)]

use hostnet::collector::SysfsCollector;
use hostnet::config::CollectorConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FakeHost {
    dir: TempDir,
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

impl FakeHost {
    pub fn new() -> Self {
        let host = FakeHost {
            dir: tempfile::tempdir().unwrap(),
        };
        fs::create_dir_all(host.sysfs()).unwrap();
        fs::create_dir_all(host.procfs()).unwrap();
        host
    }

    pub fn sysfs(&self) -> PathBuf {
        self.dir.path().join("sys/class/net")
    }

    pub fn procfs(&self) -> PathBuf {
        self.dir.path().join("proc/net")
    }

    pub fn networks_file(&self) -> PathBuf {
        self.dir.path().join("networks.toml")
    }

    fn dev(&self, name: &str) -> PathBuf {
        let dir = self.sysfs().join(name);
        fs::create_dir_all(&dir).unwrap();
        write(&dir.join("mtu"), "1500\n");
        dir
    }

    /// Physical NIC, link up.
    pub fn nic(&self, name: &str, speed: u64, hwaddr: &str) -> &Self {
        let dir = self.dev(name);
        fs::create_dir_all(dir.join("device")).unwrap();
        write(&dir.join("operstate"), "up\n");
        write(&dir.join("speed"), &format!("{}\n", speed));
        write(&dir.join("address"), &format!("{}\n", hwaddr));
        self
    }

    /// Interface without a backing device (loopback, taps, dummies).
    pub fn virtual_dev(&self, name: &str) -> &Self {
        self.dev(name);
        self
    }

    pub fn bond(&self, name: &str, slaves: &[&str]) -> &Self {
        let dir = self.dev(name);
        fs::create_dir_all(dir.join("bonding")).unwrap();
        write(&dir.join("address"), "00:1a:4a:16:01:51\n");
        for slave in slaves {
            write(&dir.join(format!("slave_{}", slave)), "");
        }
        self
    }

    pub fn vlan(&self, name: &str) -> &Self {
        self.dev(name);
        self
    }

    pub fn bridge(&self, name: &str, ports: &[&str]) -> &Self {
        let dir = self.dev(name);
        write(&dir.join("bridge/stp_state"), "0\n");
        fs::create_dir_all(dir.join("brif")).unwrap();
        for port in ports {
            write(&dir.join("brif").join(port), "");
        }
        self
    }

    pub fn registry(&self, content: &str) -> &Self {
        write(&self.networks_file(), content);
        self
    }

    pub fn proc_file(&self, relative: &str, content: &str) -> &Self {
        write(&self.procfs().join(relative), content);
        self
    }

    pub fn config(&self) -> CollectorConfig {
        CollectorConfig {
            networks_file: self.networks_file().to_string_lossy().into_owned(),
            sysfs_root: self.sysfs().to_string_lossy().into_owned(),
            procfs_net_root: self.procfs().to_string_lossy().into_owned(),
            hidden_nics: vec!["wlan*".into()],
            fake_nics: vec!["dummy_*".into()],
            read_addresses: false,
        }
    }

    pub fn collector(&self) -> SysfsCollector {
        SysfsCollector::new(&self.config()).unwrap()
    }
}

pub const REGISTRY: &str = r#"
[networks.ovirtmgmt]
bridged = true

[networks.blue]
bridged = true

[networks.red]
bridged = false
iface = "eth0.100"

[networks.gone]
bridged = true
"#;

/// eth0..eth3 with bond0 over eth1+eth2; ovirtmgmt bridges eth3 and a VM tap,
/// blue bridges bond0.200, red rides bridgeless on eth0.100. The registry also
/// names a network whose bridge no longer exists.
pub fn standard_host() -> FakeHost {
    let host = FakeHost::new();
    host.nic("eth0", 1000, "52:54:00:00:00:00")
        .nic("eth1", 10000, "52:54:00:00:00:01")
        .nic("eth2", 10000, "52:54:00:00:00:02")
        .nic("eth3", 1000, "52:54:00:00:00:03")
        .nic("wlan0", 300, "52:54:00:00:00:04")
        .virtual_dev("lo")
        .virtual_dev("dummy_0")
        .virtual_dev("vnet0")
        .bond("bond0", &["eth1", "eth2"])
        .vlan("eth0.100")
        .vlan("bond0.200")
        .bridge("ovirtmgmt", &["eth3", "vnet0"])
        .bridge("blue", &["bond0.200"])
        .bridge(";vdsmdummy;", &[])
        .registry(REGISTRY)
        .proc_file(
            "route",
            "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT\n\
ovirtmgmt\t00000000\t0100000A\t0003\t0\t0\t0\t00000000\t0\t0\t0\n",
        )
        .proc_file(
            "bonding/bond0",
            "Slave Interface: eth1\nPermanent HW addr: 52:54:00:aa:00:01\n\n\
Slave Interface: eth2\nPermanent HW addr: 52:54:00:aa:00:02\n",
        );
    host
}

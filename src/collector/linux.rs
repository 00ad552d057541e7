// Linux-specific helpers: per-device files under /sys/class/net.

use std::path::Path;

/// sysfs reports these when a link is down or its speed is unknown.
const UNKNOWN_SPEEDS: [i64; 2] = [(1 << 16) - 1, (1 << 32) - 1];

pub(super) fn read_trimmed(path: &Path) -> Option<String> {
    let v = std::fs::read_to_string(path).ok()?;
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    Some(v.to_string())
}

/// Names of the entries of a directory, sorted; empty when it cannot be read.
pub(super) fn list_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub(super) fn read_mtu(dev_dir: &Path) -> Option<u32> {
    read_trimmed(&dev_dir.join("mtu"))?.parse().ok()
}

pub(super) fn read_hwaddr(dev_dir: &Path) -> String {
    read_trimmed(&dev_dir.join("address")).unwrap_or_default()
}

pub(super) fn read_operstate(dev_dir: &Path) -> Option<String> {
    read_trimmed(&dev_dir.join("operstate"))
}

/// Whether the device's driver link points at a virtio device.
pub(super) fn is_virtio(dev_dir: &Path) -> bool {
    std::fs::read_link(dev_dir.join("device"))
        .map(|target| target.to_string_lossy().contains("virtio"))
        .unwrap_or(false)
}

/// Link speed in Mb/s for an operationally up, non-virtio NIC; 0 otherwise.
pub(super) fn read_speed(dev_dir: &Path) -> u64 {
    if read_operstate(dev_dir).as_deref() != Some("up") || is_virtio(dev_dir) {
        return 0;
    }
    if let Some(content) = read_trimmed(&dev_dir.join("speed"))
        && let Ok(mbps) = content.parse::<i64>()
        && mbps > 0
        && !UNKNOWN_SPEEDS.contains(&mbps)
    {
        return mbps as u64;
    }
    0
}

/// "on" when spanning tree is enabled on a bridge, "off" otherwise.
pub(super) fn read_stp_state(bridge_dir: &Path) -> String {
    match read_trimmed(&bridge_dir.join("bridge").join("stp_state")).as_deref() {
        Some("1") => "on".into(),
        _ => "off".into(),
    }
}

/// Slaves of a bonding master, from its `slave_<nic>` links or, failing that,
/// from `bonding/slaves`.
pub(super) fn read_slaves(bond_dir: &Path) -> Vec<String> {
    let from_links: Vec<String> = list_names(bond_dir)
        .into_iter()
        .filter_map(|name| name.strip_prefix("slave_").map(str::to_string))
        .collect();
    if !from_links.is_empty() {
        return from_links;
    }
    read_trimmed(&bond_dir.join("bonding").join("slaves"))
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

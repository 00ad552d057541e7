// Parsers for /proc/net text files and NIC name patterns.

use regex::Regex;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Default gateway per interface from the contents of /proc/net/route.
/// Addresses in that file are little-endian hex.
pub fn parse_default_gateways(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.trim_end().split('\t');
            let iface = fields.next()?;
            let destination = fields.next()?;
            let gateway = fields.next()?;
            if destination != "00000000" || gateway == "00000000" {
                return None;
            }
            let raw = u32::from_str_radix(gateway, 16).ok()?;
            Some((iface.to_string(), Ipv4Addr::from(raw.to_le_bytes()).to_string()))
        })
        .collect()
}

/// Slave name to permanent hardware address (upper-cased) from /proc/net/bonding/<bond>.
pub fn parse_permanent_addresses(content: &str) -> BTreeMap<String, String> {
    let mut addresses = BTreeMap::new();
    let mut slave: Option<&str> = None;
    for line in content.lines() {
        if let Some(name) = line.strip_prefix("Slave Interface: ") {
            slave = Some(name.trim());
        } else if let Some(addr) = line.strip_prefix("Permanent HW addr: ")
            && let Some(name) = slave
        {
            addresses.insert(name.to_string(), addr.trim().to_uppercase());
        }
    }
    addresses
}

/// Parent device from /proc/net/vlan/<vlan> ("Device: eth0").
pub fn parse_vlan_device(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (_, rest) = line.split_once("Device:")?;
        rest.split_whitespace().next().map(str::to_string)
    })
}

/// Dotted-quad netmask for a prefix length; out of range prefixes clamp to /32.
pub fn prefix_to_netmask(prefix: u8) -> String {
    let bits = match prefix.min(32) {
        0 => 0,
        p => u32::MAX << (32 - u32::from(p)),
    };
    Ipv4Addr::from(bits).to_string()
}

/// Compiles a shell-style pattern (`*`, `?`) into an anchored regex.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re)
}

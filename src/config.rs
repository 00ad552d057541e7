use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub collector: CollectorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// TOML registry of logical networks (name, bridged, iface).
    pub networks_file: String,
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: String,
    #[serde(default = "default_procfs_net_root")]
    pub procfs_net_root: String,
    /// Glob patterns of physical NICs never reported.
    #[serde(default)]
    pub hidden_nics: Vec<String>,
    /// Glob patterns of device-less interfaces reported as NICs anyway.
    #[serde(default)]
    pub fake_nics: Vec<String>,
    /// Read IPv4 addresses of devices through sysinfo.
    #[serde(default = "default_read_addresses")]
    pub read_addresses: bool,
}

fn default_sysfs_root() -> String {
    "/sys/class/net".into()
}

fn default_procfs_net_root() -> String {
    "/proc/net".into()
}

fn default_read_addresses() -> bool {
    true
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            !self.collector.networks_file.is_empty(),
            "collector.networks_file must be non-empty"
        );
        anyhow::ensure!(
            !self.collector.sysfs_root.is_empty(),
            "collector.sysfs_root must be non-empty"
        );
        anyhow::ensure!(
            !self.collector.procfs_net_root.is_empty(),
            "collector.procfs_net_root must be non-empty"
        );
        for (key, patterns) in [
            ("hidden_nics", &self.collector.hidden_nics),
            ("fake_nics", &self.collector.fake_nics),
        ] {
            anyhow::ensure!(
                patterns.iter().all(|p| !p.trim().is_empty()),
                "collector.{} must not contain empty patterns",
                key
            );
        }
        Ok(())
    }
}

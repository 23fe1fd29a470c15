use crate::prelude::*;
use crate::lsw3::transport::{TcpTransport, DEFAULT_PORT, DEFAULT_TIMEOUT};

use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::collections::HashSet;
use std::time::Duration;

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub inverters: Vec<Inverter>,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,

    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "Config::default_scan_interval")]
    pub scan_interval: Duration,

    /// Optional path the latest snapshot is written to as JSON. `{serial}`
    /// is replaced by the logger serial.
    pub snapshot_file: Option<String>,
}

// Inverter {{{
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Inverter {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    pub host: String,
    #[serde(default = "Config::default_port")]
    pub port: u16,
    pub serial: Serial,

    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "Config::default_read_timeout")]
    pub read_timeout: Duration,
}
impl Inverter {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn serial(&self) -> Serial {
        self.serial
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn transport(&self) -> TcpTransport {
        TcpTransport::new(self.host.clone(), self.port, self.read_timeout)
    }

    pub fn coordinator(&self) -> Result<Coordinator<TcpTransport>> {
        Coordinator::new(self.serial, self.transport())
    }
} // }}}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("config.rs:error reading {}: {}", file, err))?;

        Self::from_yaml(&content)
    }

    /// Log the effective configuration. Called once logging is up.
    pub fn describe(&self) {
        info!("Configuration loaded successfully:");
        info!(
            "  Inverters: {} configured, {} enabled",
            self.inverters.len(),
            self.enabled_inverters().len()
        );
        for (i, inv) in self.inverters.iter().enumerate() {
            info!("    Inverter[{}]:", i);
            info!("      Enabled: {}", inv.enabled);
            info!("      Host: {}", inv.host);
            info!("      Port: {}", inv.port);
            info!("      Serial: {}", inv.serial);
            info!("      Read Timeout: {}s", inv.read_timeout.as_secs());
        }
        info!("  Scan Interval: {}s", self.scan_interval.as_secs());
        info!(
            "  Snapshot File: {}",
            self.snapshot_file.as_deref().unwrap_or("none")
        );
        info!("  Log Level: {}", self.loglevel);
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|err| anyhow!("config.rs:invalid configuration: {}", err))?;
        config.validate()?;
        Ok(config)
    }

    pub fn enabled_inverters(&self) -> Vec<Inverter> {
        self.inverters.iter().filter(|i| i.enabled()).cloned().collect()
    }

    pub fn loglevel(&self) -> &str {
        &self.loglevel
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    pub fn snapshot_file(&self) -> Option<&str> {
        self.snapshot_file.as_deref()
    }

    fn validate(&self) -> Result<()> {
        if self.enabled_inverters().is_empty() {
            bail!("config.rs:no enabled inverters configured");
        }

        if self.scan_interval.is_zero() {
            bail!("config.rs:scan_interval must be at least 1 second");
        }

        let mut serials = HashSet::new();
        for (i, inv) in self.inverters.iter().enumerate() {
            if !inv.enabled {
                continue;
            }
            if inv.host.is_empty() {
                bail!("config.rs:inverter[{}].host cannot be empty", i);
            }
            if inv.port == 0 {
                bail!("config.rs:inverter[{}].port must be between 1 and 65535", i);
            }
            if inv.read_timeout.is_zero() {
                bail!("config.rs:inverter[{}].read_timeout must be at least 1 second", i);
            }
            if !serials.insert(inv.serial) {
                bail!("config.rs:inverter[{}].serial {} is configured twice", i, inv.serial);
            }
        }

        if let Some(path) = &self.snapshot_file {
            if path.is_empty() {
                bail!("config.rs:snapshot_file cannot be empty");
            }
            if self.enabled_inverters().len() > 1 && !path.contains("{serial}") {
                bail!("config.rs:snapshot_file needs {{serial}} with several inverters enabled");
            }
        }

        Ok(())
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_port() -> u16 {
        DEFAULT_PORT
    }

    fn default_read_timeout() -> Duration {
        DEFAULT_TIMEOUT
    }

    fn default_scan_interval() -> Duration {
        Duration::from_secs(30)
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }
}

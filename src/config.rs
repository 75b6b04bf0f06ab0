use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::security::RealIp;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize)]
pub struct Config {
    pub listen: ListenConfig,
    #[serde(default)]
    pub real_ip: RealIpConfig,
}

#[derive(Deserialize)]
pub struct ListenConfig {
    pub ip: String,
    pub port: u16,
    pub tls: Option<TlsConfig>,
}

#[derive(Deserialize)]
pub struct TlsConfig {
    pub cert_file: String,
    pub key_file: String,
}

/// Headers in priority order, and the proxy networks allowed to set them.
#[derive(Default, Deserialize)]
pub struct RealIpConfig {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub trusted_networks: Vec<String>,
}

impl RealIpConfig {
    pub fn build(&self) -> Result<RealIp> {
        RealIp::new(self.headers.iter().cloned(), &self.trusted_networks)
            .context("Invalid real_ip.trusted_networks")
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).context("Failed to parse configuration as valid TOML")
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
}

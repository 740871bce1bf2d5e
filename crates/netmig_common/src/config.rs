//! Configuration management for netmigctl.
//!
//! Loads settings from /etc/netmig/config.toml or uses defaults. Every
//! field has a default, so a file only needs the values it changes. A
//! partial step section is merged over that step's own defaults.

use crate::poll::PollSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/netmig/config.toml";

/// Time budget of one polled step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollConfig {
    /// Wall-clock budget in seconds
    pub timeout_secs: u64,

    /// Sleep between attempts in seconds, at least 1
    pub delay_secs: u64,

    /// Optional attempt cap
    pub max_attempts: Option<u32>,
}

/// One `[step]` table as written in the file
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PollSection {
    timeout_secs: Option<u64>,
    delay_secs: Option<u64>,
    max_attempts: Option<u32>,
}

impl PollConfig {
    pub const fn new(timeout_secs: u64, delay_secs: u64) -> Self {
        Self {
            timeout_secs,
            delay_secs,
            max_attempts: None,
        }
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_overrides(
        mut self,
        timeout_secs: Option<u64>,
        delay_secs: Option<u64>,
        max_attempts: Option<u32>,
    ) -> Self {
        if let Some(t) = timeout_secs {
            self.timeout_secs = t;
        }
        if let Some(d) = delay_secs {
            self.delay_secs = d;
        }
        if max_attempts.is_some() {
            self.max_attempts = max_attempts;
        }
        self
    }

    /// Convert to PollSettings for use with PollDriver
    pub fn to_settings(&self) -> PollSettings {
        PollSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            delay: Duration::from_secs(self.delay_secs),
            max_attempts: self.max_attempts,
        }
    }
}

fn default_oc_path() -> String {
    "oc".to_string()
}

fn default_migration() -> PollConfig {
    PollConfig {
        max_attempts: Some(3),
        ..PollConfig::new(60, 3)
    }
}

fn default_provider() -> PollConfig {
    PollConfig::new(120, 3)
}

fn default_network_config() -> PollConfig {
    PollConfig::new(120, 3)
}

fn default_machine_config() -> PollConfig {
    PollConfig::new(300, 10)
}

fn default_machine_config_marker() -> PollConfig {
    PollConfig::new(300, 3)
}

fn default_mco() -> PollConfig {
    PollConfig::new(2700, 10)
}

fn default_network_co() -> PollConfig {
    PollConfig::new(600, 10)
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConfigFile")]
pub struct Config {
    /// Path or name of the `oc` binary
    pub oc_path: String,

    /// check-migration
    pub migration: PollConfig,

    /// check-provider
    pub provider: PollConfig,

    /// patch-network, applied to the patch and the namespace delete
    pub network_config: PollConfig,

    /// verify-machine-config, node rollout poll
    pub machine_config: PollConfig,

    /// verify-machine-config, nested boot marker poll per node
    pub machine_config_marker: PollConfig,

    /// wait-mco
    pub mco: PollConfig,

    /// wait-network-co
    pub network_co: PollConfig,
}

/// Config file layout before step defaults are applied
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    oc_path: Option<String>,
    migration: Option<PollSection>,
    provider: Option<PollSection>,
    network_config: Option<PollSection>,
    machine_config: Option<PollSection>,
    machine_config_marker: Option<PollSection>,
    mco: Option<PollSection>,
    network_co: Option<PollSection>,
}

fn merge_section(
    name: &str,
    base: PollConfig,
    section: Option<PollSection>,
) -> Result<PollConfig, String> {
    let section = section.unwrap_or_default();
    if section.delay_secs == Some(0) {
        return Err(format!("[{}] delay_secs must be at least 1", name));
    }
    Ok(base.with_overrides(
        section.timeout_secs,
        section.delay_secs,
        section.max_attempts,
    ))
}

impl TryFrom<ConfigFile> for Config {
    type Error = String;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        Ok(Self {
            oc_path: file.oc_path.unwrap_or_else(default_oc_path),
            migration: merge_section("migration", default_migration(), file.migration)?,
            provider: merge_section("provider", default_provider(), file.provider)?,
            network_config: merge_section(
                "network_config",
                default_network_config(),
                file.network_config,
            )?,
            machine_config: merge_section(
                "machine_config",
                default_machine_config(),
                file.machine_config,
            )?,
            machine_config_marker: merge_section(
                "machine_config_marker",
                default_machine_config_marker(),
                file.machine_config_marker,
            )?,
            mco: merge_section("mco", default_mco(), file.mco)?,
            network_co: merge_section("network_co", default_network_co(), file.network_co)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oc_path: default_oc_path(),
            migration: default_migration(),
            provider: default_provider(),
            network_config: default_network_config(),
            machine_config: default_machine_config(),
            machine_config_marker: default_machine_config_marker(),
            mco: default_mco(),
            network_co: default_network_co(),
        }
    }
}

impl Config {
    /// Load config from the default path, falling back to defaults
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH).unwrap_or_else(|e| {
            warn!("Config not loaded, using defaults: {:#}", e);
            Config::default()
        })
    }

    /// Load config from a specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

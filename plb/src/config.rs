//! Configuration loading for the `plb` daemon/CLI.
//!
//! Three TOML sections (`[proxmox]`, `[balancing]`, `[service]`), loaded
//! from the path given via `--config`, then layered with environment
//! variable overrides for the credential fields, following
//! `HorcruxConfig::load`'s default→file→env-override pattern.

use plb_core::error::PlbError;
use plb_core::model::{Dimension, Mode, Policy};
use plb_core::snapshot::SnapshotConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct PlbConfig {
    pub proxmox: ProxmoxConfig,
    #[serde(default)]
    pub balancing: BalancingConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxmoxConfig {
    pub api_host: String,
    pub api_user: String,
    pub api_pass: String,
    #[serde(default)]
    pub verify_ssl: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalancingConfig {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_balanciness")]
    pub balanciness: u32,
    #[serde(default)]
    pub ignore_nodes: String,
    #[serde(default)]
    pub ignore_vms: String,
}

fn default_method() -> String {
    "memory".to_string()
}

fn default_mode() -> String {
    "used".to_string()
}

fn default_balanciness() -> u32 {
    10
}

impl Default for BalancingConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            mode: default_mode(),
            balanciness: default_balanciness(),
            ignore_nodes: String::new(),
            ignore_vms: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_daemon")]
    pub daemon: bool,
    #[serde(default = "default_schedule")]
    pub schedule: u64,
    #[serde(default = "default_log_verbosity")]
    pub log_verbosity: String,
}

fn default_daemon() -> bool {
    true
}

fn default_schedule() -> u64 {
    24
}

fn default_log_verbosity() -> String {
    "CRITICAL".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            daemon: default_daemon(),
            schedule: default_schedule(),
            log_verbosity: default_log_verbosity(),
        }
    }
}

/// Split a comma-separated config field into its entries, dropping blanks.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl PlbConfig {
    pub fn load(path: &Path) -> Result<Self, PlbError> {
        if !path.exists() {
            return Err(PlbError::ConfigMissing(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| PlbError::ConfigMissing(format!("{}: {e}", path.display())))?;

        let mut config: PlbConfig =
            toml::from_str(&contents).map_err(|e| PlbError::ConfigParse(e.to_string()))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("PLB_PROXMOX_API_HOST") {
            self.proxmox.api_host = host;
        }
        if let Ok(user) = std::env::var("PLB_PROXMOX_API_USER") {
            self.proxmox.api_user = user;
        }
        if let Ok(pass) = std::env::var("PLB_PROXMOX_API_PASS") {
            self.proxmox.api_pass = pass;
        }
        if let Ok(verify) = std::env::var("PLB_PROXMOX_VERIFY_SSL") {
            self.proxmox.verify_ssl = verify == "1";
        }
    }

    fn validate(&self) -> Result<(), PlbError> {
        if self.proxmox.api_host.is_empty() {
            return Err(PlbError::ConfigKey("proxmox.api_host".to_string()));
        }
        if self.proxmox.api_user.is_empty() {
            return Err(PlbError::ConfigKey("proxmox.api_user".to_string()));
        }
        if self.proxmox.api_pass.is_empty() {
            return Err(PlbError::ConfigKey("proxmox.api_pass".to_string()));
        }
        self.policy()?;
        Ok(())
    }

    /// Parse `[balancing]` into the engine's `Policy`, rejecting unknown
    /// method/mode values as `InvalidPolicy`.
    pub fn policy(&self) -> Result<Policy, PlbError> {
        let method = match self.balancing.method.as_str() {
            "cpu" => Dimension::Cpu,
            "memory" => Dimension::Memory,
            "disk" => Dimension::Disk,
            other => return Err(PlbError::InvalidPolicy(format!("unknown method '{other}'"))),
        };
        let mode = match self.balancing.mode.as_str() {
            "used" => Mode::Used,
            "assigned" => Mode::Assigned,
            other => return Err(PlbError::InvalidPolicy(format!("unknown mode '{other}'"))),
        };
        Ok(Policy { method, mode, balanciness: self.balancing.balanciness })
    }

    pub fn snapshot_config(&self) -> SnapshotConfig {
        SnapshotConfig {
            ignore_nodes: split_list(&self.balancing.ignore_nodes),
            ignore_vms: split_list(&self.balancing.ignore_vms),
        }
    }
}

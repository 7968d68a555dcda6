//! Fleet configuration model

use crate::error::{ConfigError, ConfigResult};
use crate::model::is_valid_host_name;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Total thread budget for the whole fleet run when none is configured
pub const DEFAULT_TOTAL_THREADS: u32 = 8192;

/// Per-host thread budget for single-host runs (8192 / 13 hosts, rounded to 8 × 79)
pub const SINGLE_HOST_DEFAULT_THREADS: u32 = 632;

/// Configuration as it appears in the YAML document (or as assembled from CLI flags)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConfig {
    /// Ordered host list; position = fleet index
    pub hosts: Vec<String>,

    /// Ordered storage server addresses; position N-1 maps to `mountN`
    pub ip_addresses: Vec<String>,

    /// Local directory under which `mountN` directories are created
    pub mount_base: PathBuf,

    /// Total thread budget to spread across the mount points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_threads: Option<i64>,

    /// Extra options passed to `mount -o`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_options: Option<String>,

    /// When set, each host only exercises its own slice of `ip_addresses`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ips_per_host: Option<usize>,
}

/// Validated fleet configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetConfig {
    pub hosts: Vec<String>,
    pub ip_addresses: Vec<String>,
    pub mount_base: PathBuf,
    pub total_threads: u32,
    pub mount_options: Option<String>,
    pub ips_per_host: Option<usize>,
}

impl FleetConfig {
    /// Validate a raw configuration.
    ///
    /// `default_threads` is used when the document does not set `total_threads`;
    /// fleet and single-host invocations pass different defaults.
    pub fn from_raw(raw: RawConfig, default_threads: u32) -> ConfigResult<Self> {
        if raw.hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        check_unique(
            &raw.hosts,
            ConfigError::EmptyHost,
            ConfigError::DuplicateHost,
        )?;
        if let Some(bad) = raw.hosts.iter().find(|h| !is_valid_host_name(h)) {
            return Err(ConfigError::InvalidHostName(bad.clone()));
        }

        if raw.ip_addresses.is_empty() {
            return Err(ConfigError::NoAddresses);
        }
        check_unique(
            &raw.ip_addresses,
            ConfigError::EmptyAddress,
            ConfigError::DuplicateAddress,
        )?;

        if !raw.mount_base.is_absolute() {
            return Err(ConfigError::RelativeMountBase(raw.mount_base));
        }

        let total_threads = match raw.total_threads {
            None => default_threads,
            Some(n) => u32::try_from(n)
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidThreadBudget(n))?,
        };
        if total_threads == 0 {
            return Err(ConfigError::InvalidThreadBudget(0));
        }

        if raw.ips_per_host == Some(0) {
            return Err(ConfigError::InvalidIpsPerHost);
        }

        let mount_options = raw
            .mount_options
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());

        Ok(Self {
            hosts: raw.hosts,
            ip_addresses: raw.ip_addresses,
            mount_base: raw.mount_base,
            total_threads,
            mount_options,
            ips_per_host: raw.ips_per_host,
        })
    }

    /// Fleet index of a host
    pub fn host_index(&self, host: &str) -> Option<usize> {
        self.hosts.iter().position(|h| h == host)
    }

    /// 1-indexed mount number of an address
    pub fn mount_number(&self, ip: &str) -> Option<usize> {
        self.ip_addresses.iter().position(|a| a == ip).map(|i| i + 1)
    }
}

fn check_unique(
    items: &[String],
    empty: impl Fn(usize) -> ConfigError,
    duplicate: impl Fn(String) -> ConfigError,
) -> ConfigResult<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if item.trim().is_empty() {
            return Err(empty(i));
        }
        if !seen.insert(item.as_str()) {
            return Err(duplicate(item.clone()));
        }
    }
    Ok(())
}

pub mod error;

pub use error::*;

use fiobalance_core::{FleetConfig, RawConfig};
use std::path::{Path, PathBuf};

/// Environment variable pointing directly at a configuration file
pub const CONFIG_ENV: &str = "FIO_BALANCER_CONFIG";

const APP_DIR: &str = "fio-balancer";
const GLOBAL_CONFIG_FILE: &str = "config.yaml";
const CANDIDATES: [&str; 3] = [
    "fio-balancer.local.yaml",
    "fio-balancer.yaml",
    ".fio-balancer.yaml",
];

/// Per-user configuration file (`~/.config/fio-balancer/config.yaml`)
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(GLOBAL_CONFIG_FILE))
}

/// Locate the configuration file.
///
/// Search order:
/// 1. `FIO_BALANCER_CONFIG` (direct path)
/// 2. current directory: fio-balancer.local.yaml, fio-balancer.yaml, .fio-balancer.yaml
/// 3. ~/.config/fio-balancer/config.yaml
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(path = %path.display(), "{} points at a missing file", CONFIG_ENV);
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Some(global_config) = user_config_path()
        && global_config.exists()
    {
        return Ok(global_config);
    }

    Err(LoadError::ConfigFileNotFound)
}

/// Read and parse a configuration document without validating it
pub fn load_raw(path: &Path) -> Result<RawConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Command-line values that take precedence over the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub mount_base: Option<PathBuf>,
    pub total_threads: Option<u32>,
    pub mount_options: Option<String>,
    pub ips_per_host: Option<usize>,
}

impl Overrides {
    pub fn apply(&self, raw: &mut RawConfig) {
        if let Some(base) = &self.mount_base {
            raw.mount_base = base.clone();
        }
        if let Some(threads) = self.total_threads {
            raw.total_threads = Some(i64::from(threads));
        }
        if let Some(options) = &self.mount_options {
            raw.mount_options = Some(options.clone());
        }
        if let Some(n) = self.ips_per_host {
            raw.ips_per_host = Some(n);
        }
    }
}

/// Read, parse and validate a configuration document
pub fn load(path: &Path, default_threads: u32, overrides: &Overrides) -> Result<FleetConfig> {
    let mut raw = load_raw(path)?;
    overrides.apply(&mut raw);
    let config = FleetConfig::from_raw(raw, default_threads).map_err(|source| {
        LoadError::Invalid {
            path: path.to_path_buf(),
            source,
        }
    })?;

    tracing::info!(
        path = %path.display(),
        hosts = config.hosts.len(),
        ips = config.ip_addresses.len(),
        total_threads = config.total_threads,
        "loaded configuration"
    );

    Ok(config)
}

/// Load from an explicit path, or discover one
pub fn load_or_discover(
    explicit: Option<&Path>,
    default_threads: u32,
    overrides: &Overrides,
) -> Result<FleetConfig> {
    match explicit {
        Some(path) => load(path, default_threads, overrides),
        None => load(&find_config_file()?, default_threads, overrides),
    }
}

//! Fatal error types raised before any mount is attempted

use std::path::PathBuf;
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("host list is empty")]
    NoHosts,

    #[error("host list contains an empty entry at position {0}")]
    EmptyHost(usize),

    #[error("host '{0}' is listed more than once")]
    DuplicateHost(String),

    #[error("host '{0}' is not a plain directory name")]
    InvalidHostName(String),

    #[error("ip_addresses is empty")]
    NoAddresses,

    #[error("ip_addresses contains an empty entry at position {0}")]
    EmptyAddress(usize),

    #[error("ip address '{0}' is listed more than once")]
    DuplicateAddress(String),

    #[error("mount_base must be an absolute path: {}", .0.display())]
    RelativeMountBase(PathBuf),

    #[error("total_threads must be a positive integer, got {0}")]
    InvalidThreadBudget(i64),

    #[error("ips_per_host must be a positive integer")]
    InvalidIpsPerHost,
}

/// Allocation planning errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanningError {
    #[error("no ip addresses selected for host '{host}'")]
    NoAddresses { host: String },

    #[error(
        "total_threads ({total}) is smaller than the number of mount points ({mounts}); \
         every mount point needs at least one thread"
    )]
    InsufficientThreads { total: u32, mounts: usize },

    #[error("ip address '{0}' is not part of the configured ip_addresses")]
    UnknownAddress(String),

    #[error("ip address '{0}' was given more than once")]
    DuplicateAddress(String),

    #[error("host '{0}' is not part of the configured host list")]
    UnknownHost(String),

    #[error("host '{0}' is not a plain directory name")]
    InvalidHostName(String),

    #[error("host '{0}' has no fleet index; per-host partitioning needs a host from the fleet")]
    MissingFleetIndex(String),

    #[error("expected {expected} mount points, got {actual}")]
    MountCountMismatch { expected: usize, actual: usize },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type PlanResult<T> = std::result::Result<T, PlanningError>;

//! fio-balancer core
//!
//! Validated fleet configuration, the thread allocation planner and the
//! per-invocation mount bookkeeping shared by the mount and runner crates.
//!
//! # Example
//!
//! ```
//! use fiobalance_core::{FleetConfig, HostIdentity, IpSelection, RawConfig, plan};
//!
//! let raw = RawConfig {
//!     hosts: vec!["client01".into()],
//!     ip_addresses: vec!["10.0.0.1".into(), "10.0.0.2".into()],
//!     mount_base: "/mnt".into(),
//!     total_threads: Some(9),
//!     ..Default::default()
//! };
//! let config = FleetConfig::from_raw(raw, fiobalance_core::DEFAULT_TOTAL_THREADS).unwrap();
//! let host = HostIdentity::in_fleet(&config, "client01").unwrap();
//!
//! let assignments = plan(&config, &host, &IpSelection::All).unwrap();
//! assert_eq!(assignments[0].threads, 5);
//! assert_eq!(assignments[1].threads, 4);
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod planner;
pub mod state;

pub use config::{
    DEFAULT_TOTAL_THREADS, FleetConfig, RawConfig, SINGLE_HOST_DEFAULT_THREADS,
};
pub use error::{ConfigError, ConfigResult, PlanResult, PlanningError};
pub use model::{
    AssignmentState, EXPORT_PREFIX, HostIdentity, JobResult, MountAssignment, ThroughputSummary,
    is_valid_host_name,
};
pub use planner::{IpSelection, check_mount_count, distribute_threads, plan};
pub use state::MountState;

//! Data model shared between planner, mount manager and job runner

use crate::config::FleetConfig;
use crate::error::{PlanResult, PlanningError};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Local mount directory and remote export prefix (`mountN`)
pub const EXPORT_PREFIX: &str = "mount";

/// A host name is used as a directory inside each share, so it must be a
/// single plain path component.
pub fn is_valid_host_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.ends_with('/')
}

/// The host this invocation runs on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostIdentity {
    pub name: String,

    /// Position in the fleet host list, when the host belongs to the fleet
    pub index: Option<usize>,
}

impl HostIdentity {
    /// Resolve a host against the fleet host list
    pub fn in_fleet(config: &FleetConfig, name: &str) -> PlanResult<Self> {
        let index = config
            .host_index(name)
            .ok_or_else(|| PlanningError::UnknownHost(name.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            index: Some(index),
        })
    }

    /// A host driven directly, outside of the fleet launcher
    pub fn standalone(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }
}

impl std::fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(i) => write!(f, "{} (#{})", self.name, i),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One mount point paired with its thread count and working directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountAssignment {
    /// 1-indexed position of the address in the configured address list
    pub number: usize,

    /// 1-indexed share exported by the address; equals `number` unless the
    /// address was picked from a per-host slice, where it is the slice position
    pub share: usize,

    pub ip: String,

    /// Local mount path: `<mount_base>/mountN`
    pub mount_path: PathBuf,

    /// Host-specific directory inside the mount: `<mount_path>/<host>`
    pub working_directory: PathBuf,

    pub threads: u32,
}

impl MountAssignment {
    /// Short label used in logs and reports (`mount3`)
    pub fn label(&self) -> String {
        format!("{}{}", EXPORT_PREFIX, self.number)
    }

    /// Remote NFS export: `<ip>:/mountS`
    pub fn export(&self) -> String {
        format!("{}:/{}{}", self.ip, EXPORT_PREFIX, self.share)
    }
}

/// Per-assignment lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentState {
    Planned,
    Mounting,
    Mounted,
    MountFailed,
    DirectoryReady,
    ProvisionFailed,
    Running,
    Completed,
    Failed,
    /// Operator abort before the benchmark finished
    Interrupted,
}

impl AssignmentState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AssignmentState::MountFailed
                | AssignmentState::ProvisionFailed
                | AssignmentState::Completed
                | AssignmentState::Failed
                | AssignmentState::Interrupted
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AssignmentState::Completed)
    }
}

impl std::fmt::Display for AssignmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssignmentState::Planned => "planned",
            AssignmentState::Mounting => "mounting",
            AssignmentState::Mounted => "mounted",
            AssignmentState::MountFailed => "mount-failed",
            AssignmentState::DirectoryReady => "directory-ready",
            AssignmentState::ProvisionFailed => "provision-failed",
            AssignmentState::Running => "running",
            AssignmentState::Completed => "completed",
            AssignmentState::Failed => "failed",
            AssignmentState::Interrupted => "interrupted",
        };
        write!(f, "{}", s)
    }
}

/// Aggregate numbers from the benchmark's JSON summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSummary {
    pub read_iops: f64,
    /// KiB/s
    pub read_bw_kib: u64,
    pub read_lat_mean_ns: f64,
    pub write_iops: f64,
    /// KiB/s
    pub write_bw_kib: u64,
    pub write_lat_mean_ns: f64,
}

impl ThroughputSummary {
    pub fn total_bw_kib(&self) -> u64 {
        self.read_bw_kib + self.write_bw_kib
    }

    pub fn total_iops(&self) -> f64 {
        self.read_iops + self.write_iops
    }
}

/// Outcome of one assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub assignment: MountAssignment,

    /// Terminal state
    pub state: AssignmentState,

    /// Benchmark exit status, when the process ran to completion
    pub exit_status: Option<i32>,

    /// Error detail for failed stages
    pub error: Option<String>,

    pub summary: Option<ThroughputSummary>,

    /// Whether this invocation mounted the share
    pub mounted_here: bool,

    /// Whether the share was released during teardown
    pub released: bool,
}

impl JobResult {
    pub fn new(assignment: MountAssignment) -> Self {
        Self {
            assignment,
            state: AssignmentState::Planned,
            exit_status: None,
            error: None,
            summary: None,
            mounted_here: false,
            released: false,
        }
    }

    pub fn fail(&mut self, state: AssignmentState, error: impl Into<String>) {
        self.state = state;
        self.error = Some(error.into());
    }

    pub fn is_success(&self) -> bool {
        self.state.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_TOTAL_THREADS, RawConfig};

    fn assignment() -> MountAssignment {
        MountAssignment {
            number: 3,
            share: 3,
            ip: "10.10.0.3".into(),
            mount_path: PathBuf::from("/mnt/mount3"),
            working_directory: PathBuf::from("/mnt/mount3/client01"),
            threads: 79,
        }
    }

    #[test]
    fn test_export_and_label() {
        let a = assignment();
        assert_eq!(a.label(), "mount3");
        assert_eq!(a.export(), "10.10.0.3:/mount3");

        let sliced = MountAssignment { number: 11, share: 3, ..a };
        assert_eq!(sliced.label(), "mount11");
        assert_eq!(sliced.export(), "10.10.0.3:/mount3");
    }

    #[test]
    fn test_host_name_must_be_one_component() {
        assert!(is_valid_host_name("client01"));
        assert!(is_valid_host_name("bench-07.rack2"));
        for bad in ["", ".", "..", "../escape", "a/b", "/abs", "client01/"] {
            assert!(!is_valid_host_name(bad), "{bad:?} accepted");
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!AssignmentState::Planned.is_terminal());
        assert!(!AssignmentState::Mounted.is_terminal());
        assert!(!AssignmentState::Running.is_terminal());
        assert!(AssignmentState::MountFailed.is_terminal());
        assert!(AssignmentState::ProvisionFailed.is_terminal());
        assert!(AssignmentState::Completed.is_terminal());
        assert!(AssignmentState::Failed.is_terminal());
        assert!(AssignmentState::Interrupted.is_terminal());
        assert_eq!(AssignmentState::MountFailed.to_string(), "mount-failed");
    }

    #[test]
    fn test_host_identity() {
        let config = FleetConfig::from_raw(
            RawConfig {
                hosts: vec!["a".into(), "b".into()],
                ip_addresses: vec!["10.0.0.1".into()],
                mount_base: "/mnt".into(),
                ..Default::default()
            },
            DEFAULT_TOTAL_THREADS,
        )
        .unwrap();

        let b = HostIdentity::in_fleet(&config, "b").unwrap();
        assert_eq!(b.index, Some(1));
        assert_eq!(b.to_string(), "b (#1)");

        assert_eq!(
            HostIdentity::in_fleet(&config, "zzz"),
            Err(PlanningError::UnknownHost("zzz".into()))
        );

        let solo = HostIdentity::standalone("bench07");
        assert_eq!(solo.index, None);
        assert_eq!(solo.to_string(), "bench07");
    }

    #[test]
    fn test_job_result_serializes_state_in_snake_case() {
        let mut result = JobResult::new(assignment());
        result.fail(AssignmentState::MountFailed, "mount exited with status 32");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["state"], "mount_failed");
        assert_eq!(json["error"], "mount exited with status 32");
        assert!(!result.is_success());
    }
}

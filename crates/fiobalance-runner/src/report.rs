//! Per-invocation run report

use chrono::{DateTime, Utc};
use fiobalance_core::{HostIdentity, JobResult};
use fiobalance_mount::TeardownError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A mount that could not be released
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownFailure {
    pub path: PathBuf,
    pub error: String,
}

impl TeardownFailure {
    pub fn from_error(err: &TeardownError) -> Vec<Self> {
        err.failures
            .iter()
            .map(|(path, e)| Self {
                path: path.clone(),
                error: e.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub host: HostIdentity,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<JobResult>,
    pub teardown_failures: Vec<TeardownFailure>,
}

impl RunReport {
    /// Every assignment completed and every mount was released
    pub fn is_success(&self) -> bool {
        self.results.iter().all(JobResult::is_success) && self.teardown_failures.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn completed(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn total_threads(&self) -> u64 {
        self.results
            .iter()
            .map(|r| u64::from(r.assignment.threads))
            .sum()
    }

    /// Aggregate bandwidth across completed jobs, KiB/s
    pub fn total_bw_kib(&self) -> u64 {
        self.results
            .iter()
            .filter_map(|r| r.summary.as_ref())
            .map(|s| s.total_bw_kib())
            .sum()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

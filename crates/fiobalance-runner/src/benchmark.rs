//! Benchmark capability
//!
//! `BenchmarkRunner` is the seam between job scheduling and the external
//! benchmark process. `FioRunner` drives the real binary; tests use an
//! in-memory runner.

use crate::error::Result;
use async_trait::async_trait;
use fiobalance_core::{MountAssignment, ThroughputSummary};
use std::path::PathBuf;

/// One benchmark invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkJob {
    pub label: String,
    pub directory: PathBuf,
    pub threads: u32,
}

impl BenchmarkJob {
    pub fn for_assignment(assignment: &MountAssignment) -> Self {
        Self {
            label: assignment.label(),
            directory: assignment.working_directory.clone(),
            threads: assignment.threads,
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkOutput {
    pub exit_status: Option<i32>,
    /// Parsed JSON summary, when the output could be read
    pub summary: Option<ThroughputSummary>,
}

#[async_trait]
pub trait BenchmarkRunner: Send + Sync {
    fn name(&self) -> &str;

    /// Run the job to completion. Dropping the future must stop the process.
    async fn run(&self, job: &BenchmarkJob) -> Result<BenchmarkOutput>;
}

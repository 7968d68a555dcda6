//! Fixed fio parameter profile

use crate::benchmark::BenchmarkJob;
use std::time::Duration;

/// Extra time a job gets on top of the configured runtime before it is killed
pub const GRACE_PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FioProfile {
    pub block_size: String,
    pub iodepth: u32,
    pub direct: bool,
    pub numa_mem_policy: String,
    pub ioengine: String,
    /// Per-thread file size
    pub size: String,
    pub rw: String,
    pub runtime: Duration,
}

impl Default for FioProfile {
    fn default() -> Self {
        Self {
            block_size: "2m".to_string(),
            iodepth: 16,
            direct: true,
            numa_mem_policy: "local".to_string(),
            ioengine: "libaio".to_string(),
            size: "1g".to_string(),
            rw: "randrw".to_string(),
            runtime: Duration::from_secs(60),
        }
    }
}

impl FioProfile {
    /// Command line for one job
    pub fn args(&self, job: &BenchmarkJob) -> Vec<String> {
        vec![
            format!("--name={}", job.label),
            format!("--directory={}", job.directory.display()),
            format!("--numjobs={}", job.threads),
            format!("--rw={}", self.rw),
            format!("--bs={}", self.block_size),
            format!("--iodepth={}", self.iodepth),
            format!("--direct={}", u8::from(self.direct)),
            format!("--ioengine={}", self.ioengine),
            format!("--size={}", self.size),
            format!("--numa_mem_policy={}", self.numa_mem_policy),
            format!("--runtime={}", self.runtime.as_secs()),
            "--time_based".to_string(),
            "--group_reporting".to_string(),
            "--output-format=json".to_string(),
        ]
    }

    /// Wall-clock limit for one job: runtime plus grace period
    pub fn time_bound(&self) -> Duration {
        self.runtime + GRACE_PERIOD
    }
}

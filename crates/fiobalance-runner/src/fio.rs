//! fio process wrapper

use crate::benchmark::{BenchmarkJob, BenchmarkOutput, BenchmarkRunner};
use crate::error::{JobError, Result};
use crate::profile::FioProfile;
use crate::summary::parse_summary;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Lines of stderr kept in error reports
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct FioRunner {
    binary: PathBuf,
    profile: FioProfile,
}

impl Default for FioRunner {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("fio"),
            profile: FioProfile::default(),
        }
    }
}

impl FioRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_profile(mut self, profile: FioProfile) -> Self {
        self.profile = profile;
        self
    }
}

#[async_trait]
impl BenchmarkRunner for FioRunner {
    fn name(&self) -> &str {
        "fio"
    }

    async fn run(&self, job: &BenchmarkJob) -> Result<BenchmarkOutput> {
        let args = self.profile.args(job);

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // a timed out or interrupted job drops this future
        cmd.kill_on_drop(true);

        tracing::debug!("Running: {} {}", self.binary.display(), args.join(" "));

        let child = cmd.spawn().map_err(|source| JobError::Spawn {
            program: self.binary.clone(),
            source,
        })?;
        let output = child.wait_with_output().await?;

        let stderr = tail(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES);
        if !output.status.success() {
            return Err(match output.status.code() {
                Some(code) => JobError::NonZeroExit { code, stderr },
                None => JobError::Signaled { stderr },
            });
        }

        let summary = parse_summary(&String::from_utf8_lossy(&output.stdout));
        if summary.is_none() {
            tracing::warn!(job = %job.label, "fio finished without a readable JSON summary");
        }

        Ok(BenchmarkOutput {
            exit_status: output.status.code(),
            summary,
        })
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim().lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

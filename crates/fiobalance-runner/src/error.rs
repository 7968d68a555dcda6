//! Benchmark job error types

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("benchmark exited with status {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("benchmark terminated by signal: {stderr}")]
    Signaled { stderr: String },

    #[error("benchmark did not finish within {}s and was killed", after.as_secs())]
    Timeout { after: Duration },

    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("benchmark task panicked: {0}")]
    Panicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Exit status of the benchmark process, when it exited normally
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            JobError::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, JobError>;

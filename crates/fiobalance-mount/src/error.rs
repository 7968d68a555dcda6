//! Mount, provisioning and teardown error types

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("{command} failed ({}): {stderr}", describe_status(*status))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("{} is already mounted from {found}, expected {expected}", path.display())]
    Conflict {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("failed to prepare mount point {}: {source}", path.display())]
    MountPoint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} of {} did not finish within {}s", path.display(), after.as_secs())]
    Timeout {
        operation: &'static str,
        path: PathBuf,
        after: Duration,
    },

    #[error("failed to read the mount table: {0}")]
    MountTable(#[from] procfs::ProcError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MountError {
    /// Exit status of the underlying tool, when it ran
    pub fn status(&self) -> Option<i32> {
        match self {
            MountError::CommandFailed { status, .. } => *status,
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
#[error("failed to create {}: {source}", path.display())]
pub struct ProvisioningError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Every unmount failure collected during teardown
#[derive(Error, Debug)]
#[error("teardown left {} mount(s) in place: {}", failures.len(), summarize(failures))]
pub struct TeardownError {
    /// Paths that were released before and after the failures
    pub released: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, MountError)>,
}

fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn summarize(failures: &[(PathBuf, MountError)]) -> String {
    failures
        .iter()
        .map(|(path, e)| format!("{} ({})", path.display(), e))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, MountError>;

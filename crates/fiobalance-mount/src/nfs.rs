//! mount/umount CLI wrapper
//!
//! Wraps the system `mount` and `umount` commands for NFS shares and reads
//! `/proc/self/mountinfo` through procfs to find out what is mounted where.

use crate::error::{MountError, Result};
use crate::mounter::Mounter;
use async_trait::async_trait;
use procfs::FromRead;
use procfs::process::{MountInfos, Process};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// NFS mounter backed by the system tools
#[derive(Debug, Clone)]
pub struct NfsMounter {
    fstype: String,
    /// mountinfo-format file read instead of `/proc/self/mountinfo`
    mount_table: Option<PathBuf>,
}

impl Default for NfsMounter {
    fn default() -> Self {
        Self {
            fstype: "nfs".to_string(),
            mount_table: None,
        }
    }
}

impl NfsMounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different filesystem type (e.g. "nfs4")
    pub fn with_fstype(mut self, fstype: impl Into<String>) -> Self {
        self.fstype = fstype.into();
        self
    }

    /// Read mounts from a different mountinfo table (tests)
    pub fn with_mount_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.mount_table = Some(path.into());
        self
    }

    async fn mount_infos(&self) -> Result<MountInfos> {
        let table = self.mount_table.clone();
        let mounts = tokio::task::spawn_blocking(move || match table {
            Some(path) => MountInfos::from_file(path),
            None => Process::myself().and_then(|p| p.mountinfo()),
        })
        .await
        .map_err(|e| MountError::Io(std::io::Error::other(e)))??;
        Ok(mounts)
    }

    /// Run a command and fail with its exit status and stderr
    async fn run_command(&self, program: &str, args: &[&str]) -> Result<()> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::debug!("Running: {} {}", program, args.join(" "));

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MountError::CommandFailed {
                command: format!("{} {}", program, args.join(" ")),
                status: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Mounter for NfsMounter {
    fn name(&self) -> &str {
        &self.fstype
    }

    async fn mounted_source(&self, target: &Path) -> Result<Option<String>> {
        let mounts = self.mount_infos().await?;
        Ok(find_source(&mounts, target))
    }

    async fn mount(&self, source: &str, target: &Path, options: Option<&str>) -> Result<()> {
        let target = target.to_string_lossy();
        let mut args = vec!["-t", self.fstype.as_str()];
        if let Some(options) = options {
            args.push("-o");
            args.push(options);
        }
        args.push(source);
        args.push(&target);

        self.run_command("mount", &args).await
    }

    async fn unmount(&self, target: &Path) -> Result<()> {
        let target = target.to_string_lossy();
        self.run_command("umount", &[&*target]).await
    }
}

/// Source of the topmost mount at `target`
pub fn find_source(mounts: &MountInfos, target: &Path) -> Option<String> {
    mounts
        .0
        .iter()
        .rev()
        .find(|m| m.mount_point == target)
        .and_then(|m| m.mount_source.clone())
}

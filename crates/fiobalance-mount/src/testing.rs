//! In-memory `Mounter` for tests

use crate::error::{MountError, Result};
use crate::mounter::Mounter;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Exit status reported by simulated mount failures (mount(8) "mount failure")
pub const FAKE_MOUNT_FAILURE: i32 = 32;

#[derive(Default)]
struct FakeState {
    table: HashMap<PathBuf, String>,
    fail_mount: HashSet<PathBuf>,
    fail_unmount: HashSet<PathBuf>,
    hang_mount: HashSet<PathBuf>,
    mount_calls: Vec<PathBuf>,
    unmount_calls: Vec<PathBuf>,
    last_options: Option<String>,
}

/// Mounter that keeps a mount table in memory and fails on request
#[derive(Default)]
pub struct FakeMounter {
    inner: Mutex<FakeState>,
}

impl FakeMounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Pretend `source` was mounted at `path` before the run started
    pub fn premount(&self, path: &Path, source: &str) {
        self.state()
            .table
            .insert(path.to_path_buf(), source.to_string());
    }

    pub fn fail_mount_at(&self, path: &Path) {
        self.state().fail_mount.insert(path.to_path_buf());
    }

    /// Attach the share but never return from `mount`
    pub fn hang_mount_at(&self, path: &Path) {
        self.state().hang_mount.insert(path.to_path_buf());
    }

    pub fn fail_unmount_at(&self, path: &Path) {
        self.state().fail_unmount.insert(path.to_path_buf());
    }

    pub fn mount_calls(&self) -> Vec<PathBuf> {
        self.state().mount_calls.clone()
    }

    pub fn unmount_calls(&self) -> Vec<PathBuf> {
        self.state().unmount_calls.clone()
    }

    pub fn last_options(&self) -> Option<String> {
        self.state().last_options.clone()
    }

    pub fn source_at(&self, path: &Path) -> Option<String> {
        self.state().table.get(path).cloned()
    }

    pub fn mounted_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.state().table.keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl Mounter for FakeMounter {
    fn name(&self) -> &str {
        "fake"
    }

    async fn mounted_source(&self, target: &Path) -> Result<Option<String>> {
        Ok(self.state().table.get(target).cloned())
    }

    async fn mount(&self, source: &str, target: &Path, options: Option<&str>) -> Result<()> {
        let hang = {
            let mut state = self.state();
            state.mount_calls.push(target.to_path_buf());
            state.last_options = options.map(str::to_string);
            if state.fail_mount.contains(target) {
                return Err(MountError::CommandFailed {
                    command: format!("mount {} {}", source, target.display()),
                    status: Some(FAKE_MOUNT_FAILURE),
                    stderr: "mount.nfs: Connection timed out".to_string(),
                });
            }
            state
                .table
                .insert(target.to_path_buf(), source.to_string());
            state.hang_mount.contains(target)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn unmount(&self, target: &Path) -> Result<()> {
        let mut state = self.state();
        state.unmount_calls.push(target.to_path_buf());
        if state.fail_unmount.contains(target) {
            return Err(MountError::CommandFailed {
                command: format!("umount {}", target.display()),
                status: Some(16),
                stderr: format!("umount.nfs: {}: device is busy", target.display()),
            });
        }
        state.table.remove(target);
        Ok(())
    }
}

//! Mount lifecycle manager
//!
//! `ensure_mounted` is idempotent and records what it mounted in the
//! caller's `MountState`; `unmount_all` releases every recorded path and
//! keeps going past failures so no share is left behind silently.

use crate::error::{MountError, Result, TeardownError};
use crate::mounter::{Mounter, same_source};
use fiobalance_core::{MountAssignment, MountState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound for a single mount or umount command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// What `ensure_mounted` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// Mounted by this call and recorded for teardown
    Mounted,
    /// The expected share was already mounted; nothing recorded
    AlreadyMounted,
}

pub struct MountManager {
    mounter: Arc<dyn Mounter>,
    options: Option<String>,
    command_timeout: Duration,
}

impl MountManager {
    pub fn new(mounter: Arc<dyn Mounter>) -> Self {
        Self {
            mounter,
            options: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Options passed to every mount (`mount -o`)
    pub fn with_options(mut self, options: Option<String>) -> Self {
        self.options = options;
        self
    }

    pub fn mounter_name(&self) -> &str {
        self.mounter.name()
    }

    /// Make sure the assignment's export is mounted at its mount path
    pub async fn ensure_mounted(
        &self,
        assignment: &MountAssignment,
        state: &mut MountState,
    ) -> Result<MountOutcome> {
        let expected = assignment.export();
        let path = &assignment.mount_path;

        match self.mounter.mounted_source(path).await? {
            Some(found) if same_source(&found, &expected) => {
                debug!(path = %path.display(), source = %found, "already mounted");
                return Ok(MountOutcome::AlreadyMounted);
            }
            Some(found) => {
                return Err(MountError::Conflict {
                    path: path.clone(),
                    expected,
                    found,
                });
            }
            None => {}
        }

        tokio::fs::create_dir_all(path)
            .await
            .map_err(|source| MountError::MountPoint {
                path: path.clone(),
                source,
            })?;

        let mounted = tokio::time::timeout(
            self.command_timeout,
            self.mounter.mount(&expected, path, self.options.as_deref()),
        )
        .await;

        match mounted {
            Ok(result) => result?,
            Err(_) => {
                // the command was killed; the share may still have been attached
                if self.is_mounted_from(path, &expected).await {
                    state.record(path.clone());
                }
                return Err(MountError::Timeout {
                    operation: "mount",
                    path: path.clone(),
                    after: self.command_timeout,
                });
            }
        }
        state.record(path.clone());

        info!(
            mounter = self.mounter.name(),
            source = %expected,
            path = %path.display(),
            "mounted"
        );
        Ok(MountOutcome::Mounted)
    }

    /// Record the assignment's share for teardown if it is currently mounted
    /// from the expected export. Used to clean up after a crashed run.
    pub async fn adopt_existing(
        &self,
        assignment: &MountAssignment,
        state: &mut MountState,
    ) -> Result<bool> {
        let path = &assignment.mount_path;
        match self.mounter.mounted_source(path).await? {
            Some(found) if same_source(&found, &assignment.export()) => {
                Ok(state.record(path.clone()))
            }
            Some(found) => {
                warn!(path = %path.display(), source = %found, "leaving foreign mount in place");
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Unmount every recorded path, newest first.
    ///
    /// Returns the released paths, or a `TeardownError` listing each path that
    /// could not be released along with those that were.
    pub async fn unmount_all(
        &self,
        state: &mut MountState,
    ) -> std::result::Result<Vec<PathBuf>, TeardownError> {
        let mut released = Vec::new();
        let mut failures = Vec::new();

        for path in state.drain().into_iter().rev() {
            match self.unmount(&path).await {
                Ok(()) => {
                    info!(path = %path.display(), "unmounted");
                    released.push(path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unmount failed");
                    failures.push((path, e));
                }
            }
        }

        if failures.is_empty() {
            Ok(released)
        } else {
            Err(TeardownError { released, failures })
        }
    }

    async fn unmount(&self, path: &Path) -> Result<()> {
        tokio::time::timeout(self.command_timeout, self.mounter.unmount(path))
            .await
            .map_err(|_| MountError::Timeout {
                operation: "umount",
                path: path.to_path_buf(),
                after: self.command_timeout,
            })?
    }

    async fn is_mounted_from(&self, path: &Path, expected: &str) -> bool {
        matches!(
            self.mounter.mounted_source(path).await,
            Ok(Some(found)) if same_source(&found, expected)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMounter;

    fn assignment(base: &Path, n: usize) -> MountAssignment {
        let mount_path = base.join(format!("mount{n}"));
        MountAssignment {
            number: n,
            share: n,
            ip: format!("10.10.0.{n}"),
            working_directory: mount_path.join("client01"),
            mount_path,
            threads: 79,
        }
    }

    #[tokio::test]
    async fn test_mount_creates_directory_and_records() {
        let base = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeMounter::new());
        let manager = MountManager::new(fake.clone()).with_options(Some("vers=3".into()));
        let mut state = MountState::new();

        let a = assignment(base.path(), 1);
        let outcome = manager.ensure_mounted(&a, &mut state).await.unwrap();

        assert_eq!(outcome, MountOutcome::Mounted);
        assert!(a.mount_path.is_dir());
        assert_eq!(state.paths(), &[a.mount_path.clone()]);
        assert_eq!(fake.mount_calls(), vec![a.mount_path.clone()]);
        assert_eq!(fake.last_options().as_deref(), Some("vers=3"));
        assert_eq!(
            fake.source_at(&a.mount_path).as_deref(),
            Some("10.10.0.1:/mount1")
        );
    }

    #[tokio::test]
    async fn test_ensure_mounted_is_idempotent() {
        let base = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeMounter::new());
        let manager = MountManager::new(fake.clone());
        let mut state = MountState::new();
        let a = assignment(base.path(), 2);

        let first = manager.ensure_mounted(&a, &mut state).await.unwrap();
        let second = manager.ensure_mounted(&a, &mut state).await.unwrap();

        assert_eq!(first, MountOutcome::Mounted);
        assert_eq!(second, MountOutcome::AlreadyMounted);
        assert_eq!(fake.mount_calls().len(), 1);
        assert_eq!(state.len(), 1);
    }

    #[tokio::test]
    async fn test_preexisting_mount_is_not_recorded() {
        let base = tempfile::tempdir().unwrap();
        let a = assignment(base.path(), 3);
        let fake = Arc::new(FakeMounter::new());
        fake.premount(&a.mount_path, "10.10.0.3:/mount3/");
        let manager = MountManager::new(fake.clone());
        let mut state = MountState::new();

        let outcome = manager.ensure_mounted(&a, &mut state).await.unwrap();
        assert_eq!(outcome, MountOutcome::AlreadyMounted);
        assert!(state.is_empty());
        assert!(fake.mount_calls().is_empty());
    }

    #[tokio::test]
    async fn test_conflicting_mount_is_an_error() {
        let base = tempfile::tempdir().unwrap();
        let a = assignment(base.path(), 4);
        let fake = Arc::new(FakeMounter::new());
        fake.premount(&a.mount_path, "10.99.0.1:/other");
        let manager = MountManager::new(fake.clone());
        let mut state = MountState::new();

        let err = manager.ensure_mounted(&a, &mut state).await.unwrap_err();
        match err {
            MountError::Conflict {
                expected, found, ..
            } => {
                assert_eq!(expected, "10.10.0.4:/mount4");
                assert_eq!(found, "10.99.0.1:/other");
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_mount_failure_carries_status_and_is_not_recorded() {
        let base = tempfile::tempdir().unwrap();
        let a = assignment(base.path(), 5);
        let fake = Arc::new(FakeMounter::new());
        fake.fail_mount_at(&a.mount_path);
        let manager = MountManager::new(fake.clone());
        let mut state = MountState::new();

        let err = manager.ensure_mounted(&a, &mut state).await.unwrap_err();
        assert_eq!(err.status(), Some(32));
        assert!(err.to_string().contains("exit status 32"));
        assert!(state.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_timeout_still_records_attached_share() {
        let base = tempfile::tempdir().unwrap();
        let a = assignment(base.path(), 6);
        let fake = Arc::new(FakeMounter::new());
        fake.hang_mount_at(&a.mount_path);
        let manager =
            MountManager::new(fake.clone()).with_command_timeout(Duration::from_secs(5));
        let mut state = MountState::new();

        let err = manager.ensure_mounted(&a, &mut state).await.unwrap_err();
        assert!(matches!(err, MountError::Timeout { operation: "mount", .. }));
        assert_eq!(state.paths(), &[a.mount_path.clone()]);

        manager.unmount_all(&mut state).await.unwrap();
        assert!(fake.mounted_paths().is_empty());
    }

    #[tokio::test]
    async fn test_adopt_existing_only_takes_expected_exports() {
        let base = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeMounter::new());
        let ours = assignment(base.path(), 1);
        let foreign = assignment(base.path(), 2);
        let absent = assignment(base.path(), 3);
        fake.premount(&ours.mount_path, "10.10.0.1:/mount1");
        fake.premount(&foreign.mount_path, "10.99.0.1:/scratch");
        let manager = MountManager::new(fake.clone());
        let mut state = MountState::new();

        assert!(manager.adopt_existing(&ours, &mut state).await.unwrap());
        assert!(!manager.adopt_existing(&foreign, &mut state).await.unwrap());
        assert!(!manager.adopt_existing(&absent, &mut state).await.unwrap());

        let released = manager.unmount_all(&mut state).await.unwrap();
        assert_eq!(released, vec![ours.mount_path.clone()]);
        assert_eq!(fake.mounted_paths(), vec![foreign.mount_path.clone()]);
    }

    #[tokio::test]
    async fn test_unmount_all_releases_everything_recorded() {
        let base = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeMounter::new());
        let manager = MountManager::new(fake.clone());
        let mut state = MountState::new();

        for n in 1..=8 {
            manager
                .ensure_mounted(&assignment(base.path(), n), &mut state)
                .await
                .unwrap();
        }

        let released = manager.unmount_all(&mut state).await.unwrap();
        assert_eq!(released.len(), 8);
        assert_eq!(released[0], base.path().join("mount8"));
        assert!(state.is_empty());
        assert!(fake.mounted_paths().is_empty());
    }

    #[tokio::test]
    async fn test_teardown_continues_past_failures() {
        let base = tempfile::tempdir().unwrap();
        let fake = Arc::new(FakeMounter::new());
        // mounts 2, 5 and 7 fail, leaving 5 of 8 mounted
        for n in [2, 5, 7] {
            fake.fail_mount_at(&base.path().join(format!("mount{n}")));
        }
        // the first path to be unmounted (newest) fails
        fake.fail_unmount_at(&base.path().join("mount8"));
        let manager = MountManager::new(fake.clone());
        let mut state = MountState::new();

        let mut failed = 0;
        for n in 1..=8 {
            if manager
                .ensure_mounted(&assignment(base.path(), n), &mut state)
                .await
                .is_err()
            {
                failed += 1;
            }
        }
        assert_eq!(failed, 3);
        assert_eq!(state.len(), 5);

        let err = manager.unmount_all(&mut state).await.unwrap_err();
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].0, base.path().join("mount8"));
        assert_eq!(err.released.len(), 4);

        let mut attempted = fake.unmount_calls();
        attempted.sort();
        let expected: Vec<PathBuf> = [1, 3, 4, 6, 8]
            .iter()
            .map(|n| base.path().join(format!("mount{n}")))
            .collect();
        assert_eq!(attempted, expected);
        assert!(state.is_empty());
    }
}

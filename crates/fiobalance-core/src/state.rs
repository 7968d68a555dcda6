//! Mount bookkeeping for a single invocation
//!
//! Records the paths this process mounted so teardown can release exactly
//! those and nothing else. Owned by the top-level session and passed down
//! explicitly; append-only during setup, drained once during teardown.

use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MountState {
    mounted: Vec<PathBuf>,
}

impl MountState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path mounted by this invocation. Returns `false` if it was already recorded.
    pub fn record(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }
        self.mounted.push(path);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.mounted.iter().any(|p| p == path)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.mounted
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    /// Take every recorded path in mount order, leaving the state empty
    pub fn drain(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.mounted)
    }
}

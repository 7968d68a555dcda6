//! Mount capability trait

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Attaches and detaches remote shares.
///
/// `NfsMounter` shells out to the system tools; tests substitute fakes that
/// simulate failures without touching the filesystem.
#[async_trait]
pub trait Mounter: Send + Sync {
    /// Implementation name used in logs (e.g. "nfs")
    fn name(&self) -> &str;

    /// Source currently mounted at `target`, or `None` when it is not a mount point
    async fn mounted_source(&self, target: &Path) -> Result<Option<String>>;

    /// Mount `source` at `target`
    async fn mount(&self, source: &str, target: &Path, options: Option<&str>) -> Result<()>;

    /// Unmount whatever is mounted at `target`
    async fn unmount(&self, target: &Path) -> Result<()>;
}

/// Compare two mount sources ignoring a trailing slash on the export path
pub fn same_source(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

//! Working directory provisioning
//!
//! Directories are created on demand and never removed; benchmark data on the
//! shares is managed by the operators.

use crate::error::ProvisioningError;
use std::path::Path;

/// Create `path` and any missing parents
pub async fn ensure_directory(path: &Path) -> Result<(), ProvisioningError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| ProvisioningError {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), "working directory ready");
    Ok(())
}

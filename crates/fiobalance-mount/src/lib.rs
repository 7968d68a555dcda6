//! NFS mount lifecycle for fio-balancer
//!
//! - [`Mounter`]: capability trait for attaching/detaching shares
//! - [`NfsMounter`]: `mount -t nfs` / `umount` wrapper
//! - [`MountManager`]: idempotent mount + total teardown over a `MountState`
//! - [`ensure_directory`]: per-host working directory provisioning

pub mod error;
pub mod lifecycle;
pub mod mounter;
pub mod nfs;
pub mod provision;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::{MountError, ProvisioningError, Result, TeardownError};
pub use lifecycle::{DEFAULT_COMMAND_TIMEOUT, MountManager, MountOutcome};
pub use mounter::{Mounter, same_source};
pub use nfs::{NfsMounter, find_source};
pub use provision::ensure_directory;

//! Mount-namespace isolation.
//!
//! Both operations must precede any bind mount into the staging root, or
//! the host mount table could see the staging mounts.

use std::path::Path;

use nix::mount::{self, MsFlags};
use nix::sched::{unshare, CloneFlags};

use crate::error::{Result, StageError};

/// Detaches the process into its own mount namespace.
///
/// # Errors
///
/// Returns [`StageError::UnshareNamespace`] if `unshare(CLONE_NEWNS)` fails.
pub fn unshare_mount_namespace() -> Result<()> {
    unshare(CloneFlags::CLONE_NEWNS)
        .map_err(|source| StageError::UnshareNamespace { source })?;
    tracing::debug!("unshared mount namespace");
    Ok(())
}

/// Marks `target` as a private mount so changes below it do not propagate
/// back to the host.
///
/// # Errors
///
/// Returns [`StageError::MakePrivate`] if the `mount(2)` call fails.
pub fn make_mount_private(target: &Path) -> Result<()> {
    mount::mount(
        None::<&str>,
        target,
        None::<&str>,
        MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(|source| StageError::MakePrivate {
        target: target.to_path_buf(),
        source,
    })?;
    tracing::debug!(target = %target.display(), "marked mount point private");
    Ok(())
}

//! Staging-root finalization: the pack metadata mount point and the root
//! switch.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use nix::mount::MsFlags;
use nix::unistd::{self, Gid, Uid};

use prestage_common::constants;

use crate::error::{Result, StageError};
use crate::mount::MountSpec;
use crate::selinux::Relabel;

/// Creates and labels the in-memory mount point that will hold runtime-pack
/// metadata once the root is switched.
///
/// The relabel runs immediately after the mount, before the permission and
/// ownership changes, so those changes are applied to a mount point that
/// already carries its proper label.
///
/// # Errors
///
/// Each sub-step is independently fatal: [`StageError::ApexTmpfs`],
/// [`StageError::ApexRelabel`], [`StageError::ApexChmod`],
/// [`StageError::ApexChown`].
pub fn prepare_apex_mount_point(relabeler: &dyn Relabel) -> Result<()> {
    let target = Path::new(constants::APEX_MOUNT_DIR);

    MountSpec::tmpfs(
        target,
        MsFlags::MS_NODEV | MsFlags::MS_NOEXEC | MsFlags::MS_NOSUID,
    )
    .apply()
    .map_err(|source| StageError::ApexTmpfs {
        target: target.to_path_buf(),
        source,
    })?;

    relabeler
        .relabel(target)
        .map_err(|source| StageError::ApexRelabel {
            target: target.to_path_buf(),
            source,
        })?;

    fs::set_permissions(target, fs::Permissions::from_mode(constants::APEX_DIR_MODE)).map_err(
        |source| StageError::ApexChmod {
            target: target.to_path_buf(),
            source,
        },
    )?;

    unistd::chown(target, Some(Uid::from_raw(0)), Some(Gid::from_raw(0))).map_err(|source| {
        StageError::ApexChown {
            target: target.to_path_buf(),
            source,
        }
    })?;

    tracing::debug!(target = %target.display(), "pack metadata mount point ready");
    Ok(())
}

/// Commits the staging root as the process root.
///
/// # Errors
///
/// Each sub-step is independently fatal: [`StageError::ChdirStaging`],
/// [`StageError::Chroot`], [`StageError::ChdirRoot`].
pub fn enter_root() -> Result<()> {
    unistd::chdir(constants::STAGING_ROOT)
        .map_err(|source| StageError::ChdirStaging { source })?;
    unistd::chroot(".").map_err(|source| StageError::Chroot { source })?;
    unistd::chdir("/").map_err(|source| StageError::ChdirRoot { source })?;
    tracing::info!(root = constants::STAGING_ROOT, "switched process root");
    Ok(())
}

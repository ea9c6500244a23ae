//! `mount(2)` helpers for staging-root assembly.

use std::path::Path;

use nix::mount::{self, MsFlags};

use prestage_common::constants;

/// Describes one mount operation.
///
/// A spec is built, applied once, and discarded; success leaves no state
/// beyond the kernel mount table.
#[derive(Debug, Clone, Copy)]
pub struct MountSpec<'a> {
    source: Option<&'a Path>,
    target: &'a Path,
    fstype: Option<&'a str>,
    flags: MsFlags,
    recursive: bool,
}

impl<'a> MountSpec<'a> {
    /// A bind mount of `source` onto `target`.
    #[must_use]
    pub const fn bind(source: &'a Path, target: &'a Path) -> Self {
        Self {
            source: Some(source),
            target,
            fstype: None,
            flags: MsFlags::MS_BIND,
            recursive: false,
        }
    }

    /// A fresh tmpfs on `target` with the given flags.
    #[must_use]
    pub const fn tmpfs(target: &'a Path, flags: MsFlags) -> Self {
        Self {
            source: None,
            target,
            fstype: Some("tmpfs"),
            flags,
            recursive: false,
        }
    }

    /// A read-only mount of the filesystem on `device` onto `target`.
    #[must_use]
    pub const fn read_only(device: &'a Path, target: &'a Path, fstype: &'a str) -> Self {
        Self {
            source: Some(device),
            target,
            fstype: Some(fstype),
            flags: MsFlags::MS_RDONLY,
            recursive: false,
        }
    }

    /// Extends a bind mount to the whole subtree (`MS_REC`).
    #[must_use]
    pub const fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Performs the mount.
    ///
    /// # Errors
    ///
    /// Returns the raw errno from `mount(2)`; callers map it to their
    /// failure site.
    pub fn apply(&self) -> nix::Result<()> {
        let mut flags = self.flags;
        if self.recursive {
            flags |= MsFlags::MS_REC;
        }
        mount::mount(self.source, self.target, self.fstype, flags, None::<&str>)
    }
}

/// Bind-mounts `source` onto `target`.
///
/// # Errors
///
/// Returns the raw errno from `mount(2)`.
pub fn bind_mount(source: &Path, target: &Path) -> nix::Result<()> {
    MountSpec::bind(source, target).apply()
}

/// Attempts a read-only mount of `device` onto `target`, swallowing failure.
///
/// The partitions mounted this way are conveniences, and at this point in
/// the sequence no descriptor exists that could carry a diagnostic.
pub fn try_mount_partition(device: &Path, target: &Path) {
    if let Err(error) =
        MountSpec::read_only(device, target, constants::PARTITION_FS_TYPE).apply()
    {
        tracing::debug!(
            device = %device.display(),
            target = %target.display(),
            %error,
            "optional partition not mounted"
        );
    }
}

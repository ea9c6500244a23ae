//! Runtime-pack activation inside the staged root.
//!
//! The compile step is dynamically linked and needs a C runtime that the
//! staging root does not carry; it is obtained by activating the runtime
//! packs found under the system pack directory. Activation happens once,
//! after the root switch, and every activated pack must be deactivated
//! exactly once on every subsequent exit path — [`ActivationScope`] owns
//! that obligation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use nix::mount::{umount2, MntFlags};

use prestage_common::constants;

use crate::mount;

/// One activated runtime pack.
///
/// Records where the pack came from and where it is mounted; holding a
/// record is the capability to deactivate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApexPack {
    name: String,
    source: PathBuf,
    mount_point: PathBuf,
}

impl ApexPack {
    /// The pack's directory name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pack's source directory under the scan root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.source
    }

    /// Where the pack is mounted while active.
    #[must_use]
    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }
}

/// Interface to the pack activation subsystem.
pub trait ApexSubsystem {
    /// Scans `dir` and activates every pack found there.
    ///
    /// Has no failure return: packs that cannot be activated are logged and
    /// skipped, and the active set reflects whatever succeeded.
    fn scan_and_activate(&mut self, dir: &Path);

    /// Returns the currently active packs, in activation order.
    fn active(&self) -> Vec<ApexPack>;

    /// Deactivates a single pack.
    ///
    /// # Errors
    ///
    /// Returns the underlying error; callers log it and move on.
    fn deactivate(&mut self, pack: &ApexPack) -> io::Result<()>;
}

/// Activates directory-form packs by bind-mounting them under the pack root.
#[derive(Debug)]
pub struct BindApexd {
    pack_root: PathBuf,
    active: Vec<ApexPack>,
}

impl BindApexd {
    /// A subsystem mounting packs under the fixed pack root.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pack_root(constants::APEX_ROOT)
    }

    /// A subsystem mounting packs under `root`.
    pub fn with_pack_root(root: impl Into<PathBuf>) -> Self {
        Self {
            pack_root: root.into(),
            active: Vec::new(),
        }
    }
}

impl Default for BindApexd {
    fn default() -> Self {
        Self::new()
    }
}

impl ApexSubsystem for BindApexd {
    fn scan_and_activate(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!(dir = %dir.display(), %error, "cannot scan pack directory");
                return;
            }
        };
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(dir = %dir.display(), %error, "unreadable pack entry");
                    continue;
                }
            };
            let source = entry.path();
            if !source.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let mount_point = self.pack_root.join(&name);
            if let Err(error) = fs::create_dir_all(&mount_point) {
                tracing::warn!(pack = %name, %error, "cannot create pack mount point");
                continue;
            }
            match mount::bind_mount(&source, &mount_point) {
                Ok(()) => {
                    tracing::debug!(pack = %name, "activated runtime pack");
                    self.active.push(ApexPack {
                        name,
                        source,
                        mount_point,
                    });
                }
                Err(error) => {
                    tracing::warn!(pack = %name, %error, "failed to activate runtime pack");
                }
            }
        }
    }

    fn active(&self) -> Vec<ApexPack> {
        self.active.clone()
    }

    fn deactivate(&mut self, pack: &ApexPack) -> io::Result<()> {
        umount2(pack.mount_point(), MntFlags::MNT_DETACH)?;
        self.active.retain(|active| active != pack);
        Ok(())
    }
}

/// Scoped pack activation.
///
/// Entering the scope scans and activates; dropping it deactivates every
/// activated pack exactly once, whether the scope ends by success or by an
/// early return from a later failure. Individual deactivation failures are
/// logged, never escalated.
pub struct ActivationScope<A: ApexSubsystem> {
    subsystem: A,
    packs: Vec<ApexPack>,
}

impl<A: ApexSubsystem> ActivationScope<A> {
    /// Activates the packs under `dir` and snapshots the resulting set.
    pub fn enter(mut subsystem: A, dir: &Path) -> Self {
        subsystem.scan_and_activate(dir);
        let packs = subsystem.active();
        tracing::info!(count = packs.len(), "runtime packs activated");
        Self { subsystem, packs }
    }

    /// The set this scope will deactivate.
    #[must_use]
    pub fn packs(&self) -> &[ApexPack] {
        &self.packs
    }
}

impl<A: ApexSubsystem> Drop for ActivationScope<A> {
    fn drop(&mut self) {
        for pack in &self.packs {
            if let Err(error) = self.subsystem.deactivate(pack) {
                tracing::error!(pack = pack.name(), %error, "failed to deactivate runtime pack");
            }
        }
    }
}

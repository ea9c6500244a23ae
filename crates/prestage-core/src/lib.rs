//! # prestage-core
//!
//! Primitives for assembling the staged post-update chroot:
//!
//! - **Descriptors**: best-effort closing of inherited file descriptors.
//! - **Namespace**: mount-namespace unshare and private-mount marking.
//! - **Mounts**: bind, tmpfs, and read-only partition mounts.
//! - **Staging**: pack mount-point setup and the chdir/chroot/chdir switch.
//! - **Packs**: runtime-pack activation with guaranteed deactivation.
//! - **Bionic**: per-ABI linker and core-library bind mounts.
//!
//! Every fatal failure maps to a distinct, stable process exit code through
//! [`error::StageError`].

pub mod apex;
pub mod bionic;
pub mod descriptor;
pub mod error;
pub mod mount;
pub mod ns;
pub mod selinux;
pub mod staging;

//! Fatal failure sites and the stable exit-code contract.
//!
//! Each variant is one failure site of the staging sequence. The mapping in
//! [`StageError::exit_code`] is a contract with callers that branch on the
//! process exit status; codes are never reused or renumbered.

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use prestage_common::error::InvalidSlotSuffix;
use prestage_common::types::Abi;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StageError>;

/// A fatal failure of the staging sequence.
#[derive(Debug, Error)]
pub enum StageError {
    /// The invocation did not carry the status descriptor and slot suffix.
    #[error("not enough arguments")]
    Usage,

    /// Detaching into a private mount namespace failed.
    #[error("failed to unshare the mount namespace: {source}")]
    UnshareNamespace {
        /// Errno from `unshare(2)`.
        source: Errno,
    },

    /// Marking the staging mount point private failed.
    #[error("failed to mount {target} private: {source}")]
    MakePrivate {
        /// The staging mount point.
        target: PathBuf,
        /// Errno from `mount(2)`.
        source: Errno,
    },

    /// A core host directory could not be bind-mounted into the staging root.
    #[error("failed to bind-mount {source_dir} to {target}: {source}")]
    BindCoreDir {
        /// Host directory being mounted.
        source_dir: PathBuf,
        /// Mount point under the staging root.
        target: PathBuf,
        /// Errno from `mount(2)`.
        source: Errno,
    },

    /// The slot-suffix argument failed format validation.
    #[error(transparent)]
    InvalidSlotSuffix(#[from] InvalidSlotSuffix),

    /// Changing into the staging root failed.
    #[error("failed to chdir into the staging root: {source}")]
    ChdirStaging {
        /// Errno from `chdir(2)`.
        source: Errno,
    },

    /// Committing the staging root as the process root failed.
    #[error("failed to chroot into the staging root: {source}")]
    Chroot {
        /// Errno from `chroot(2)`.
        source: Errno,
    },

    /// Changing into the new root failed.
    #[error("failed to chdir into the new root: {source}")]
    ChdirRoot {
        /// Errno from `chdir(2)`.
        source: Errno,
    },

    /// The tmpfs for pack metadata could not be mounted.
    #[error("failed to mount tmpfs on {target}: {source}")]
    ApexTmpfs {
        /// The pack metadata mount point.
        target: PathBuf,
        /// Errno from `mount(2)`.
        source: Errno,
    },

    /// Relabeling the pack metadata mount point failed.
    #[error("failed to relabel {target}: {source}")]
    ApexRelabel {
        /// The pack metadata mount point.
        target: PathBuf,
        /// Error reported by the relabeling primitive.
        source: io::Error,
    },

    /// Setting permission bits on the pack metadata mount point failed.
    #[error("failed to chmod {target}: {source}")]
    ApexChmod {
        /// The pack metadata mount point.
        target: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Setting ownership of the pack metadata mount point failed.
    #[error("failed to chown {target} to root:root: {source}")]
    ApexChown {
        /// The pack metadata mount point.
        target: PathBuf,
        /// Errno from `chown(2)`.
        source: Errno,
    },

    /// A Bionic artifact for one address-width variant could not be mounted.
    #[error("failed to bind-mount {abi} Bionic artifact {source_path} to {mount_point}: {source}")]
    BionicMount {
        /// Which address-width variant failed.
        abi: Abi,
        /// Artifact inside the runtime pack.
        source_path: PathBuf,
        /// Fixed mount point for the artifact.
        mount_point: PathBuf,
        /// Errno from `mount(2)`.
        source: Errno,
    },

    /// The staged compile step could not be run, or reported failure.
    #[error("failed to run {command}: {reason}")]
    SubProcess {
        /// The launched binary.
        command: String,
        /// Spawn error or exit status description.
        reason: String,
    },
}

impl StageError {
    /// Returns the stable exit code for this failure site.
    ///
    /// Codes are unique per site and form the only failure signal once the
    /// inherited descriptors are closed.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::UnshareNamespace { .. } => 200,
            Self::MakePrivate { .. } => 201,
            Self::BindCoreDir { .. } => 202,
            Self::ChdirStaging { .. } => 203,
            Self::Chroot { .. } => 204,
            Self::ChdirRoot { .. } => 205,
            Self::InvalidSlotSuffix(_) => 207,
            Self::Usage => 208,
            Self::ApexTmpfs { .. } => 209,
            Self::ApexChmod { .. } => 210,
            Self::ApexChown { .. } => 211,
            Self::SubProcess { .. } => 213,
            Self::ApexRelabel { .. } => 214,
            Self::BionicMount {
                abi: Abi::Bits32, ..
            } => 215,
            Self::BionicMount {
                abi: Abi::Bits64, ..
            } => 216,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashSet;

    use super::*;

    fn one_of_each() -> Vec<StageError> {
        let errno = Errno::EPERM;
        let path = PathBuf::from("/postinstall");
        vec![
            StageError::Usage,
            StageError::UnshareNamespace { source: errno },
            StageError::MakePrivate {
                target: path.clone(),
                source: errno,
            },
            StageError::BindCoreDir {
                source_dir: PathBuf::from("/data"),
                target: path.clone(),
                source: errno,
            },
            StageError::InvalidSlotSuffix(InvalidSlotSuffix {
                value: "bad/slot".into(),
            }),
            StageError::ChdirStaging { source: errno },
            StageError::Chroot { source: errno },
            StageError::ChdirRoot { source: errno },
            StageError::ApexTmpfs {
                target: path.clone(),
                source: errno,
            },
            StageError::ApexRelabel {
                target: path.clone(),
                source: io::Error::other("restorecon exited with signal"),
            },
            StageError::ApexChmod {
                target: path.clone(),
                source: io::Error::other("denied"),
            },
            StageError::ApexChown {
                target: path,
                source: errno,
            },
            StageError::BionicMount {
                abi: Abi::Bits32,
                source_path: PathBuf::from("/apex/com.android.runtime/bin/linker"),
                mount_point: PathBuf::from("/bionic/bin/linker"),
                source: errno,
            },
            StageError::BionicMount {
                abi: Abi::Bits64,
                source_path: PathBuf::from("/apex/com.android.runtime/bin/linker64"),
                mount_point: PathBuf::from("/bionic/bin/linker64"),
                source: errno,
            },
            StageError::SubProcess {
                command: "/system/bin/prestage".into(),
                reason: "exited with exit status: 1".into(),
            },
        ]
    }

    #[test]
    fn exit_codes_are_unique_per_failure_site() {
        let errors = one_of_each();
        let codes: HashSet<u8> = errors.iter().map(StageError::exit_code).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn exit_codes_match_the_documented_contract() {
        assert_eq!(StageError::Usage.exit_code(), 208);
        assert_eq!(
            StageError::UnshareNamespace {
                source: Errno::EPERM
            }
            .exit_code(),
            200
        );
        assert_eq!(
            StageError::InvalidSlotSuffix(InvalidSlotSuffix { value: String::new() }).exit_code(),
            207
        );
        assert_eq!(
            StageError::SubProcess {
                command: String::new(),
                reason: String::new(),
            }
            .exit_code(),
            213
        );
        let bionic32 = StageError::BionicMount {
            abi: Abi::Bits32,
            source_path: PathBuf::new(),
            mount_point: PathBuf::new(),
            source: Errno::EACCES,
        };
        let bionic64 = StageError::BionicMount {
            abi: Abi::Bits64,
            source_path: PathBuf::new(),
            mount_point: PathBuf::new(),
            source: Errno::EACCES,
        };
        assert_eq!(bionic32.exit_code(), 215);
        assert_eq!(bionic64.exit_code(), 216);
    }
}

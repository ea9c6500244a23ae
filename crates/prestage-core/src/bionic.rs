//! Bind-mounting of Bionic artifacts from the activated runtime pack.

use std::path::Path;

use prestage_common::constants::BIONIC_LIB_NAMES;
use prestage_common::types::BionicSet;

use crate::error::{Result, StageError};
use crate::mount;

/// Mounts the linker and core libraries for one address-width variant.
///
/// A missing linker source means the active runtime pack does not provide
/// this variant; the whole variant is skipped without error.
///
/// # Errors
///
/// Returns [`StageError::BionicMount`] tagged with the variant's ABI if any
/// bind mount fails.
pub fn mount_bionic(set: &BionicSet) -> Result<()> {
    let linker_source = Path::new(set.linker_source);
    if !linker_source.exists() {
        tracing::info!(
            abi = %set.abi,
            linker = set.linker_source,
            "linker not present, skipping Bionic mounts"
        );
        return Ok(());
    }

    bind(set, linker_source, Path::new(set.linker_mount_point))?;
    for name in BIONIC_LIB_NAMES {
        let source = Path::new(set.lib_source_dir).join(name);
        let mount_point = Path::new(set.lib_mount_dir).join(name);
        bind(set, &source, &mount_point)?;
    }
    tracing::debug!(abi = %set.abi, "Bionic artifacts mounted");
    Ok(())
}

fn bind(set: &BionicSet, source: &Path, mount_point: &Path) -> Result<()> {
    mount::bind_mount(source, mount_point).map_err(|errno| StageError::BionicMount {
        abi: set.abi,
        source_path: source.to_path_buf(),
        mount_point: mount_point.to_path_buf(),
        source: errno,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use prestage_common::types::Abi;

    use super::*;

    fn leaked(path: std::path::PathBuf) -> &'static str {
        Box::leak(path.to_string_lossy().into_owned().into_boxed_str())
    }

    #[test]
    fn an_absent_linker_skips_the_variant_without_error() {
        let set = BionicSet {
            abi: Abi::Bits32,
            linker_source: "/nonexistent/runtime/bin/linker",
            linker_mount_point: "/nonexistent/bionic/bin/linker",
            lib_source_dir: "/nonexistent/runtime/lib/bionic",
            lib_mount_dir: "/nonexistent/bionic/lib",
        };
        // Were a mount attempted it would fail; Ok proves the skip.
        mount_bionic(&set).unwrap();
    }

    #[test]
    fn a_failed_mount_reports_the_variant_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let linker = dir.path().join("linker64");
        std::fs::write(&linker, b"\x7fELF").unwrap();

        let set = BionicSet {
            abi: Abi::Bits64,
            linker_source: leaked(linker),
            // The mount point does not exist, so the bind mount cannot
            // succeed regardless of privileges.
            linker_mount_point: leaked(dir.path().join("missing/bin/linker64")),
            lib_source_dir: leaked(dir.path().join("lib64")),
            lib_mount_dir: leaked(dir.path().join("missing/lib64")),
        };

        let error = mount_bionic(&set).unwrap_err();
        assert_eq!(error.exit_code(), 216);
        match error {
            StageError::BionicMount { abi, .. } => assert_eq!(abi, Abi::Bits64),
            other => panic!("unexpected error: {other}"),
        }
    }
}

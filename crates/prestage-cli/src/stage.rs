//! The ordered staging sequence.
//!
//! One forward path, no retries: close inherited descriptors, isolate the
//! mount namespace, assemble the staging root, switch into it, activate the
//! runtime packs, mount Bionic, run the compile step. Everything after pack
//! activation executes inside an [`ActivationScope`], so deactivation runs
//! on every exit, success or failure.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use prestage_common::constants;
use prestage_common::error::InvalidSlotSuffix;
use prestage_common::types::TargetSlot;
use prestage_core::apex::{ActivationScope, BindApexd};
use prestage_core::error::{Result, StageError};
use prestage_core::selinux::Restorecon;
use prestage_core::{bionic, descriptor, mount, ns, staging};

/// Runs the full staging sequence for the given argument vector.
///
/// # Errors
///
/// Returns the [`StageError`] for the first step that fails; the caller
/// maps it to the process exit code.
pub fn run(args: &[OsString]) -> Result<()> {
    // The command, status channel and target slot, at a minimum.
    if args.len() < 3 {
        return Err(StageError::Usage);
    }

    // Inherited descriptors must not leak into the staged environment.
    // From here on, diagnostics are best-effort only.
    descriptor::close_inherited(&args[1]);

    ns::unshare_mount_namespace()?;
    ns::make_mount_private(Path::new(constants::STAGING_ROOT))?;

    bind_core_dirs()?;

    // Validated before any partition path is built from it.
    let slot = parse_slot(&args[2])?;
    mount_optional_partitions(&slot);

    staging::prepare_apex_mount_point(&Restorecon)?;
    staging::enter_root()?;

    let scope = ActivationScope::enter(BindApexd::new(), Path::new(constants::SYSTEM_APEX_DIR));

    bionic::mount_bionic(&constants::BIONIC_32)?;
    bionic::mount_bionic(&constants::BIONIC_64)?;

    run_target(&forward_args(args))?;

    // Packs deactivate when the scope drops, here and on the early returns
    // above alike.
    drop(scope);
    Ok(())
}

fn parse_slot(arg: &OsStr) -> Result<TargetSlot> {
    let raw = arg.to_str().ok_or_else(|| InvalidSlotSuffix {
        value: arg.to_string_lossy().into_owned(),
    })?;
    Ok(TargetSlot::parse(raw)?)
}

fn bind_core_dirs() -> Result<()> {
    for dir in constants::CORE_BIND_DIRS {
        let source = Path::new(dir);
        let target = PathBuf::from(format!("{}{dir}", constants::STAGING_ROOT));
        mount::bind_mount(source, &target).map_err(|errno| StageError::BindCoreDir {
            source_dir: source.to_path_buf(),
            target: target.clone(),
            source: errno,
        })?;
    }
    Ok(())
}

/// Mounts the slot's vendor and product partitions read-only, best-effort.
///
/// The update engine does not mount these; they are wanted for the packages
/// they carry but the compile step can run without them.
fn mount_optional_partitions(slot: &TargetSlot) {
    for name in constants::OPTIONAL_PARTITIONS {
        let device = slot.partition_device(name);
        let target = PathBuf::from(format!("{}/{name}", constants::STAGING_ROOT));
        mount::try_mount_partition(&device, &target);
    }
}

/// Builds the forwarded argument vector: the fixed target binary, then
/// every caller argument except the program name and the status-channel
/// descriptor.
fn forward_args(args: &[OsString]) -> Vec<OsString> {
    let mut cmd = Vec::with_capacity(args.len());
    cmd.push(OsString::from(constants::TARGET_BINARY));
    cmd.extend(args.iter().skip(2).cloned());
    cmd
}

fn run_target(cmd: &[OsString]) -> Result<()> {
    let command = cmd[0].to_string_lossy().into_owned();
    tracing::info!(%command, "launching compile step");
    let status = Command::new(&cmd[0])
        .args(&cmd[1..])
        .status()
        .map_err(|error| StageError::SubProcess {
            command: command.clone(),
            reason: error.to_string(),
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(StageError::SubProcess {
            command,
            reason: format!("exited with {status}"),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    fn argv(parts: &[&str]) -> Vec<OsString> {
        parts.iter().map(OsString::from).collect()
    }

    #[test]
    fn too_few_arguments_fail_before_any_side_effect() {
        // Returns straight from the argument check; nothing is closed or
        // mounted, which is what makes this safe to run in-process.
        for parts in [&["prestage-chroot"][..], &["prestage-chroot", "5"][..]] {
            let error = run(&argv(parts)).unwrap_err();
            assert_eq!(error.exit_code(), 208);
        }
    }

    #[test]
    fn forwarded_vector_drops_program_name_and_status_fd() {
        let args = argv(&[
            "prestage-chroot",
            "5",
            "_b",
            "dexopt",
            "--compiler-filter",
            "speed-profile",
        ]);
        let cmd = forward_args(&args);
        assert_eq!(
            cmd,
            argv(&[
                "/system/bin/prestage",
                "_b",
                "dexopt",
                "--compiler-filter",
                "speed-profile",
            ])
        );
    }

    #[test]
    fn forwarded_vector_preserves_a_bare_slot_invocation() {
        let cmd = forward_args(&argv(&["prestage-chroot", "5", "_a"]));
        assert_eq!(cmd, argv(&["/system/bin/prestage", "_a"]));
    }

    #[test]
    fn slot_parsing_accepts_valid_and_rejects_invalid_suffixes() {
        assert_eq!(
            parse_slot(OsStr::new("_a")).unwrap().as_str(),
            "_a"
        );
        let error = parse_slot(OsStr::new("_a/../evil")).unwrap_err();
        assert_eq!(error.exit_code(), 207);
    }

    #[test]
    fn slot_parsing_rejects_non_utf8_arguments() {
        use std::os::unix::ffi::OsStringExt;

        let arg = OsString::from_vec(vec![0x5f, 0xff]);
        let error = parse_slot(&arg).unwrap_err();
        assert_eq!(error.exit_code(), 207);
    }
}

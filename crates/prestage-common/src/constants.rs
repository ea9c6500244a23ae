//! Fixed filesystem layout consumed by the staging sequence.
//!
//! Everything here is a compiled-in contract with the platform: the staging
//! root prepared by the update engine, the host directories the compile
//! step needs, the by-name partition links, and the Bionic artifacts
//! provided by the runtime pack.

use crate::types::{Abi, BionicSet};

/// The staging root that becomes the process root after the switch.
pub const STAGING_ROOT: &str = "/postinstall";

/// Host directories bind-mounted into the staging root before the switch.
pub const CORE_BIND_DIRS: [&str; 4] = ["/data", "/dev", "/proc", "/sys"];

/// Directory of by-name partition links.
pub const DEV_BLOCK_BY_NAME_DIR: &str = "/dev/block/by-name";

/// Filesystem type used for the optional partition mounts.
pub const PARTITION_FS_TYPE: &str = "ext4";

/// Partitions mounted read-only on a best-effort basis, by conventional name.
pub const OPTIONAL_PARTITIONS: [&str; 2] = ["vendor", "product"];

/// Mount point for runtime-pack metadata, as seen before the root switch.
pub const APEX_MOUNT_DIR: &str = "/postinstall/apex";

/// Root under which activated packs are mounted, as seen after the switch.
pub const APEX_ROOT: &str = "/apex";

/// Directory scanned for activatable packs, as seen after the switch.
pub const SYSTEM_APEX_DIR: &str = "/system/apex";

/// Permission bits applied to [`APEX_MOUNT_DIR`] once it is labeled.
pub const APEX_DIR_MODE: u32 = 0o755;

/// The compile step launched inside the staged root.
pub const TARGET_BINARY: &str = "/system/bin/prestage";

/// Core C-runtime libraries bind-mounted for each address-width variant.
pub const BIONIC_LIB_NAMES: [&str; 3] = ["libc.so", "libm.so", "libdl.so"];

/// Bionic artifacts for 32-bit executables.
pub const BIONIC_32: BionicSet = BionicSet {
    abi: Abi::Bits32,
    linker_source: "/apex/com.android.runtime/bin/linker",
    linker_mount_point: "/bionic/bin/linker",
    lib_source_dir: "/apex/com.android.runtime/lib/bionic",
    lib_mount_dir: "/bionic/lib",
};

/// Bionic artifacts for 64-bit executables.
pub const BIONIC_64: BionicSet = BionicSet {
    abi: Abi::Bits64,
    linker_source: "/apex/com.android.runtime/bin/linker64",
    linker_mount_point: "/bionic/bin/linker64",
    lib_source_dir: "/apex/com.android.runtime/lib64/bionic",
    lib_mount_dir: "/bionic/lib64",
};

//! Domain primitive types used across the prestage workspace.

use std::fmt;
use std::path::PathBuf;

use crate::constants;
use crate::error::InvalidSlotSuffix;

/// Validated update-slot suffix (for example `_a` or `_b`).
///
/// Partition device paths are only ever built from this type, so an
/// unvalidated argument can never reach path construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetSlot(String);

impl TargetSlot {
    /// Validates a raw slot-suffix argument.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSlotSuffix`] unless the input is non-empty ASCII
    /// consisting of alphanumerics and underscores only.
    pub fn parse(raw: &str) -> Result<Self, InvalidSlotSuffix> {
        let legal = !raw.is_empty()
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_');
        if legal {
            Ok(Self(raw.to_owned()))
        } else {
            Err(InvalidSlotSuffix {
                value: raw.to_owned(),
            })
        }
    }

    /// Returns the suffix as received.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the by-name device path for `partition` on this slot.
    #[must_use]
    pub fn partition_device(&self, partition: &str) -> PathBuf {
        PathBuf::from(format!(
            "{}/{partition}{}",
            constants::DEV_BLOCK_BY_NAME_DIR,
            self.0
        ))
    }
}

impl fmt::Display for TargetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address-width variant of the Bionic artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abi {
    /// 32-bit executables.
    Bits32,
    /// 64-bit executables.
    Bits64,
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bits32 => write!(f, "32-bit"),
            Self::Bits64 => write!(f, "64-bit"),
        }
    }
}

/// Compiled-in description of the Bionic artifacts for one address width.
///
/// Source paths live under the activated runtime pack; mount points are the
/// fixed locations the dynamic linker is found at inside the staged root.
#[derive(Debug, Clone, Copy)]
pub struct BionicSet {
    /// Which address width this set serves.
    pub abi: Abi,
    /// Dynamic linker inside the runtime pack.
    pub linker_source: &'static str,
    /// Where the linker is bind-mounted.
    pub linker_mount_point: &'static str,
    /// Directory holding the core libraries inside the runtime pack.
    pub lib_source_dir: &'static str,
    /// Directory the core libraries are bind-mounted into.
    pub lib_mount_dir: &'static str,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn slot_suffix_accepts_conventional_values() {
        for raw in ["_a", "_b", "a", "b", "slot_0", "A1"] {
            let slot = TargetSlot::parse(raw).unwrap();
            assert_eq!(slot.as_str(), raw);
        }
    }

    #[test]
    fn slot_suffix_rejects_empty_and_path_metacharacters() {
        for raw in ["", "_a/../b", "a b", "a\n", "über", "..", "a-b"] {
            let err = TargetSlot::parse(raw).unwrap_err();
            assert_eq!(err.value, raw);
        }
    }

    #[test]
    fn partition_device_is_built_from_validated_suffix() {
        let slot = TargetSlot::parse("_b").unwrap();
        assert_eq!(
            slot.partition_device("vendor"),
            PathBuf::from("/dev/block/by-name/vendor_b")
        );
        assert_eq!(
            slot.partition_device("product"),
            PathBuf::from("/dev/block/by-name/product_b")
        );
    }
}

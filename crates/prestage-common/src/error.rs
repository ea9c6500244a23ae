//! Error types shared across the prestage workspace.

use thiserror::Error;

/// A slot-suffix argument failed format validation.
///
/// The suffix names one of the device's update slots and is concatenated
/// into partition device paths; anything outside `[A-Za-z0-9_]+` is
/// rejected before any path is built from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("target slot suffix not legal: {value:?}")]
pub struct InvalidSlotSuffix {
    /// The rejected argument, as received.
    pub value: String,
}

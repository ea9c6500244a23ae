//! Security-label restoration seam.

use std::io;
use std::path::Path;
use std::process::Command;

/// Restores security labels to their policy defaults.
pub trait Relabel {
    /// Relabels `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the relabel could not be performed.
    fn relabel(&self, path: &Path) -> io::Result<()>;
}

/// Relabels by invoking the platform `restorecon(8)` utility.
#[derive(Debug, Default, Clone, Copy)]
pub struct Restorecon;

impl Relabel for Restorecon {
    fn relabel(&self, path: &Path) -> io::Result<()> {
        let status = Command::new("restorecon").arg(path).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("restorecon exited with {status}")))
        }
    }
}

//! Best-effort closing of inherited file descriptors.
//!
//! The caller hands over its standard streams and a status-channel
//! descriptor; none of them may leak across the staging transition.

use std::ffi::OsStr;
use std::os::fd::RawFd;

use nix::unistd;

/// Closes `fd` if it is non-negative.
///
/// The close result is ignored: reporting it would open a new descriptor,
/// which is exactly what this step exists to prevent.
pub fn close_descriptor(fd: RawFd) {
    if fd >= 0 {
        let _ = unistd::close(fd);
    }
}

/// Parses a caller-supplied descriptor number.
///
/// Returns `None` for anything that is not a plain decimal integer; the
/// caller then has nothing to close.
#[must_use]
pub fn parse_descriptor(arg: &OsStr) -> Option<RawFd> {
    arg.to_str()?.trim().parse::<RawFd>().ok()
}

/// Closes the standard streams and the status channel named by `status_fd`.
///
/// After this returns, no output channel exists; failures report through
/// the process exit code and best-effort logging only.
pub fn close_inherited(status_fd: &OsStr) {
    close_descriptor(libc::STDIN_FILENO);
    close_descriptor(libc::STDOUT_FILENO);
    close_descriptor(libc::STDERR_FILENO);
    if let Some(fd) = parse_descriptor(status_fd) {
        close_descriptor(fd);
    }
}

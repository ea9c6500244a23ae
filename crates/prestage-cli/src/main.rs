//! # prestage-chroot
//!
//! Stages a private chroot of the post-update filesystem and launches the
//! ahead-of-time compile step inside it. Invoked as:
//!
//! ```text
//! prestage-chroot <status-fd> <target-slot-suffix> <sub-command> [args...]
//! ```
//!
//! Every failure site terminates with its own stable exit code; 0 means the
//! compile step ran and exited cleanly.

mod stage;

use std::ffi::OsString;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<OsString> = std::env::args_os().collect();
    match stage::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Best-effort: the standard streams are closed early in the
            // sequence, so this may go nowhere.
            tracing::error!(%error, code = error.exit_code(), "staging failed");
            ExitCode::from(error.exit_code())
        }
    }
}

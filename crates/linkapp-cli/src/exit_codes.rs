//! Process exit codes.
//! Any non-zero code means the build step must stop.

use linkapp_core::BundleError;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_STEP_FAILED: i32 = 1; // External tool returned non-zero
pub const EXIT_FATAL: i32 = 2; // Generation or config error

/// Exit code for an error surfaced by a command.
pub fn for_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|e| e.downcast_ref::<BundleError>())
        .map(BundleError::exit_code)
        .unwrap_or(EXIT_FATAL)
}

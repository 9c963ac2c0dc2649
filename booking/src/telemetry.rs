//! Tracing subscriber setup for hosts embedding the booking core.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a JSON `fmt` subscriber filtered by `RUST_LOG`.
///
/// A subscriber that is already installed is kept; the failure is logged
/// through it instead of being returned.
pub fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

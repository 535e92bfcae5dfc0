//! Clock shared by dispatch and the timer task

use std::time::Instant;

/// Current time on tokio's clock, as a std `Instant`
///
/// Going through tokio keeps paused-time tests deterministic.
pub(crate) fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

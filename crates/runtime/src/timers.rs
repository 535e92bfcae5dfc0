//! Background task that fires engine timers
//!
//! Sleeps until the engine's next deadline, or until a dispatch signals that
//! the deadlines may have changed, and then advances the engine.
//!
//! A handler that panics here does not end the task. The panic is parked in
//! `Shared::handler_panic` and resumed on the thread of the next dispatch.

use crate::button::Shared;
use crate::clock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error};

/// Run until the engine is torn down (or the task is aborted)
pub(crate) async fn run<P: Send + 'static>(shared: Arc<Shared<P>>) {
    debug!("Click timer task started");

    loop {
        let deadline = {
            let engine = shared.engine.lock();
            if engine.is_torn_down() {
                break;
            }
            engine.next_deadline()
        };

        match deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = sleep_until(Instant::from_std(deadline)) => fire_due(&shared),
                    _ = shared.wake.notified() => {}
                }
            }
            None => shared.wake.notified().await,
        }
    }

    debug!("Click timer task stopped");
}

fn fire_due<P>(shared: &Shared<P>) {
    let fired = panic::catch_unwind(AssertUnwindSafe(|| {
        shared.engine.lock().advance(clock::now());
    }));

    if let Err(payload) = fired {
        error!("Click handler panicked during a timed fire; resuming it on the next dispatch");
        let mut parked = shared.handler_panic.lock();
        if parked.is_none() {
            *parked = Some(payload);
        }
    }
}

//! Smart button handle
//!
//! Wraps a `ClickEngine` for use from async code. Raw events are dispatched
//! synchronously on the caller's thread; expiries are handled by a timer
//! task spawned on the current tokio runtime.

use crate::clock;
use crate::timers;
use clickgate_core::{
    AmbientConfig, ClickEngine, ConfigLayer, EngineState, EngineStats, Handlers, RawEvent,
    Resolution,
};
use parking_lot::Mutex;
use std::any::Any;
use std::panic;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::info;

/// State shared between the handle and its timer task
pub(crate) struct Shared<P> {
    /// Engine; every dispatch, expiry and teardown happens under this lock
    pub(crate) engine: Mutex<ClickEngine<P>>,
    /// Signalled whenever deadlines may have changed
    pub(crate) wake: Notify,
    /// First handler panic raised on the timer task, not yet resumed
    pub(crate) handler_panic: Mutex<Option<Box<dyn Any + Send>>>,
}

/// Primary action control with debounce/throttle and double-click handling
///
/// Handlers run while the engine lock is held. They must not call back into
/// the same `SmartButton`.
///
/// A handler panic during `click`/`double_click` unwinds out of that call. A
/// panic during a timed fire is caught, the timers keep running, and the
/// panic is resumed from the next `dispatch` after that event is processed.
pub struct SmartButton<P: Send + 'static> {
    shared: Arc<Shared<P>>,
    timers: JoinHandle<()>,
}

impl<P: Send + 'static> SmartButton<P> {
    /// Create a button and spawn its timer task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(overrides: ConfigLayer, ambient: AmbientConfig, handlers: Handlers<P>) -> Self {
        let shared = Arc::new(Shared {
            engine: Mutex::new(ClickEngine::new(overrides, ambient, handlers)),
            wake: Notify::new(),
            handler_panic: Mutex::new(None),
        });
        let timers = tokio::spawn(timers::run(Arc::clone(&shared)));

        Self { shared, timers }
    }

    /// Raw single activation
    pub fn click(&self, payload: P) {
        self.dispatch(RawEvent::single(payload));
    }

    /// Raw double activation
    pub fn double_click(&self, payload: P) {
        self.dispatch(RawEvent::double(payload));
    }

    /// Dispatch a raw event at the current time
    pub fn dispatch(&self, event: RawEvent<P>) {
        self.shared.engine.lock().dispatch(clock::now(), event);
        self.shared.wake.notify_one();

        let parked = self.shared.handler_panic.lock().take();
        if let Some(payload) = parked {
            panic::resume_unwind(payload);
        }
    }

    /// Replace the per-instance overrides and re-validate them
    pub fn set_overrides(&self, overrides: ConfigLayer) {
        self.shared.engine.lock().set_overrides(overrides);
    }

    /// Enable or disable the button
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.engine.lock().set_enabled(enabled);
    }

    /// Configuration as it would resolve right now
    pub fn resolution(&self) -> Resolution {
        self.shared.engine.lock().resolution()
    }

    /// Engine counters
    pub fn stats(&self) -> EngineStats {
        self.shared.engine.lock().stats()
    }

    /// Timer state at the current time
    pub fn state(&self) -> EngineState {
        self.shared.engine.lock().state(clock::now())
    }

    /// Whether teardown has run
    pub fn is_torn_down(&self) -> bool {
        self.shared.engine.lock().is_torn_down()
    }

    /// Cancel every pending timer and stop the timer task
    ///
    /// Takes the engine lock, so a handler running on the timer task finishes
    /// first. After this returns no handler is invoked again.
    pub fn teardown(&self) {
        let stats = {
            let mut engine = self.shared.engine.lock();
            if engine.is_torn_down() {
                return;
            }
            engine.teardown();
            engine.stats()
        };
        self.timers.abort();
        info!(
            "Smart button torn down ({} single, {} double fires)",
            stats.single_fires, stats.double_fires
        );
    }
}

impl<P: Send + 'static> Drop for SmartButton<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}

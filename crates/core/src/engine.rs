//! Click engine: disambiguation feeding rate limiting
//!
//! ```text
//! raw single ──► [disambiguator, if a double handler is bound] ──► [rate limiter] ──► on_single
//! raw double ──► cancel held single ──► on_double
//! ```
//!
//! The engine is sans-IO. The host passes the current time into
//! [`ClickEngine::dispatch`] and [`ClickEngine::advance`], and uses
//! [`ClickEngine::next_deadline`] to know when to call back.

use crate::config::{AmbientConfig, ConfigLayer, Resolution};
use crate::disambiguate::Disambiguator;
use crate::event::{ActivationKind, RawEvent};
use crate::limiter::{LimiterState, RatePolicy, RateLimiter};
use crate::timer::{earliest, Admission};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// Consumer callback
pub type Handler<P> = Box<dyn FnMut(P) + Send>;

/// Consumer callbacks for single and double activations
///
/// Registering a double handler is what turns disambiguation on.
pub struct Handlers<P> {
    on_single: Handler<P>,
    on_double: Option<Handler<P>>,
}

impl<P> Handlers<P> {
    /// Handlers with only a single-activation callback
    pub fn new(on_single: impl FnMut(P) + Send + 'static) -> Self {
        Self {
            on_single: Box::new(on_single),
            on_double: None,
        }
    }

    /// Register the double-activation callback
    pub fn with_double(mut self, on_double: impl FnMut(P) + Send + 'static) -> Self {
        self.on_double = Some(Box::new(on_double));
        self
    }

    /// Whether a double-activation callback is registered
    pub fn double_bound(&self) -> bool {
        self.on_double.is_some()
    }
}

impl<P> fmt::Debug for Handlers<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("double_bound", &self.double_bound())
            .finish_non_exhaustive()
    }
}

/// Counters describing what the engine has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Raw single events received
    pub raw_singles: u64,
    /// Raw double events received
    pub raw_doubles: u64,
    /// Times `on_single` ran
    pub single_fires: u64,
    /// Times `on_double` ran
    pub double_fires: u64,
    /// Held singles cancelled by a double
    pub suppressed: u64,
    /// Activations replaced by a later one before firing
    pub superseded: u64,
    /// Events ignored because the engine was disabled or torn down
    pub dropped: u64,
}

/// Snapshot of the engine's timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineState {
    /// A single is held waiting for a possible double
    pub awaiting_double: bool,
    /// Rate limiter sub-state
    pub limiter: LimiterState,
    /// Teardown has run
    pub torn_down: bool,
}

/// A single held by the disambiguator, with the policy it will be limited by
#[derive(Debug)]
struct Held<P> {
    payload: P,
    policy: RatePolicy,
}

/// Single/double disambiguation plus rate limiting for one control
pub struct ClickEngine<P> {
    /// Per-instance configuration layer
    overrides: ConfigLayer,
    /// Shared ambient defaults
    ambient: AmbientConfig,
    /// Consumer callbacks
    handlers: Handlers<P>,
    /// Settle timer for singles
    disambiguator: Disambiguator<Held<P>>,
    /// Debounce/throttle timers
    limiter: RateLimiter<P>,
    /// Disabled engines drop raw events
    enabled: bool,
    /// Set once by `teardown`
    torn_down: bool,
    stats: EngineStats,
}

impl<P> ClickEngine<P> {
    /// Create an engine and validate its configuration once
    pub fn new(overrides: ConfigLayer, ambient: AmbientConfig, handlers: Handlers<P>) -> Self {
        let resolution = ambient.resolve(&overrides);
        resolution.report();

        Self {
            limiter: RateLimiter::new(resolution.config.rate_policy()),
            overrides,
            ambient,
            handlers,
            disambiguator: Disambiguator::new(),
            enabled: true,
            torn_down: false,
            stats: EngineStats::default(),
        }
    }

    /// Resolve the current configuration without reporting anomalies
    pub fn resolution(&self) -> Resolution {
        self.ambient.resolve(&self.overrides)
    }

    /// Per-instance overrides
    pub fn overrides(&self) -> &ConfigLayer {
        &self.overrides
    }

    /// Replace the per-instance overrides and re-validate
    pub fn set_overrides(&mut self, overrides: ConfigLayer) {
        self.overrides = overrides;
        self.resolution().report();
    }

    /// Enable or disable the engine
    ///
    /// While disabled, raw events are dropped. Timers already armed still fire.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether raw events are accepted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Counters so far
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Whether teardown has run
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Timer state as seen at `now`
    pub fn state(&self, now: Instant) -> EngineState {
        EngineState {
            awaiting_double: self.disambiguator.is_waiting(),
            limiter: self.limiter.state(now),
            torn_down: self.torn_down,
        }
    }

    /// Earliest time at which [`advance`](Self::advance) has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.torn_down {
            return None;
        }
        earliest(self.disambiguator.deadline(), self.limiter.next_deadline())
    }

    /// Process a raw event arriving at `now`
    ///
    /// Timers already due at `now` fire first, so events and expiries are
    /// handled in time order.
    pub fn dispatch(&mut self, now: Instant, event: RawEvent<P>) {
        if self.torn_down {
            self.stats.dropped += 1;
            debug!("Dropping {} activation after teardown", event.kind);
            return;
        }

        self.advance(now);

        match event.kind {
            ActivationKind::Single => self.stats.raw_singles += 1,
            ActivationKind::Double => self.stats.raw_doubles += 1,
        }

        if !self.enabled {
            self.stats.dropped += 1;
            debug!("Dropping {} activation while disabled", event.kind);
            return;
        }

        let resolution = self.resolution();
        resolution.report();
        let config = resolution.config;

        match event.kind {
            ActivationKind::Double => self.on_raw_double(event.payload),
            ActivationKind::Single if self.handlers.double_bound() => {
                let held = Held {
                    payload: event.payload,
                    policy: config.rate_policy(),
                };
                let settle = config.effective_dbl_delay();
                if self.disambiguator.hold(now, settle, held).is_some() {
                    self.stats.superseded += 1;
                    debug!("Single replaced a held single; settle timer restarted");
                }
                debug!("Holding single for {:?} awaiting a double", settle);
            }
            ActivationKind::Single => self.rate_limit(now, config.rate_policy(), event.payload),
        }
    }

    /// Fire every timer due at or before `now`, in deadline order
    ///
    /// Each timer fires as of its own deadline, so one coarse call is
    /// equivalent to many fine-grained ones.
    pub fn advance(&mut self, now: Instant) {
        while let Some(deadline) = self.next_deadline().filter(|deadline| *deadline <= now) {
            if let Some(payload) = self.limiter.poll(deadline) {
                self.fire_single(payload);
            }
            if let Some(held) = self.disambiguator.poll(deadline) {
                debug!("Single settled; releasing to rate limiter");
                self.rate_limit(deadline, held.policy, held.payload);
            }
        }
    }

    /// Cancel every timer; no handler runs after this returns
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let held = self.disambiguator.cancel().is_some();
        let limited = self.limiter.cancel().is_some();
        self.torn_down = true;
        debug!(
            "Click engine torn down (held single: {}, pending limited fire: {})",
            held, limited
        );
    }

    fn on_raw_double(&mut self, payload: P) {
        let Some(on_double) = self.handlers.on_double.as_mut() else {
            debug!("No double handler bound; ignoring double activation");
            return;
        };

        if self.disambiguator.confirm_double().is_some() {
            self.stats.suppressed += 1;
            debug!("Double activation suppressed the held single");
        }

        self.stats.double_fires += 1;
        on_double(payload);
    }

    fn rate_limit(&mut self, now: Instant, policy: RatePolicy, payload: P) {
        if self.limiter.policy() != policy {
            debug!("Rate policy changed: {} -> {}", self.limiter.policy(), policy);
            if self.limiter.reconfigure(policy).is_some() {
                self.stats.superseded += 1;
                debug!("Pending activation discarded by policy change");
            }
            // A retuned window may already have closed
            if let Some(payload) = self.limiter.poll(now) {
                self.fire_single(payload);
            }
        }

        match self.limiter.submit(now, payload) {
            Admission::Fire(payload) => self.fire_single(payload),
            Admission::Held { displaced } => {
                if displaced.is_some() {
                    self.stats.superseded += 1;
                }
            }
        }
    }

    fn fire_single(&mut self, payload: P) {
        self.stats.single_fires += 1;
        (self.handlers.on_single)(payload);
    }
}

impl<P> fmt::Debug for ClickEngine<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickEngine")
            .field("overrides", &self.overrides)
            .field("handlers", &self.handlers)
            .field("policy", &self.limiter.policy())
            .field("awaiting_double", &self.disambiguator.is_waiting())
            .field("enabled", &self.enabled)
            .field("torn_down", &self.torn_down)
            .field("stats", &self.stats)
            .finish()
    }
}

//! Interaction rate limiting and click disambiguation for Clickgate
//!
//! This crate provides:
//! - Debounce and throttle primitives driven by an explicit clock
//! - A rate limiter stage (pass-through, debounce or throttle)
//! - Single/double activation disambiguation
//! - Layered configuration with validation and warnings
//! - `ClickEngine`, which wires the stages together behind two callbacks
//!
//! Nothing here sleeps or spawns. Hosts feed in the current time and call
//! back at [`ClickEngine::next_deadline`].

pub mod config;
pub mod debounce;
pub mod disambiguate;
pub mod engine;
pub mod event;
pub mod limiter;
pub mod throttle;
pub mod timer;

// Re-exports
pub use config::{AmbientConfig, ConfigAnomaly, ConfigError, ConfigLayer, EngineConfig, Model, Resolution};
pub use debounce::Debouncer;
pub use disambiguate::Disambiguator;
pub use engine::{ClickEngine, EngineState, EngineStats, Handler, Handlers};
pub use event::{ActivationKind, RawEvent};
pub use limiter::{LimiterState, RateLimiter, RatePolicy};
pub use throttle::Throttler;
pub use timer::{Admission, PendingTimer, TimerSlot};

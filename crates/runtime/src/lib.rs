//! Tokio host for Clickgate click engines
//!
//! This crate provides:
//! - `SmartButton`, a handle that owns a `ClickEngine` and drives its timers
//!   on the tokio event loop
//! - Synchronous teardown: once `teardown()` (or drop) returns, no handler
//!   runs again
//!
//! Timing uses tokio's clock, so tests can run on paused time.

pub mod button;
mod clock;
mod timers;

// Re-exports
pub use button::SmartButton;
pub use clickgate_core::{
    ActivationKind, AmbientConfig, ConfigLayer, EngineState, EngineStats, Handlers,
    LimiterState, RawEvent, Resolution,
};

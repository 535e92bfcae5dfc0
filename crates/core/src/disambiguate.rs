//! Single/double activation disambiguation
//!
//! A single activation is held for a settle period. If a double activation
//! arrives first the held single is suppressed for good; otherwise it is
//! released when the settle timer expires.

use crate::timer::TimerSlot;
use std::time::{Duration, Instant};

/// Holds at most one unconfirmed single activation
#[derive(Debug, Clone)]
pub struct Disambiguator<T> {
    settle: TimerSlot<T>,
}

impl<T> Disambiguator<T> {
    /// Create an idle disambiguator
    pub const fn new() -> Self {
        Self {
            settle: TimerSlot::new(),
        }
    }

    /// Hold a single activation for `settle` from `now`
    ///
    /// A single arriving while another is held restarts the wait and replaces
    /// the held value; the replaced value is returned and never released.
    pub fn hold(&mut self, now: Instant, settle: Duration, value: T) -> Option<T> {
        self.settle.arm(now + settle, value)
    }

    /// A double activation arrived: cancel the settle timer
    ///
    /// Returns the suppressed single, if one was held.
    pub fn confirm_double(&mut self) -> Option<T> {
        self.settle.cancel()
    }

    /// Release the held single if its settle period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        self.settle.take_due(now).map(|timer| timer.value)
    }

    /// Deadline of the settle timer
    pub fn deadline(&self) -> Option<Instant> {
        self.settle.deadline()
    }

    /// Whether a single is awaiting a possible double
    pub fn is_waiting(&self) -> bool {
        self.settle.is_armed()
    }

    /// Drop the held single without releasing it
    pub fn cancel(&mut self) -> Option<T> {
        self.settle.cancel()
    }
}

impl<T> Default for Disambiguator<T> {
    fn default() -> Self {
        Self::new()
    }
}

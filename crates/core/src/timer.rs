//! Owned, cancellable timer slots
//!
//! The engine never schedules real timers. Each stage keeps a `TimerSlot`
//! holding at most one deadline (and the value that fires with it); the host
//! asks for the earliest deadline and calls back in when it has passed.

use std::time::Instant;

/// A scheduled future firing: the deadline plus the value it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer<T> {
    /// When the timer expires
    pub deadline: Instant,
    /// Value delivered on expiry
    pub value: T,
}

/// Holds at most one pending timer of a given kind
///
/// Arming always replaces the previous timer, so two timers of the same
/// kind can never race each other.
#[derive(Debug, Clone)]
pub struct TimerSlot<T> {
    pending: Option<PendingTimer<T>>,
}

impl<T> TimerSlot<T> {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Arm the slot, returning the value of the timer it replaced (if any)
    pub fn arm(&mut self, deadline: Instant, value: T) -> Option<T> {
        self.pending
            .replace(PendingTimer { deadline, value })
            .map(|old| old.value)
    }

    /// Cancel the pending timer, returning its value
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|timer| timer.value)
    }

    /// Deadline of the pending timer
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|timer| timer.deadline)
    }

    /// Whether a timer is armed
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the timer if it has expired at `now`
    pub fn take_due(&mut self, now: Instant) -> Option<PendingTimer<T>> {
        match &self.pending {
            Some(timer) if timer.deadline <= now => self.pending.take(),
            _ => None,
        }
    }
}

impl<T> Default for TimerSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of handing a value to a timed stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission<T> {
    /// Fire synchronously with this value
    Fire(T),
    /// Held for a later fire; carries the value it displaced, if any
    Held {
        /// Previously held value that will now never fire
        displaced: Option<T>,
    },
}

impl<T> Admission<T> {
    /// The value to fire now, if any
    pub fn into_fired(self) -> Option<T> {
        match self {
            Self::Fire(value) => Some(value),
            Self::Held { .. } => None,
        }
    }
}

/// Earliest of two optional deadlines
pub(crate) fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

//! Throttle primitive
//!
//! Fires at most once per window: immediately on the leading call, then once
//! more at the window boundary with the latest value if calls arrived during
//! the cooldown.

use crate::timer::{Admission, TimerSlot};
use std::time::{Duration, Instant};

/// Throttled stage with a single trailing slot
#[derive(Debug, Clone)]
pub struct Throttler<T> {
    /// Window length
    delay: Duration,
    /// Time of the last fire (leading or trailing)
    last_fire: Option<Instant>,
    /// Trailing fire scheduled at the end of the current window
    trailing: TimerSlot<T>,
}

impl<T> Throttler<T> {
    /// Create a throttler with the given window
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_fire: None,
            trailing: TimerSlot::new(),
        }
    }

    /// Window length
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Change the window length, keeping the current window open
    ///
    /// A scheduled trailing fire moves to the boundary of the retuned window
    /// and keeps its value.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
        if let (Some(last), Some(value)) = (self.last_fire, self.trailing.cancel()) {
            self.trailing.arm(last + delay, value);
        }
    }

    /// Register a call at `now`
    pub fn call(&mut self, now: Instant, value: T) -> Admission<T> {
        if self.delay.is_zero() {
            self.last_fire = Some(now);
            return Admission::Fire(value);
        }

        match self.last_fire {
            Some(last) if now.saturating_duration_since(last) < self.delay => {
                // Remaining part of the window: delay - (now - last)
                let deadline = last + self.delay;
                let displaced = self.trailing.arm(deadline, value);
                Admission::Held { displaced }
            }
            _ => {
                self.last_fire = Some(now);
                self.trailing.cancel();
                Admission::Fire(value)
            }
        }
    }

    /// Fire the trailing call if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let timer = self.trailing.take_due(now)?;
        self.last_fire = Some(timer.deadline);
        Some(timer.value)
    }

    /// Deadline of the trailing fire
    pub fn next_deadline(&self) -> Option<Instant> {
        self.trailing.deadline()
    }

    /// Whether `now` falls inside the window opened by the last fire
    pub fn is_cooling(&self, now: Instant) -> bool {
        self.last_fire
            .map(|last| now.saturating_duration_since(last) < self.delay)
            .unwrap_or(false)
    }

    /// Whether a trailing fire is scheduled
    pub fn has_trailing(&self) -> bool {
        self.trailing.is_armed()
    }

    /// Cancel the trailing fire, returning its value
    pub fn cancel(&mut self) -> Option<T> {
        self.trailing.cancel()
    }
}

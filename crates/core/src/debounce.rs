//! Debounce primitive
//!
//! Fires once after a quiet period following the last call, with the value of
//! that last call. An optional max-wait bound guarantees a fire at least once
//! per `max_wait` while calls keep arriving.

use crate::timer::{earliest, Admission, TimerSlot};
use std::time::{Duration, Instant};

/// Debounced stage holding the latest value of the current burst
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    /// Quiet period required before firing
    delay: Duration,
    /// Upper bound on how long a burst may postpone a fire
    max_wait: Option<Duration>,
    /// Rescheduled on every call
    delay_timer: TimerSlot<()>,
    /// Armed on the first call of a burst
    max_wait_timer: TimerSlot<()>,
    /// Value of the most recent call
    latest: Option<T>,
    /// First call of the current burst
    burst_start: Option<Instant>,
}

impl<T> Debouncer<T> {
    /// Create a debouncer
    pub fn new(delay: Duration, max_wait: Option<Duration>) -> Self {
        Self {
            delay,
            max_wait,
            delay_timer: TimerSlot::new(),
            max_wait_timer: TimerSlot::new(),
            latest: None,
            burst_start: None,
        }
    }

    /// Quiet period
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Max-wait bound
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait
    }

    /// Change the delay and max-wait bound without ending the current burst
    ///
    /// Armed timers are re-anchored on the last call and on the start of the
    /// burst. A deadline that moves into the past fires on the next poll.
    pub fn retune(&mut self, delay: Duration, max_wait: Option<Duration>) {
        let last_call = self.delay_timer.deadline().map(|deadline| deadline - self.delay);

        self.delay = delay;
        self.max_wait = max_wait;
        if !self.is_pending() {
            return;
        }

        if let Some(last_call) = last_call {
            self.delay_timer.arm(last_call + delay, ());
        }
        match (max_wait, self.burst_start) {
            (Some(max_wait), Some(start)) => {
                self.max_wait_timer.arm(start + max_wait, ());
            }
            _ => {
                self.max_wait_timer.cancel();
            }
        }
    }

    /// Register a call at `now`
    ///
    /// A zero delay fires synchronously. A zero max-wait fires synchronously
    /// on the call that would have armed the max-wait timer, without arming
    /// the delay timer for that call.
    pub fn call(&mut self, now: Instant, value: T) -> Admission<T> {
        if self.delay.is_zero() {
            return Admission::Fire(value);
        }

        let displaced = self.latest.replace(value);
        self.burst_start.get_or_insert(now);

        if let Some(max_wait) = self.max_wait {
            if !self.max_wait_timer.is_armed() {
                if max_wait.is_zero() {
                    self.delay_timer.cancel();
                    self.burst_start = None;
                    return match self.latest.take() {
                        Some(value) => Admission::Fire(value),
                        None => Admission::Held { displaced },
                    };
                }
                self.max_wait_timer.arm(now + max_wait, ());
            }
        }

        self.delay_timer.arm(now + self.delay, ());
        Admission::Held { displaced }
    }

    /// Fire if either timer has expired at `now`
    ///
    /// Whichever timer fires clears both.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.next_deadline() {
            Some(deadline) if deadline <= now => self.cancel(),
            _ => None,
        }
    }

    /// Earliest armed deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        earliest(self.delay_timer.deadline(), self.max_wait_timer.deadline())
    }

    /// Whether a fire is scheduled
    pub fn is_pending(&self) -> bool {
        self.delay_timer.is_armed() || self.max_wait_timer.is_armed()
    }

    /// Cancel both timers, returning the value that would have fired
    pub fn cancel(&mut self) -> Option<T> {
        self.delay_timer.cancel();
        self.max_wait_timer.cancel();
        self.burst_start = None;
        self.latest.take()
    }
}

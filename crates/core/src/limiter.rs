//! Rate limiter stage
//!
//! Takes logical activations and applies pass-through, debounce or throttle
//! before they reach the single-activation handler.

use crate::debounce::Debouncer;
use crate::throttle::Throttler;
use crate::timer::Admission;
use std::fmt;
use std::time::{Duration, Instant};

/// Rate limiting policy derived from a resolved configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatePolicy {
    /// Forward every activation synchronously
    Immediate,
    /// Fire after a quiet period, optionally bounded by `max_wait`
    Debounce {
        /// Quiet period
        delay: Duration,
        /// Max time a burst may postpone a fire
        max_wait: Option<Duration>,
    },
    /// Fire at most once per `delay`
    Throttle {
        /// Window length
        delay: Duration,
    },
}

impl fmt::Display for RatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => write!(f, "immediate"),
            Self::Debounce { delay, max_wait: None } => {
                write!(f, "debounce({}ms)", delay.as_millis())
            }
            Self::Debounce { delay, max_wait: Some(max_wait) } => write!(
                f,
                "debounce({}ms, max_wait {}ms)",
                delay.as_millis(),
                max_wait.as_millis()
            ),
            Self::Throttle { delay } => write!(f, "throttle({}ms)", delay.as_millis()),
        }
    }
}

/// Observable state of the rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterState {
    /// Nothing pending
    Idle,
    /// Debounce timer(s) armed
    DebouncePending,
    /// Inside a throttle window
    Cooldown {
        /// A trailing fire is scheduled
        trailing: bool,
    },
}

#[derive(Debug, Clone)]
enum Stage<T> {
    Immediate,
    Debounce(Debouncer<T>),
    Throttle(Throttler<T>),
}

impl<T> Stage<T> {
    fn build(policy: RatePolicy) -> Self {
        match policy {
            RatePolicy::Immediate => Self::Immediate,
            RatePolicy::Debounce { delay, max_wait } => {
                Self::Debounce(Debouncer::new(delay, max_wait))
            }
            RatePolicy::Throttle { delay } => Self::Throttle(Throttler::new(delay)),
        }
    }
}

/// Rate limiter built for one policy at a time
#[derive(Debug, Clone)]
pub struct RateLimiter<T> {
    policy: RatePolicy,
    stage: Stage<T>,
}

impl<T> RateLimiter<T> {
    /// Create a limiter for `policy`
    pub fn new(policy: RatePolicy) -> Self {
        Self {
            policy,
            stage: Stage::build(policy),
        }
    }

    /// Current policy
    pub fn policy(&self) -> RatePolicy {
        self.policy
    }

    /// Switch to a new policy
    ///
    /// A no-op when the policy is unchanged. Within the same model the stage
    /// is retuned in place, so a throttle window or debounce burst already
    /// under way carries on under the new timings and nothing is discarded.
    /// Switching model drops the old stage and returns the value it was
    /// holding (if any); that value never fires.
    pub fn reconfigure(&mut self, policy: RatePolicy) -> Option<T> {
        if policy == self.policy {
            return None;
        }

        let retuned = match (&mut self.stage, policy) {
            (Stage::Debounce(debouncer), RatePolicy::Debounce { delay, max_wait }) => {
                debouncer.retune(delay, max_wait);
                true
            }
            (Stage::Throttle(throttler), RatePolicy::Throttle { delay }) => {
                throttler.set_delay(delay);
                true
            }
            _ => false,
        };
        self.policy = policy;
        if retuned {
            return None;
        }

        let discarded = self.cancel();
        self.stage = Stage::build(policy);
        discarded
    }

    /// Hand an activation to the limiter
    pub fn submit(&mut self, now: Instant, value: T) -> Admission<T> {
        match &mut self.stage {
            Stage::Immediate => Admission::Fire(value),
            Stage::Debounce(debouncer) => debouncer.call(now, value),
            Stage::Throttle(throttler) => throttler.call(now, value),
        }
    }

    /// Fire whatever timer has expired at `now`
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &mut self.stage {
            Stage::Immediate => None,
            Stage::Debounce(debouncer) => debouncer.poll(now),
            Stage::Throttle(throttler) => throttler.poll(now),
        }
    }

    /// Earliest armed deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.stage {
            Stage::Immediate => None,
            Stage::Debounce(debouncer) => debouncer.next_deadline(),
            Stage::Throttle(throttler) => throttler.next_deadline(),
        }
    }

    /// Cancel every armed timer, returning the value that would have fired
    pub fn cancel(&mut self) -> Option<T> {
        match &mut self.stage {
            Stage::Immediate => None,
            Stage::Debounce(debouncer) => debouncer.cancel(),
            Stage::Throttle(throttler) => throttler.cancel(),
        }
    }

    /// State as seen at `now`
    pub fn state(&self, now: Instant) -> LimiterState {
        match &self.stage {
            Stage::Immediate => LimiterState::Idle,
            Stage::Debounce(debouncer) if debouncer.is_pending() => LimiterState::DebouncePending,
            Stage::Debounce(_) => LimiterState::Idle,
            Stage::Throttle(throttler) => {
                let trailing = throttler.has_trailing();
                if trailing || throttler.is_cooling(now) {
                    LimiterState::Cooldown { trailing }
                } else {
                    LimiterState::Idle
                }
            }
        }
    }
}

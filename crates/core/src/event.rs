//! Raw activation events delivered by the host

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of raw activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationKind {
    /// Click-equivalent
    Single,
    /// Double-click-equivalent, delivered as its own event
    Double,
}

impl fmt::Display for ActivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::Double => f.write_str("double"),
        }
    }
}

/// A raw activation with its opaque payload
///
/// The arrival time is not stored here: it is the `now` passed alongside the
/// event when it is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent<P> {
    /// Single or double
    pub kind: ActivationKind,
    /// Originating pointer event, handed back to the consumer untouched
    pub payload: P,
}

impl<P> RawEvent<P> {
    /// Raw single activation
    pub fn single(payload: P) -> Self {
        Self {
            kind: ActivationKind::Single,
            payload,
        }
    }

    /// Raw double activation
    pub fn double(payload: P) -> Self {
        Self {
            kind: ActivationKind::Double,
            payload,
        }
    }
}

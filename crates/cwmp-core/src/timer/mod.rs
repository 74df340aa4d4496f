//! Timer scheduling for session triggers
//!
//! The session core owns three timers, each identified by a [`TimerId`]:
//!
//! ```text
//! ┌──────────────────┐  arm(Periodic, interval)    ┌─────────────┐
//! │ PeriodicScheduler│────────────────────────────▶│             │
//! └──────────────────┘                             │             │  TimerFire
//! ┌──────────────────┐  arm(Retry, backoff)        │ Dispatcher  │──────────────▶ orchestrator
//! │  RetryScheduler  │────────────────────────────▶│             │
//! └──────────────────┘                             │             │
//! ┌──────────────────┐  arm(ConnectionRequest,500) │             │
//! │ ConnRequestTrig. │────────────────────────────▶│             │
//! └──────────────────┘                             └─────────────┘
//! ```
//!
//! Arming a timer replaces whatever was pending on the same id. There is no
//! cancel operation. Dispatchers tag every arm with a generation so a fire
//! that was already in flight when the timer got rearmed can be recognized
//! as stale and dropped.

mod dispatcher;

pub use dispatcher::{RecordingDispatcher, TokioDispatcher};

use std::fmt;
use std::time::Duration;

/// The timers owned by the session core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Periodic inform interval
    Periodic,
    /// Backoff after a failed session
    Retry,
    /// Deferred inform after an inbound connection request
    ConnectionRequest,
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerId::Periodic => write!(f, "periodic"),
            TimerId::Retry => write!(f, "retry"),
            TimerId::ConnectionRequest => write!(f, "connection-request"),
        }
    }
}

/// A timer expiry delivered back to the session core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFire {
    pub timer: TimerId,
    pub generation: u64,
}

/// Schedules timer expiries with replace-on-rearm semantics
pub trait Dispatcher: Send {
    /// Arm `timer` to fire after `delay`, discarding any pending fire
    fn arm(&mut self, timer: TimerId, delay: Duration);

    /// Whether `fire` belongs to the latest arm of its timer
    fn is_current(&self, fire: &TimerFire) -> bool {
        let _ = fire;
        true
    }
}

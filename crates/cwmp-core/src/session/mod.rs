//! CWMP session orchestration
//!
//! A session is one Inform followed by the RPC exchange the ACS drives:
//!
//! ```text
//!            inform()
//!   Idle ─────────────▶ Requesting ──InformResponse ok──▶ Exchanging
//!    ▲                      │                                 │
//!    │                      │ any failure                     │ empty reply / Terminate
//!    │                      ▼                                 ▼
//!    └──────────── Failed (retry armed) ◀── failure ──── Done (queue cleared)
//! ```
//!
//! Only one session runs at a time. [`SessionOrchestrator::inform`] refuses
//! to start while the phase is not `Idle`.

mod orchestrator;

pub use orchestrator::{Collaborators, SessionOrchestrator};

use std::fmt;

use serde::Serialize;

use crate::event::EventCode;
use crate::periodic::PeriodicConfig;

/// Where the orchestrator is in the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SessionPhase {
    /// No session running
    #[default]
    Idle,
    /// Inform sent or being prepared
    Requesting,
    /// InformResponse accepted, handling ACS requests
    Exchanging,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "Idle"),
            SessionPhase::Requesting => write!(f, "Requesting"),
            SessionPhase::Exchanging => write!(f, "Exchanging"),
        }
    }
}

/// Read-only view of the session core's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Event the next Inform reports
    pub event: EventCode,
    /// Consecutive failed sessions
    pub retry_count: u8,
    /// A management-server write is waiting for a configuration reload
    pub config_reload_pending: bool,
    pub phase: SessionPhase,
    pub pending_notifications: usize,
    pub periodic: PeriodicConfig,
}

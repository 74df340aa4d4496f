//! Session trigger reasons
//!
//! Every Inform carries exactly one event code telling the ACS why the CPE
//! opened the session. The [`EventRegister`] holds the code for the next
//! Inform; each trigger overwrites it and nothing resets it implicitly.
//!
//! | code | label                |
//! |------|----------------------|
//! | 0    | `BOOTSTRAP`          |
//! | 1    | `BOOT`               |
//! | 2    | `PERIODIC`           |
//! | 3    | `SCHEDULED`          |
//! | 4    | `VALUE CHANGE`       |
//! | 6    | `CONNECTION REQUEST` |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reason a management session was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventCode {
    /// First contact with an ACS, also used for any unknown code
    #[default]
    Bootstrap,
    /// Device booted
    Boot,
    /// Periodic inform interval elapsed
    Periodic,
    /// Scheduled inform requested by the ACS
    Scheduled,
    /// A notified parameter changed value
    ValueChange,
    /// The ACS asked for a session through a connection request
    ConnectionRequest,
}

impl EventCode {
    /// Map a numeric wire code to an event, falling back to `Bootstrap`
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Boot,
            2 => Self::Periodic,
            3 => Self::Scheduled,
            4 => Self::ValueChange,
            6 => Self::ConnectionRequest,
            _ => Self::Bootstrap,
        }
    }

    /// Numeric code as sent on the wire
    pub fn code(&self) -> u8 {
        match self {
            Self::Bootstrap => 0,
            Self::Boot => 1,
            Self::Periodic => 2,
            Self::Scheduled => 3,
            Self::ValueChange => 4,
            Self::ConnectionRequest => 6,
        }
    }

    /// Protocol label without the numeric prefix
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bootstrap => "BOOTSTRAP",
            Self::Boot => "BOOT",
            Self::Periodic => "PERIODIC",
            Self::Scheduled => "SCHEDULED",
            Self::ValueChange => "VALUE CHANGE",
            Self::ConnectionRequest => "CONNECTION REQUEST",
        }
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.label())
    }
}

/// Holds the event code reported by the next Inform
#[derive(Debug, Clone, Copy, Default)]
pub struct EventRegister {
    current: EventCode,
}

impl EventRegister {
    pub fn new(initial: EventCode) -> Self {
        Self { current: initial }
    }

    /// Overwrite the current event
    pub fn set(&mut self, code: EventCode) {
        self.current = code;
    }

    /// Numeric code and label of the current event
    pub fn get(&self) -> (u8, &'static str) {
        (self.current.code(), self.current.label())
    }

    pub fn current(&self) -> EventCode {
        self.current
    }
}

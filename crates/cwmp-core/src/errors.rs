//! Error types for the CWMP session core
//!
//! Errors are grouped by the collaborator that produced them:
//!
//! - **Transport**: connect/send/receive failures reported by the ACS transport
//! - **Codec**: malformed or rejected CWMP envelopes
//! - **Store**: parameter store operation failures (carry the CWMP fault code)
//! - **Config**: configuration load or reload failures
//!
//! Inside an inform attempt every one of these collapses into a single failed
//! session that arms the retry timer. Direct calls (parameter writes,
//! notification handling, reloads) return them to the caller unchanged.

use thiserror::Error;

use crate::session::SessionPhase;

/// Result type for session core operations
pub type Result<T> = std::result::Result<T, CwmpError>;

/// Result type for parameter store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in the session core
#[derive(Debug, Error)]
pub enum CwmpError {
    /// Transport could not connect, send or receive
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Message could not be built, parsed or handled
    #[error("Codec error: {message}")]
    Codec { message: String },

    /// Parameter store rejected an operation
    #[error("Parameter store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An inform was requested while another session is running
    #[error("Session already in progress ({phase})")]
    SessionInProgress { phase: SessionPhase },

    /// The agent task is gone and can no longer take commands
    #[error("Agent stopped")]
    AgentStopped,
}

impl CwmpError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a codec error
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Whether this error came from a session attempt (and armed the retry
    /// timer) rather than from the guard or a stopped agent
    pub fn is_session_failure(&self) -> bool {
        !matches!(self, Self::SessionInProgress { .. } | Self::AgentStopped)
    }
}

/// Errors reported by a parameter store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store answered with a CWMP fault (e.g. 9005 invalid parameter name)
    #[error("fault {code}: {message}")]
    Fault { code: u32, message: String },

    /// The store backend could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Internal error fault (9002)
    pub const INTERNAL_ERROR: u32 = 9002;
    /// Invalid parameter name fault (9005)
    pub const INVALID_PARAMETER_NAME: u32 = 9005;

    /// Create a fault error
    pub fn fault(code: u32, message: impl Into<String>) -> Self {
        Self::Fault {
            code,
            message: message.into(),
        }
    }

    /// The CWMP fault code to report for this error
    pub fn fault_code(&self) -> u32 {
        match self {
            Self::Fault { code, .. } => *code,
            Self::Unavailable(_) => Self::INTERNAL_ERROR,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid ACS URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Reload failed: {0}")]
    Reload(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

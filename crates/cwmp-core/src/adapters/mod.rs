//! Collaborator interfaces
//!
//! The session core never touches the network, XML or the device's data
//! model directly. Everything it needs from the outside world goes through
//! the traits in this module:
//!
//! - [`ParameterStore`] - the device parameter tree and device actions
//! - [`AcsTransport`] - the HTTP(S) connection to the ACS
//! - [`MessageCodec`] - building and parsing CWMP SOAP envelopes
//! - [`ConfigLoader`] - reloading the process configuration
//!
//! The codec additionally receives an [`RpcHost`] while it handles ACS
//! requests, which is how methods such as `SetParameterValues` reach the
//! parameter change handler.

pub mod memory;

pub use memory::MemoryParameterStore;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::{Result, StoreResult};
use crate::event::EventCode;
use crate::notifications::NotificationEntry;

/// Device actions without arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceAction {
    Reboot,
    FactoryReset,
}

impl DeviceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceAction::Reboot => "reboot",
            DeviceAction::FactoryReset => "factory_reset",
        }
    }
}

impl fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device parameter store
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Current value of a parameter, `None` if it does not exist
    async fn get_value(&self, name: &str) -> StoreResult<Option<String>>;

    /// Notification level of a parameter, `None` if notifications are not
    /// configured for it
    async fn get_notification(&self, name: &str) -> StoreResult<Option<String>>;

    async fn set_value(&self, name: &str, value: &str) -> StoreResult<()>;

    async fn set_notification(&self, name: &str, level: &str) -> StoreResult<()>;

    /// Start a firmware/file download
    async fn download(&self, url: &str, size: &str) -> StoreResult<()>;

    async fn simple_action(&self, action: DeviceAction) -> StoreResult<()>;

    /// Commit the writes staged by previous `set_*` calls
    async fn execute_action(&self) -> StoreResult<()>;
}

/// Connection to the ACS
#[async_trait]
pub trait AcsTransport: Send {
    /// Prepare a session (resolve, connect, set credentials)
    async fn init(&mut self) -> Result<()>;

    /// POST one envelope and return the ACS's reply
    ///
    /// `None` as request sends an empty POST. A `None` or empty reply means
    /// the ACS has nothing more to say.
    async fn send(&mut self, request: Option<Bytes>) -> Result<Option<Bytes>>;

    /// Release the session. Must be safe to call when `init` failed or was
    /// never called.
    async fn exit(&mut self);
}

/// What the codec wants to do after handling an ACS request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcReply {
    /// Send this envelope back and keep exchanging
    Respond(Bytes),
    /// The exchange is over
    Terminate,
}

/// CWMP envelope encoder/decoder
#[async_trait]
pub trait MessageCodec: Send {
    /// Build an Inform for `event` carrying `notifications`
    ///
    /// `retry_count` is the number of consecutive failed sessions before this
    /// one, reported in the Inform's `RetryCount` field.
    async fn build_inform(
        &mut self,
        event: EventCode,
        retry_count: u8,
        notifications: &[NotificationEntry],
    ) -> Result<Bytes>;

    /// Validate the ACS's InformResponse
    ///
    /// Returns the first envelope to send in the RPC exchange, usually `None`
    /// (an empty POST inviting the ACS to issue requests).
    async fn parse_inform_response(&mut self, response: &[u8]) -> Result<Option<Bytes>>;

    /// Execute one ACS request through `host` and encode the reply
    async fn handle_message(&mut self, request: &[u8], host: &mut dyn RpcHost) -> Result<RpcReply>;

    /// Drop any per-session state. Must be idempotent.
    fn exit(&mut self);
}

/// Process configuration reloader
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    async fn reload(&self) -> std::result::Result<(), crate::errors::ConfigError>;
}

/// Operations the codec may perform while handling ACS requests
#[async_trait]
pub trait RpcHost: Send {
    async fn get_parameter_value(&mut self, name: &str) -> StoreResult<Option<String>>;

    async fn get_parameter_notification(&mut self, name: &str) -> StoreResult<Option<String>>;

    /// Write a parameter, applying management-server side effects
    async fn set_parameter_value(&mut self, name: &str, value: &str) -> StoreResult<()>;

    async fn set_parameter_notification(&mut self, name: &str, level: &str) -> StoreResult<()>;

    async fn download(&mut self, url: &str, size: &str) -> StoreResult<()>;

    async fn reboot(&mut self) -> StoreResult<()>;

    async fn factory_reset(&mut self) -> StoreResult<()>;

    async fn execute_action(&mut self) -> StoreResult<()>;

    /// Reload configuration if a write since the last reload requires it
    async fn reload_changes(&mut self) -> Result<()>;

    /// Event reported by the current session
    fn event(&self) -> EventCode;
}

//! CWMP (TR-069) session orchestration core
//!
//! This crate decides *when* a CPE talks to its Auto-Configuration Server and
//! drives each conversation from the Inform to the end of the RPC exchange.
//! Wire formats, HTTP and the device data model stay behind the collaborator
//! traits in [`adapters`].
//!
//! Sessions are started by four kinds of triggers:
//!
//! - the periodic inform timer ([`periodic`])
//! - active value-change notifications ([`notifications`])
//! - connection requests from the ACS ([`connection_request`])
//! - the backoff timer after a failed session ([`retry`])
//!
//! [`session::SessionOrchestrator`] owns all of this state. [`agent::CwmpAgent`]
//! puts it on a tokio task and hands out an [`agent::AgentHandle`].
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use cwmp_core::prelude::*;
//! # async fn example(
//! #     transport: Box<dyn AcsTransport>,
//! #     codec: Box<dyn MessageCodec>,
//! # ) -> Result<()> {
//! let config = FileConfigLoader::open("/etc/cwmp.toml")?;
//! setup_logging(config.current().logging.to_logging_config()?)?;
//!
//! let initial_event = config.current().local.initial_event();
//! let (agent, handle) = CwmpAgent::start(
//!     initial_event,
//!     AgentParts {
//!         store: Arc::new(MemoryParameterStore::new()),
//!         transport,
//!         codec,
//!         loader: Arc::new(config),
//!     },
//! )
//! .await;
//! agent.spawn();
//!
//! handle.inform().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod agent;
pub mod config;
pub mod connection_request;
pub mod errors;
pub mod event;
pub mod logging;
pub mod notifications;
pub mod parameters;
pub mod periodic;
pub mod retry;
pub mod session;
pub mod timer;

pub use adapters::{
    AcsTransport, ConfigLoader, DeviceAction, MemoryParameterStore, MessageCodec,
    ParameterStore, RpcHost, RpcReply,
};
pub use agent::{AgentHandle, AgentParts, CwmpAgent};
pub use config::{AcsConfig, AgentConfig, FileConfigLoader};
pub use errors::{ConfigError, CwmpError, Result, StoreError, StoreResult};
pub use event::{EventCode, EventRegister};
pub use notifications::{NotificationDisposition, NotificationEntry};
pub use session::{Collaborators, SessionOrchestrator, SessionPhase, SessionState};
pub use timer::{Dispatcher, TimerFire, TimerId};

/// Re-export of common types for easier use
pub mod prelude {
    pub use crate::{
        AcsConfig, AcsTransport, AgentConfig, AgentHandle, AgentParts, Collaborators,
        ConfigError, ConfigLoader, CwmpAgent, CwmpError, DeviceAction, Dispatcher, EventCode,
        FileConfigLoader, MemoryParameterStore, MessageCodec, NotificationDisposition,
        NotificationEntry, ParameterStore, Result, RpcHost, RpcReply, SessionOrchestrator,
        SessionPhase, SessionState, StoreError, StoreResult, TimerId,
        logging::{setup_logging, LoggingConfig},
    };
}

//! Deferred inform after an inbound connection request
//!
//! The transport acknowledges the ACS's connection request on its own path;
//! the session itself starts half a second later from the timer, so the
//! acknowledgement is never held up by a slow Inform.

use std::time::Duration;

use tracing::info;

use crate::event::{EventCode, EventRegister};
use crate::timer::{Dispatcher, TimerId};

/// Delay between accepting a connection request and starting the session
pub const CONNECTION_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// One-shot trigger for connection requests
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionRequestTrigger;

impl ConnectionRequestTrigger {
    pub fn on_connection_request(
        &self,
        code: EventCode,
        event: &mut EventRegister,
        dispatcher: &mut dyn Dispatcher,
    ) {
        info!("connection request received ({})", code);
        event.set(code);
        dispatcher.arm(TimerId::ConnectionRequest, CONNECTION_REQUEST_DELAY);
    }
}

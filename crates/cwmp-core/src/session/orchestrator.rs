//! Inform + RPC exchange state machine

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::{SessionPhase, SessionState};
use crate::adapters::{AcsTransport, ConfigLoader, MessageCodec, ParameterStore, RpcReply};
use crate::connection_request::ConnectionRequestTrigger;
use crate::errors::{CwmpError, Result, StoreResult};
use crate::event::{EventCode, EventRegister};
use crate::notifications::{is_active_level, NotificationDisposition, NotificationQueue};
use crate::parameters::{ConfigReloadGate, ParameterChangeHandler};
use crate::periodic::PeriodicScheduler;
use crate::retry::RetryScheduler;
use crate::timer::{Dispatcher, TimerFire, TimerId};

/// External services the orchestrator drives
pub struct Collaborators {
    pub store: Arc<dyn ParameterStore>,
    pub transport: Box<dyn AcsTransport>,
    pub codec: Box<dyn MessageCodec>,
    pub loader: Arc<dyn ConfigLoader>,
    pub dispatcher: Box<dyn Dispatcher>,
}

/// Owns all session state and runs sessions against the ACS
///
/// Every trigger (timer fire, notification, connection request, parameter
/// write) is a method taking `&mut self`, so whoever owns the orchestrator
/// serializes them. [`CwmpAgent`](crate::agent::CwmpAgent) is the usual owner.
pub struct SessionOrchestrator {
    event: EventRegister,
    notifications: NotificationQueue,
    retry: RetryScheduler,
    periodic: PeriodicScheduler,
    connection_request: ConnectionRequestTrigger,
    reload: ConfigReloadGate,
    phase: SessionPhase,
    transport_release_pending: bool,

    store: Arc<dyn ParameterStore>,
    loader: Arc<dyn ConfigLoader>,
    transport: Box<dyn AcsTransport>,
    codec: Box<dyn MessageCodec>,
    dispatcher: Box<dyn Dispatcher>,
}

impl SessionOrchestrator {
    /// Initialize session state
    ///
    /// Starts with `initial_event`, no failed sessions and no pending
    /// reload, and loads the periodic inform settings from the store.
    pub async fn start(initial_event: EventCode, collaborators: Collaborators) -> Self {
        let Collaborators {
            store,
            transport,
            codec,
            loader,
            mut dispatcher,
        } = collaborators;

        let periodic = PeriodicScheduler::from_store(&*store, &mut *dispatcher).await;
        info!("session core started with event {}", initial_event);

        Self {
            event: EventRegister::new(initial_event),
            notifications: NotificationQueue::new(),
            retry: RetryScheduler::new(),
            periodic,
            connection_request: ConnectionRequestTrigger,
            reload: ConfigReloadGate::new(),
            phase: SessionPhase::Idle,
            transport_release_pending: false,
            store,
            loader,
            transport,
            codec,
            dispatcher,
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            event: self.event.current(),
            retry_count: self.retry.retry_count(),
            config_reload_pending: self.reload.is_pending(),
            phase: self.phase,
            pending_notifications: self.notifications.len(),
            periodic: self.periodic.config(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn event(&self) -> &EventRegister {
        &self.event
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    /// Run one session: Inform, then the RPC exchange
    ///
    /// On failure the transport and codec are released and the retry timer
    /// is armed; the error is returned for logging only. Pending
    /// notifications are cleared only when the whole exchange succeeds.
    ///
    /// Dropping the returned future mid-session counts as a failed session:
    /// the phase returns to `Idle`, the codec is released, the retry timer is
    /// armed and the transport is released at the start of the next session.
    pub async fn inform(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Idle {
            warn!("inform requested while session is {}, dropping", self.phase);
            return Err(CwmpError::SessionInProgress { phase: self.phase });
        }

        if self.transport_release_pending {
            debug!("releasing transport left over from an abandoned session");
            self.transport.exit().await;
            self.transport_release_pending = false;
        }

        self.phase = SessionPhase::Requesting;
        info!("starting session ({})", self.event.current());

        let mut attempt = SessionAttempt { core: self, settled: false };
        let result = attempt.core.run_session().await;
        attempt.settle(result).await
    }

    async fn run_session(&mut self) -> Result<()> {
        self.transport.init().await?;

        let notifications = self.notifications.snapshot();
        let request = self
            .codec
            .build_inform(self.event.current(), self.retry.retry_count(), &notifications)
            .await?;
        debug!(
            "sending Inform ({} bytes, {} notifications)",
            request.len(),
            notifications.len()
        );

        let response = self.transport.send(Some(request)).await?;

        let mut outbound = None;
        if let Some(response) = response.filter(|r| !r.is_empty()) {
            outbound = self.codec.parse_inform_response(&response).await?;
        }

        // Reset before the exchange: a failure below restarts the backoff
        // curve from its first step.
        self.retry.reset();
        self.phase = SessionPhase::Exchanging;

        self.exchange_rpcs(outbound).await?;

        self.notifications.clear();
        Ok(())
    }

    /// Relay ACS requests through the codec until the ACS ends the session
    async fn exchange_rpcs(&mut self, initial: Option<Bytes>) -> Result<()> {
        let mut outbound = initial;

        loop {
            let inbound = match self.transport.send(outbound.take()).await? {
                Some(inbound) if !inbound.is_empty() => inbound,
                _ => {
                    debug!("ACS ended the session");
                    return Ok(());
                }
            };

            let mut host = ParameterChangeHandler {
                store: &*self.store,
                loader: &*self.loader,
                event: &mut self.event,
                reload: &mut self.reload,
                periodic: &mut self.periodic,
                dispatcher: &mut *self.dispatcher,
            };

            match self.codec.handle_message(&inbound, &mut host).await? {
                RpcReply::Respond(reply) if reply.is_empty() => {
                    return Err(CwmpError::codec("empty reply to ACS request"));
                }
                RpcReply::Respond(reply) => outbound = Some(reply),
                RpcReply::Terminate => {
                    debug!("codec terminated the exchange");
                    return Ok(());
                }
            }
        }
    }

    async fn release(&mut self) {
        self.transport.exit().await;
        self.codec.exit();
    }

    /// Synchronous part of the failure path for a session whose future was
    /// dropped; the transport release waits for the next session
    fn abandon(&mut self) {
        warn!("session abandoned while {}", self.phase);
        self.phase = SessionPhase::Idle;
        self.codec.exit();
        self.transport_release_pending = true;
        self.retry.on_failure(&mut *self.dispatcher);
    }

    /// Offer a value change for notification
    ///
    /// Parameters without a notification level are ignored. Otherwise the
    /// change is queued, the next event becomes `4 VALUE CHANGE`, and an
    /// active level starts a session right away.
    pub async fn add_notification(
        &mut self,
        parameter: &str,
        value: &str,
    ) -> Result<NotificationDisposition> {
        let level = match self.store.get_notification(parameter).await? {
            Some(level) => level,
            None => {
                debug!("no notification level for {}, ignoring change", parameter);
                return Ok(NotificationDisposition::Ignored);
            }
        };

        self.notifications.add_or_update(parameter, value);
        self.event.set(EventCode::ValueChange);

        if !is_active_level(&level) {
            debug!("queued passive notification for {}", parameter);
            return Ok(NotificationDisposition::Queued);
        }

        info!("active notification for {}, informing now", parameter);
        if let Err(e) = self.inform().await {
            log_trigger_failure("active notification", &e);
        }
        Ok(NotificationDisposition::Informed)
    }

    /// Schedule a session for an inbound connection request
    pub fn connection_request(&mut self, code: EventCode) {
        self.connection_request
            .on_connection_request(code, &mut self.event, &mut *self.dispatcher);
    }

    /// Handle a fire delivered by the dispatcher, ignoring replaced arms
    pub async fn on_timer_fire(&mut self, fire: TimerFire) {
        if !self.dispatcher.is_current(&fire) {
            debug!("ignoring stale {} timer fire", fire.timer);
            return;
        }
        self.on_timer(fire.timer).await;
    }

    /// React to a timer expiry
    pub async fn on_timer(&mut self, timer: TimerId) {
        let should_inform = match timer {
            TimerId::Periodic => self.periodic.on_fire(&mut self.event, &mut *self.dispatcher),
            TimerId::Retry | TimerId::ConnectionRequest => true,
        };

        if should_inform {
            if let Err(e) = self.inform().await {
                log_trigger_failure(&timer.to_string(), &e);
            }
        }
    }

    /// Parameter operations with management-server side effects applied
    pub fn parameters(&mut self) -> ParameterChangeHandler<'_> {
        ParameterChangeHandler {
            store: &*self.store,
            loader: &*self.loader,
            event: &mut self.event,
            reload: &mut self.reload,
            periodic: &mut self.periodic,
            dispatcher: &mut *self.dispatcher,
        }
    }

    /// Write a parameter, see [`ParameterChangeHandler::on_write`]
    pub async fn set_parameter_value(&mut self, name: &str, value: &str) -> StoreResult<()> {
        self.parameters().on_write(name, value).await
    }

    /// Reload configuration if a write asked for it
    pub async fn reload_changes(&mut self) -> Result<bool> {
        self.reload.reload_if_pending(&*self.loader).await
    }

    /// Release the transport and codec for good
    pub async fn shutdown(&mut self) {
        info!("session core shutting down");
        self.release().await;
        self.transport_release_pending = false;
    }
}

/// Triggers have no caller to report to; failed sessions were already logged
/// and retried, anything else means the trigger was dropped
fn log_trigger_failure(trigger: &str, error: &CwmpError) {
    if error.is_session_failure() {
        debug!("{} triggered session failed: {}", trigger, error);
    } else {
        warn!("{} trigger dropped: {}", trigger, error);
    }
}

/// One in-flight session; runs the failure path if dropped before settling
struct SessionAttempt<'a> {
    core: &'a mut SessionOrchestrator,
    settled: bool,
}

impl SessionAttempt<'_> {
    async fn settle(mut self, result: Result<()>) -> Result<()> {
        self.core.release().await;
        self.core.phase = SessionPhase::Idle;
        self.settled = true;

        match result {
            Ok(()) => {
                info!("session completed");
                Ok(())
            }
            Err(e) => {
                warn!("session failed: {}", e);
                self.core.retry.on_failure(&mut *self.core.dispatcher);
                Err(e)
            }
        }
    }
}

impl Drop for SessionAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.core.abandon();
        }
    }
}

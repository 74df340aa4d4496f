//! Agent actor
//!
//! [`CwmpAgent`] owns a [`SessionOrchestrator`] on a single tokio task and
//! feeds it two kinds of input:
//!
//! - commands sent through an [`AgentHandle`] (notifications, connection
//!   requests, parameter writes, explicit informs)
//! - timer fires from the [`TokioDispatcher`]
//!
//! Because the task handles one input at a time, a trigger that arrives
//! while a session runs waits in the channel until the session is over.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adapters::{AcsTransport, ConfigLoader, MessageCodec, ParameterStore};
use crate::errors::{CwmpError, Result};
use crate::event::EventCode;
use crate::notifications::NotificationDisposition;
use crate::session::{Collaborators, SessionOrchestrator, SessionState};
use crate::timer::{TimerFire, TokioDispatcher};

const COMMAND_QUEUE_DEPTH: usize = 64;

/// Commands the agent task accepts
#[derive(Debug)]
pub enum AgentCommand {
    /// The ACS asked for a session
    ConnectionRequest { code: EventCode },
    /// A parameter value changed on the device
    Notify {
        parameter: String,
        value: String,
        reply: oneshot::Sender<Result<NotificationDisposition>>,
    },
    /// Write a parameter through the change handler
    SetParameterValue {
        name: String,
        value: String,
        reply: oneshot::Sender<Result<()>>,
    },
    ReloadChanges {
        reply: oneshot::Sender<Result<bool>>,
    },
    /// Run a session now
    Inform { reply: oneshot::Sender<Result<()>> },
    State { reply: oneshot::Sender<SessionState> },
    /// Release the transport and codec, then stop
    Shutdown { reply: oneshot::Sender<()> },
}

/// Collaborators for [`CwmpAgent::start`]; the agent supplies the dispatcher
pub struct AgentParts {
    pub store: Arc<dyn ParameterStore>,
    pub transport: Box<dyn AcsTransport>,
    pub codec: Box<dyn MessageCodec>,
    pub loader: Arc<dyn ConfigLoader>,
}

/// Single-owner task driving the session core
pub struct CwmpAgent {
    orchestrator: SessionOrchestrator,
    commands: mpsc::Receiver<AgentCommand>,
    fires: mpsc::UnboundedReceiver<TimerFire>,
}

impl CwmpAgent {
    /// Wrap an orchestrator whose dispatcher reports on `fires`
    pub fn new(
        orchestrator: SessionOrchestrator,
        fires: mpsc::UnboundedReceiver<TimerFire>,
    ) -> (Self, AgentHandle) {
        let (commands_tx, commands) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let agent = Self {
            orchestrator,
            commands,
            fires,
        };
        (agent, AgentHandle { commands: commands_tx })
    }

    /// Build the orchestrator on a [`TokioDispatcher`] and wrap it
    ///
    /// Must be called inside a tokio runtime, the periodic timer may be
    /// armed right away.
    pub async fn start(initial_event: EventCode, parts: AgentParts) -> (Self, AgentHandle) {
        let (dispatcher, fires) = TokioDispatcher::new();
        let orchestrator = SessionOrchestrator::start(
            initial_event,
            Collaborators {
                store: parts.store,
                transport: parts.transport,
                codec: parts.codec,
                loader: parts.loader,
                dispatcher: Box::new(dispatcher),
            },
        )
        .await;
        Self::new(orchestrator, fires)
    }

    /// Run the agent loop on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands and timer fires until shutdown or until every
    /// handle is dropped
    pub async fn run(mut self) {
        info!("CWMP agent running");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if !self.dispatch(command).await {
                            break;
                        }
                    }
                    None => {
                        debug!("all agent handles dropped");
                        self.orchestrator.shutdown().await;
                        break;
                    }
                },
                Some(fire) = self.fires.recv() => {
                    self.orchestrator.on_timer_fire(fire).await;
                }
            }
        }

        info!("CWMP agent stopped");
    }

    /// Returns false once the agent should stop
    async fn dispatch(&mut self, command: AgentCommand) -> bool {
        match command {
            AgentCommand::ConnectionRequest { code } => {
                self.orchestrator.connection_request(code);
            }
            AgentCommand::Notify {
                parameter,
                value,
                reply,
            } => {
                let result = self.orchestrator.add_notification(&parameter, &value).await;
                let _ = reply.send(result);
            }
            AgentCommand::SetParameterValue { name, value, reply } => {
                let result = self
                    .orchestrator
                    .set_parameter_value(&name, &value)
                    .await
                    .map_err(CwmpError::from);
                let _ = reply.send(result);
            }
            AgentCommand::ReloadChanges { reply } => {
                let result = self.orchestrator.reload_changes().await;
                if let Err(e) = &result {
                    warn!("configuration reload failed: {}", e);
                }
                let _ = reply.send(result);
            }
            AgentCommand::Inform { reply } => {
                let _ = reply.send(self.orchestrator.inform().await);
            }
            AgentCommand::State { reply } => {
                let _ = reply.send(self.orchestrator.state());
            }
            AgentCommand::Shutdown { reply } => {
                self.orchestrator.shutdown().await;
                let _ = reply.send(());
                return false;
            }
        }
        true
    }
}

/// Cloneable sender side of a [`CwmpAgent`]
#[derive(Debug, Clone)]
pub struct AgentHandle {
    commands: mpsc::Sender<AgentCommand>,
}

impl AgentHandle {
    async fn send(&self, command: AgentCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CwmpError::AgentStopped)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> AgentCommand,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply)).await?;
        response.await.map_err(|_| CwmpError::AgentStopped)
    }

    /// Schedule a session for an inbound connection request
    pub async fn connection_request(&self, code: EventCode) -> Result<()> {
        self.send(AgentCommand::ConnectionRequest { code }).await
    }

    pub async fn notify(
        &self,
        parameter: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<NotificationDisposition> {
        let parameter = parameter.into();
        let value = value.into();
        self.request(|reply| AgentCommand::Notify {
            parameter,
            value,
            reply,
        })
        .await?
    }

    pub async fn set_parameter_value(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let name = name.into();
        let value = value.into();
        self.request(|reply| AgentCommand::SetParameterValue { name, value, reply })
            .await?
    }

    /// Returns whether a reload ran
    pub async fn reload_changes(&self) -> Result<bool> {
        self.request(|reply| AgentCommand::ReloadChanges { reply })
            .await?
    }

    pub async fn inform(&self) -> Result<()> {
        self.request(|reply| AgentCommand::Inform { reply }).await?
    }

    pub async fn state(&self) -> Result<SessionState> {
        self.request(|reply| AgentCommand::State { reply }).await
    }

    /// Stop the agent after releasing its collaborators
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| AgentCommand::Shutdown { reply }).await
    }
}

//! Scripted collaborators shared by the integration tests
//!
//! Every double is `Clone` and shares its state between clones, so a test
//! keeps one clone for assertions while the orchestrator owns another.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use cwmp_core::prelude::*;
use cwmp_core::timer::RecordingDispatcher;

/// Body the scripted codec rejects as an InformResponse
pub const BAD_INFORM_RESPONSE: &[u8] = b"<soap:Fault/>";

pub const INFORM_RESPONSE: &[u8] = b"<cwmp:InformResponse/>";

pub fn bytes(data: &'static [u8]) -> Bytes {
    Bytes::from_static(data)
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TransportState {
    fail_init: bool,
    /// `None` entries never complete
    replies: VecDeque<Option<Result<Option<Bytes>>>>,
    sent: Vec<Option<Bytes>>,
    inits: usize,
    exits: usize,
}

/// Transport answering from a queue of canned replies
///
/// Once the queue is empty every send answers `None`, which ends the session
/// successfully.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<TransportState>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_init(&self, fail: bool) {
        self.state.lock().fail_init = fail;
    }

    pub fn reply(&self, body: &'static [u8]) -> &Self {
        self.state.lock().replies.push_back(Some(Ok(Some(bytes(body)))));
        self
    }

    pub fn reply_empty(&self) -> &Self {
        self.state.lock().replies.push_back(Some(Ok(None)));
        self
    }

    /// The send taking this reply never completes
    pub fn hang(&self) -> &Self {
        self.state.lock().replies.push_back(None);
        self
    }

    pub fn fail_send(&self) -> &Self {
        self.state
            .lock()
            .replies
            .push_back(Some(Err(CwmpError::transport("connection reset"))));
        self
    }

    /// Every request body sent so far
    pub fn sent(&self) -> Vec<Option<Bytes>> {
        self.state.lock().sent.clone()
    }

    pub fn inits(&self) -> usize {
        self.state.lock().inits
    }

    pub fn exits(&self) -> usize {
        self.state.lock().exits
    }
}

#[async_trait]
impl AcsTransport for ScriptedTransport {
    async fn init(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.inits += 1;
        if state.fail_init {
            return Err(CwmpError::transport("connection refused"));
        }
        Ok(())
    }

    async fn send(&mut self, request: Option<Bytes>) -> Result<Option<Bytes>> {
        let reply = {
            let mut state = self.state.lock();
            state.sent.push(request);
            state.replies.pop_front().unwrap_or(Some(Ok(None)))
        };

        match reply {
            Some(reply) => reply,
            None => std::future::pending().await,
        }
    }

    async fn exit(&mut self) {
        self.state.lock().exits += 1;
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// What the codec does with the next ACS request
#[derive(Debug, Clone)]
pub enum CodecStep {
    Reply(RpcReply),
    Fail,
    /// Write each pair through the host, reload, then end the exchange
    Write(Vec<(&'static str, &'static str)>),
}

/// Inform recorded by [`ScriptedCodec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformRecord {
    pub event: EventCode,
    pub retry_count: u8,
    pub notifications: Vec<NotificationEntry>,
}

#[derive(Debug, Default)]
struct CodecState {
    steps: VecDeque<CodecStep>,
    informs: Vec<InformRecord>,
    handled: Vec<Bytes>,
    host_events: Vec<EventCode>,
    write_results: Vec<StoreResult<()>>,
    exits: usize,
}

/// Codec that records Informs and follows a script for ACS requests
///
/// Without a script step, an ACS request terminates the exchange.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCodec {
    state: Arc<Mutex<CodecState>>,
}

impl ScriptedCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self, step: CodecStep) -> &Self {
        self.state.lock().steps.push_back(step);
        self
    }

    pub fn informs(&self) -> Vec<InformRecord> {
        self.state.lock().informs.clone()
    }

    pub fn handled(&self) -> Vec<Bytes> {
        self.state.lock().handled.clone()
    }

    /// Event the host reported for each handled request
    pub fn host_events(&self) -> Vec<EventCode> {
        self.state.lock().host_events.clone()
    }

    pub fn write_results(&self) -> Vec<StoreResult<()>> {
        self.state.lock().write_results.clone()
    }

    pub fn exits(&self) -> usize {
        self.state.lock().exits
    }
}

#[async_trait]
impl MessageCodec for ScriptedCodec {
    async fn build_inform(
        &mut self,
        event: EventCode,
        retry_count: u8,
        notifications: &[NotificationEntry],
    ) -> Result<Bytes> {
        self.state.lock().informs.push(InformRecord {
            event,
            retry_count,
            notifications: notifications.to_vec(),
        });
        Ok(Bytes::from(format!("<cwmp:Inform event=\"{}\"/>", event)))
    }

    async fn parse_inform_response(&mut self, response: &[u8]) -> Result<Option<Bytes>> {
        if response == BAD_INFORM_RESPONSE {
            return Err(CwmpError::codec("expected InformResponse"));
        }
        Ok(None)
    }

    async fn handle_message(&mut self, request: &[u8], host: &mut dyn RpcHost) -> Result<RpcReply> {
        let step = {
            let mut state = self.state.lock();
            state.handled.push(Bytes::copy_from_slice(request));
            state.host_events.push(host.event());
            state.steps.pop_front()
        };

        match step {
            None => Ok(RpcReply::Terminate),
            Some(CodecStep::Reply(reply)) => Ok(reply),
            Some(CodecStep::Fail) => Err(CwmpError::codec("malformed request")),
            Some(CodecStep::Write(writes)) => {
                for (name, value) in writes {
                    let result = host.set_parameter_value(name, value).await;
                    self.state.lock().write_results.push(result);
                }
                host.reload_changes().await?;
                Ok(RpcReply::Terminate)
            }
        }
    }

    fn exit(&mut self) {
        self.state.lock().exits += 1;
    }
}

// ---------------------------------------------------------------------------
// Config loader
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CountingLoader {
    reloads: AtomicUsize,
    failing: AtomicBool,
}

impl CountingLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConfigLoader for CountingLoader {
    async fn reload(&self) -> std::result::Result<(), ConfigError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConfigError::Reload("configuration file unreadable".to_string()));
        }
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Orchestrator wired to scripted collaborators and a recording dispatcher
pub struct Harness {
    pub orchestrator: SessionOrchestrator,
    pub store: MemoryParameterStore,
    pub transport: ScriptedTransport,
    pub codec: ScriptedCodec,
    pub loader: Arc<CountingLoader>,
    pub timers: RecordingDispatcher,
}

impl Harness {
    pub async fn start(initial_event: EventCode, store: MemoryParameterStore) -> Self {
        let transport = ScriptedTransport::new();
        let codec = ScriptedCodec::new();
        let loader = CountingLoader::new();
        let timers = RecordingDispatcher::new();

        let orchestrator = SessionOrchestrator::start(
            initial_event,
            Collaborators {
                store: Arc::new(store.clone()),
                transport: Box::new(transport.clone()),
                codec: Box::new(codec.clone()),
                loader: loader.clone(),
                dispatcher: Box::new(timers.clone()),
            },
        )
        .await;

        Self {
            orchestrator,
            store,
            transport,
            codec,
            loader,
            timers,
        }
    }

    pub async fn with_store(store: MemoryParameterStore) -> Self {
        Self::start(EventCode::Boot, store).await
    }

    pub async fn new() -> Self {
        Self::with_store(MemoryParameterStore::new()).await
    }
}

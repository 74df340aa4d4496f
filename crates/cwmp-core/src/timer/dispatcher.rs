use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{Dispatcher, TimerFire, TimerId};

/// Dispatcher backed by tokio sleep tasks
///
/// Each arm spawns one task that sleeps and then reports a [`TimerFire`] on
/// the channel returned by [`TokioDispatcher::new`]. Rearming aborts the
/// previous task and bumps the generation, so a fire that raced the abort is
/// rejected by [`Dispatcher::is_current`].
pub struct TokioDispatcher {
    fires_tx: mpsc::UnboundedSender<TimerFire>,
    pending: HashMap<TimerId, (u64, JoinHandle<()>)>,
    next_generation: u64,
}

impl TokioDispatcher {
    /// Create a dispatcher and the receiver its fires are delivered on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFire>) {
        let (fires_tx, fires_rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            fires_tx,
            pending: HashMap::new(),
            next_generation: 0,
        };
        (dispatcher, fires_rx)
    }
}

impl Dispatcher for TokioDispatcher {
    fn arm(&mut self, timer: TimerId, delay: Duration) {
        self.next_generation += 1;
        let generation = self.next_generation;

        if let Some((_, previous)) = self.pending.remove(&timer) {
            previous.abort();
        }

        let fires_tx = self.fires_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!("timer {} generation {} expired", timer, generation);
            // Receiver gone means the agent shut down
            let _ = fires_tx.send(TimerFire { timer, generation });
        });

        debug!("armed {} timer for {:?}", timer, delay);
        self.pending.insert(timer, (generation, handle));
    }

    fn is_current(&self, fire: &TimerFire) -> bool {
        self.pending
            .get(&fire.timer)
            .map(|(generation, _)| *generation == fire.generation)
            .unwrap_or(false)
    }
}

impl Drop for TokioDispatcher {
    fn drop(&mut self) {
        for (_, (_, handle)) in self.pending.drain() {
            handle.abort();
        }
    }
}

/// Dispatcher that only records arms
///
/// Clones share the same log, so a test can keep one clone while the
/// orchestrator owns another. Fires are simulated by calling the
/// orchestrator's timer entry point directly.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    arms: Arc<Mutex<Vec<(TimerId, Duration)>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every arm so far, oldest first
    pub fn arms(&self) -> Vec<(TimerId, Duration)> {
        self.arms.lock().clone()
    }

    /// Delays armed for one timer, oldest first
    pub fn delays(&self, timer: TimerId) -> Vec<Duration> {
        self.arms
            .lock()
            .iter()
            .filter(|(id, _)| *id == timer)
            .map(|(_, delay)| *delay)
            .collect()
    }

    /// The delay currently governing `timer`, if it was ever armed
    pub fn last(&self, timer: TimerId) -> Option<Duration> {
        self.delays(timer).last().copied()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn arm(&mut self, timer: TimerId, delay: Duration) {
        self.arms.lock().push((timer, delay));
    }
}

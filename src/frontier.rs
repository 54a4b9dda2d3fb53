//! Frontier
//!
//! FIFO work queue of probes plus the pending counter used for quiescence detection.
//!
//! The pending counter is decoupled from the queue length: it counts every probe that has
//! been put and not yet acknowledged with [`Frontier::complete`], whether it is still
//! queued or held by a worker. A worker puts the children of a probe before acknowledging
//! the probe itself, so the counter cannot touch zero while descendants are outstanding.
//! Quiescence is declared exactly when the counter reaches zero.

use crate::candidate::Probe;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why the frontier stopped handing out work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Nothing queued and nothing in flight.
    Quiescent,
    /// Closed early; queued probes were never evaluated.
    Closed,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<Probe>,
    pending: usize,
    termination: Option<Termination>,
    high_water: usize,
}

/// Point-in-time view of the frontier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierStats {
    pub queued: usize,
    pub pending: usize,
    pub high_water: usize,
}

/// Concurrent frontier shared by all workers of one discovery.
pub struct Frontier {
    state: Mutex<FrontierState>,
    /// Wakes workers blocked in `get`
    notify: Notify,
    /// Fired once, on quiescence or close
    done: CancellationToken,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            notify: Notify::new(),
            done: CancellationToken::new(),
        }
    }

    /// Queue a probe. The pending count is raised before the probe becomes visible.
    ///
    /// Probes put after the frontier closed are kept so that they can be drained.
    pub fn put(&self, probe: Probe) {
        {
            let mut state = self.state.lock();
            state.pending += 1;
            state.queue.push_back(probe);
            state.high_water = state.high_water.max(state.queue.len());
        }
        self.notify.notify_one();
    }

    /// Next probe, waiting while the queue is empty and work is still in flight.
    ///
    /// Returns `None` once the frontier is quiescent or closed.
    pub async fn get(&self) -> Option<Probe> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before inspecting state so a concurrent put or close cannot be missed
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if state.termination.is_some() {
                    return None;
                }
                if let Some(probe) = state.queue.pop_front() {
                    return Some(probe);
                }
            }

            notified.await;
        }
    }

    /// Acknowledge that a probe taken with `get` is fully handled, children included.
    pub fn complete(&self) {
        let reached_zero = {
            let mut state = self.state.lock();
            debug_assert!(state.pending > 0, "complete() without matching put()");
            state.pending = state.pending.saturating_sub(1);
            if state.pending == 0 && state.termination.is_none() {
                debug_assert!(state.queue.is_empty());
                state.termination = Some(Termination::Quiescent);
                true
            } else {
                false
            }
        };

        if reached_zero {
            debug!("Frontier quiescent");
            self.signal_done();
        }
    }

    /// Stop handing out work. Workers blocked in `get` return `None`.
    pub fn close(&self) {
        let closed_now = {
            let mut state = self.state.lock();
            if state.termination.is_none() {
                state.termination = Some(Termination::Closed);
                true
            } else {
                false
            }
        };

        if closed_now {
            debug!("Frontier closed");
            self.signal_done();
        }
    }

    /// Remove every probe still queued. Meant for after the workers have stopped.
    pub fn drain(&self) -> Vec<Probe> {
        let mut state = self.state.lock();
        let drained: Vec<Probe> = state.queue.drain(..).collect();
        state.pending = state.pending.saturating_sub(drained.len());
        drained
    }

    /// Wait until the frontier is quiescent or closed.
    pub async fn wait_for_quiescence(&self) -> Termination {
        self.done.cancelled().await;
        self.termination().unwrap_or(Termination::Closed)
    }

    /// Token fired when the frontier stops handing out work.
    pub fn done_token(&self) -> CancellationToken {
        self.done.clone()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.state.lock().termination
    }

    pub fn is_quiescent(&self) -> bool {
        self.termination() == Some(Termination::Quiescent)
    }

    pub fn stats(&self) -> FrontierStats {
        let state = self.state.lock();
        FrontierStats {
            queued: state.queue.len(),
            pending: state.pending,
            high_water: state.high_water,
        }
    }

    fn signal_done(&self) {
        self.done.cancel();
        self.notify.notify_waiters();
    }
}

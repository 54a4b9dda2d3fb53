//! Discovery driver and worker pool
//!
//! [`discover`] seeds the frontier with the root, runs a fixed pool of workers that drain
//! it through the [`Expander`], waits for quiescence and returns the [`Discovery`] report.
//!
//! Cancellation is structured: the frontier owns a single done signal, fired on
//! quiescence or on an abort. Workers observe it before every dequeue and finish the
//! expansion they are in the middle of; the driver joins all of them before reading the
//! result set.

use crate::alphabet::{Alphabet, AlphabetConfig};
use crate::candidate::{Candidate, Probe};
use crate::error::ProbeError;
use crate::events::{DiscoveryEvent, EventSink};
use crate::expansion::{Expander, ExpansionError};
use crate::frontier::{Frontier, Termination};
use crate::oracle::{Oracle, QuerySyntax};
use crate::results::{ResultSet, Unresolved, UnresolvedLog, UnresolvedReason};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// What to do when the oracle fails for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Record the candidate as unresolved and carry on
    Skip,
    /// Put the candidate back until `max_attempts` evaluations failed, then skip it
    Requeue { max_attempts: u32 },
    /// Stop the whole discovery; queued candidates become unresolved
    Abort,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        ErrorPolicy::Skip
    }
}

/// Discovery section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Prefix shared by every secret
    #[serde(default)]
    pub root: String,

    /// Branching alphabet
    #[serde(default)]
    pub alphabet: AlphabetConfig,

    /// Oracle failure handling
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    /// Delay before a failed candidate is put back (requeue policy only)
    #[serde(default)]
    pub retry_delay_ms: u64,

    /// Keep branching below complete secrets to find nested ones
    #[serde(default = "default_true")]
    pub branch_complete: bool,
}

fn default_workers() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            root: String::new(),
            alphabet: AlphabetConfig::default(),
            error_policy: ErrorPolicy::default(),
            retry_delay_ms: 0,
            branch_complete: default_true(),
        }
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        if let ErrorPolicy::Requeue { max_attempts } = self.error_policy {
            if max_attempts == 0 {
                return Err("requeue max_attempts must be at least 1".to_string());
            }
        }
        Ok(())
    }
}

/// Run statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryStats {
    pub workers: usize,
    pub oracle_calls: u64,
    pub evaluated: u64,
    pub dead_ends: u64,
    pub branched: u64,
    pub found: u64,
    pub unresolved: usize,
    pub max_frontier: usize,
    pub elapsed_ms: u64,
}

impl DiscoveryStats {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

/// Outcome of one discovery.
#[derive(Debug, Clone, Serialize)]
pub struct Discovery {
    /// Confirmed complete secrets
    pub secrets: BTreeSet<String>,
    /// Candidates that could not be decided
    pub unresolved: Vec<Unresolved>,
    /// True when the run stopped on an oracle failure under the abort policy
    pub aborted: bool,
    pub stats: DiscoveryStats,
}

impl Discovery {
    /// Every reachable candidate was decided.
    pub fn is_complete(&self) -> bool {
        !self.aborted && self.unresolved.is_empty()
    }
}

/// State shared by the workers of one run.
struct RunContext {
    frontier: Frontier,
    expander: Expander,
    unresolved: UnresolvedLog,
    error_policy: ErrorPolicy,
    retry_delay: Duration,
    aborted: AtomicBool,
}

impl RunContext {
    async fn handle_failure(&self, worker_id: usize, probe: Probe, err: ExpansionError) {
        let attempts = probe.attempt + 1;
        let reason = match &err {
            ExpansionError::Encode(_) => UnresolvedReason::Encoding,
            ExpansionError::Oracle(_) => UnresolvedReason::Oracle,
        };

        if reason == UnresolvedReason::Oracle {
            match self.error_policy {
                ErrorPolicy::Requeue { max_attempts } if attempts < max_attempts => {
                    debug!(
                        worker_id,
                        candidate = %probe.candidate,
                        attempt = attempts,
                        error = %err,
                        "Requeueing candidate after oracle failure"
                    );
                    if !self.retry_delay.is_zero() {
                        sleep(self.retry_delay).await;
                    }
                    self.frontier.put(probe.retry());
                    return;
                }
                ErrorPolicy::Abort => {
                    error!(
                        worker_id,
                        candidate = %probe.candidate,
                        error = %err,
                        "Oracle failure, aborting discovery"
                    );
                    self.aborted.store(true, Ordering::SeqCst);
                    self.frontier.close();
                }
                _ => {}
            }
        }

        warn!(
            worker_id,
            candidate = %probe.candidate,
            attempts,
            error = %err,
            "Candidate unresolved"
        );
        self.record_unresolved(probe.candidate, reason, attempts, err.to_string());
    }

    fn record_unresolved(
        &self,
        candidate: Candidate,
        reason: UnresolvedReason,
        attempts: u32,
        message: String,
    ) {
        self.expander.events().emit(DiscoveryEvent::Unresolved {
            candidate: candidate.to_string(),
            reason,
            message: message.clone(),
        });
        self.unresolved.push(Unresolved {
            candidate: candidate.into_string(),
            reason,
            attempts,
            message,
        });
    }
}

async fn worker_loop(worker_id: usize, ctx: Arc<RunContext>) {
    debug!(worker_id, "Worker started");
    let done = ctx.frontier.done_token();

    loop {
        let probe = tokio::select! {
            biased;
            _ = done.cancelled() => break,
            probe = ctx.frontier.get() => match probe {
                Some(probe) => probe,
                None => break,
            },
        };

        if let Err(err) = ctx.expander.expand(&probe, &ctx.frontier).await {
            ctx.handle_failure(worker_id, probe, err).await;
        }

        ctx.frontier.complete();
    }

    debug!(worker_id, "Worker stopped");
}

/// Configured discovery runner.
#[derive(Debug, Clone)]
pub struct Discoverer {
    workers: usize,
    error_policy: ErrorPolicy,
    retry_delay: Duration,
    branch_complete: bool,
    events: EventSink,
}

impl Default for Discoverer {
    fn default() -> Self {
        Self::from_config(&DiscoveryConfig::default())
    }
}

impl Discoverer {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self {
            workers: config.workers,
            error_policy: config.error_policy,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            branch_complete: config.branch_complete,
            events: EventSink::disabled(),
        }
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_branch_complete(mut self, branch_complete: bool) -> Self {
        self.branch_complete = branch_complete;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Discover every secret reachable from `root` over `alphabet`.
    pub async fn run(
        &self,
        root: Candidate,
        alphabet: Alphabet,
        oracle: Arc<dyn Oracle>,
        syntax: Arc<dyn QuerySyntax>,
    ) -> Result<Discovery, ProbeError> {
        if self.workers == 0 {
            return Err(ProbeError::InvalidWorkerCount(self.workers));
        }
        if let ErrorPolicy::Requeue { max_attempts: 0 } = self.error_policy {
            return Err(ProbeError::ConfigError(
                "requeue max_attempts must be at least 1".to_string(),
            ));
        }

        let started = Instant::now();
        info!(
            root = %root,
            alphabet_size = alphabet.len(),
            workers = self.workers,
            oracle = oracle.name(),
            error_policy = ?self.error_policy,
            "Starting discovery"
        );

        let results = Arc::new(ResultSet::new());
        let expander = Expander::new(oracle, syntax, alphabet, Arc::clone(&results))
            .with_branch_complete(self.branch_complete)
            .with_events(self.events.clone());
        let ctx = Arc::new(RunContext {
            frontier: Frontier::new(),
            expander,
            unresolved: UnresolvedLog::default(),
            error_policy: self.error_policy,
            retry_delay: self.retry_delay,
            aborted: AtomicBool::new(false),
        });

        ctx.frontier.put(Probe::seed(root));

        let mut workers: FuturesUnordered<_> = (0..self.workers)
            .map(|worker_id| tokio::spawn(worker_loop(worker_id, Arc::clone(&ctx))))
            .collect();

        let mut worker_failure: Option<String> = None;
        let termination = loop {
            tokio::select! {
                termination = ctx.frontier.wait_for_quiescence() => break termination,
                Some(joined) = workers.next() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Worker failed, stopping discovery");
                        worker_failure.get_or_insert_with(|| e.to_string());
                        ctx.frontier.close();
                    }
                }
            }
        };

        while let Some(joined) = workers.next().await {
            if let Err(e) = joined {
                error!(error = %e, "Worker failed");
                worker_failure.get_or_insert_with(|| e.to_string());
            }
        }

        if let Some(failure) = worker_failure {
            return Err(ProbeError::WorkerFailed(failure));
        }

        if termination == Termination::Closed {
            for probe in ctx.frontier.drain() {
                ctx.record_unresolved(
                    probe.candidate,
                    UnresolvedReason::Cancelled,
                    probe.attempt,
                    "discovery stopped before evaluation".to_string(),
                );
            }
        }

        let frontier_stats = ctx.frontier.stats();
        let totals = ctx.expander.counters().totals();
        let aborted = ctx.aborted.load(Ordering::SeqCst);

        let ctx = Arc::try_unwrap(ctx).map_err(|_| {
            ProbeError::WorkerFailed("worker still holds discovery state".to_string())
        })?;
        drop(ctx.expander);
        let unresolved = ctx.unresolved.into_sorted();
        let secrets = Arc::try_unwrap(results)
            .map(ResultSet::into_inner)
            .unwrap_or_else(|shared| shared.snapshot());

        let stats = DiscoveryStats {
            workers: self.workers,
            oracle_calls: totals.oracle_calls,
            evaluated: totals.evaluated,
            dead_ends: totals.dead_ends,
            branched: totals.branched,
            found: totals.found,
            unresolved: unresolved.len(),
            max_frontier: frontier_stats.high_water,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            found = secrets.len(),
            unresolved = unresolved.len(),
            oracle_calls = stats.oracle_calls,
            aborted,
            elapsed_ms = stats.elapsed_ms,
            "Discovery finished"
        );

        Ok(Discovery {
            secrets,
            unresolved,
            aborted,
            stats,
        })
    }
}

/// Discover every secret reachable from `root`, using `worker_count` concurrent workers
/// and the default error policy.
pub async fn discover(
    root: impl Into<Candidate>,
    alphabet: Alphabet,
    oracle: Arc<dyn Oracle>,
    syntax: Arc<dyn QuerySyntax>,
    worker_count: usize,
) -> Result<Discovery, ProbeError> {
    Discoverer::new(worker_count)
        .run(root.into(), alphabet, oracle, syntax)
        .await
}

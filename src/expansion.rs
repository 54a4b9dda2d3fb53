//! Expansion Engine
//!
//! Decides the fate of one probe:
//!
//! 1. Open test (`encode(c) + open_suffix`). A fail means no secret extends `c`: dead end.
//! 2. Exact test (`encode(c)`). A pass records `c` in the result set.
//! 3. Branch into `c + a` for every alphabet character. Complete candidates are branched
//!    too unless `branch_complete` is off, so nested secrets (`a` and `ab`) are both found.
//!
//! The seed probe is branched without being tested. Oracle and encoding errors are
//! returned to the caller untouched; they never count as a pass or a fail.

use crate::alphabet::Alphabet;
use crate::candidate::Probe;
use crate::error::{EncodeError, OracleError};
use crate::events::{DiscoveryEvent, EventSink};
use crate::frontier::Frontier;
use crate::oracle::{Oracle, QuerySyntax};
use crate::results::ResultSet;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Why a probe could not be expanded.
#[derive(Debug, Clone, Error)]
pub enum ExpansionError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Outcome of expanding one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Seed probe, branched untested
    Seeded { children: usize },
    /// Open test failed
    DeadEnd,
    /// Proper prefix of a longer secret, not a secret itself
    Prefix { children: usize },
    /// Complete secret; `children` is zero when complete candidates are leaves
    Complete { children: usize, new: bool },
}

impl Verdict {
    pub fn children(&self) -> usize {
        match self {
            Verdict::Seeded { children }
            | Verdict::Prefix { children }
            | Verdict::Complete { children, .. } => *children,
            Verdict::DeadEnd => 0,
        }
    }
}

/// Counters shared by every worker of a discovery.
#[derive(Debug, Default)]
pub struct ExpansionCounters {
    oracle_calls: AtomicU64,
    evaluated: AtomicU64,
    dead_ends: AtomicU64,
    branched: AtomicU64,
    found: AtomicU64,
}

/// Snapshot of [`ExpansionCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionTotals {
    pub oracle_calls: u64,
    pub evaluated: u64,
    pub dead_ends: u64,
    pub branched: u64,
    pub found: u64,
}

impl ExpansionCounters {
    pub fn totals(&self) -> ExpansionTotals {
        ExpansionTotals {
            oracle_calls: self.oracle_calls.load(Ordering::Relaxed),
            evaluated: self.evaluated.load(Ordering::Relaxed),
            dead_ends: self.dead_ends.load(Ordering::Relaxed),
            branched: self.branched.load(Ordering::Relaxed),
            found: self.found.load(Ordering::Relaxed),
        }
    }
}

/// Per-discovery expansion state. Cheap to share behind an `Arc`.
pub struct Expander {
    oracle: Arc<dyn Oracle>,
    syntax: Arc<dyn QuerySyntax>,
    alphabet: Alphabet,
    results: Arc<ResultSet>,
    branch_complete: bool,
    events: EventSink,
    counters: ExpansionCounters,
}

impl Expander {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        syntax: Arc<dyn QuerySyntax>,
        alphabet: Alphabet,
        results: Arc<ResultSet>,
    ) -> Self {
        Self {
            oracle,
            syntax,
            alphabet,
            results,
            branch_complete: true,
            events: EventSink::disabled(),
            counters: ExpansionCounters::default(),
        }
    }

    /// Whether complete candidates are branched further.
    pub fn with_branch_complete(mut self, branch_complete: bool) -> Self {
        self.branch_complete = branch_complete;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn counters(&self) -> &ExpansionCounters {
        &self.counters
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Evaluate `probe`, recording it and putting its children on `frontier` as needed.
    pub async fn expand(&self, probe: &Probe, frontier: &Frontier) -> Result<Verdict, ExpansionError> {
        if probe.is_seed() {
            let children = self.branch(probe, frontier);
            debug!(seed = %probe.candidate, children, "Seeded frontier");
            return Ok(Verdict::Seeded { children });
        }

        let candidate = &probe.candidate;
        let open_pattern = self.syntax.open_pattern(candidate)?;
        let exact_pattern = self.syntax.exact_pattern(candidate)?;

        self.counters.evaluated.fetch_add(1, Ordering::Relaxed);

        if !self.ask(&open_pattern).await? {
            self.counters.dead_ends.fetch_add(1, Ordering::Relaxed);
            self.events.emit(DiscoveryEvent::DeadEnd {
                candidate: candidate.to_string(),
            });
            return Ok(Verdict::DeadEnd);
        }

        debug!(candidate = %candidate, "PASS");
        self.events.emit(DiscoveryEvent::Passed {
            candidate: candidate.to_string(),
        });

        if self.ask(&exact_pattern).await? {
            let new = self.results.insert(candidate);
            if new {
                self.counters.found.fetch_add(1, Ordering::Relaxed);
                info!(candidate = %candidate, "FOUND");
                self.events.emit(DiscoveryEvent::Found {
                    candidate: candidate.to_string(),
                });
            }
            let children = if self.branch_complete {
                self.branch(probe, frontier)
            } else {
                0
            };
            return Ok(Verdict::Complete { children, new });
        }

        let children = self.branch(probe, frontier);
        Ok(Verdict::Prefix { children })
    }

    async fn ask(&self, pattern: &str) -> Result<bool, OracleError> {
        self.counters.oracle_calls.fetch_add(1, Ordering::Relaxed);
        self.oracle.test(pattern).await
    }

    fn branch(&self, probe: &Probe, frontier: &Frontier) -> usize {
        for ch in self.alphabet.iter() {
            frontier.put(probe.child(ch));
        }
        if !self.alphabet.is_empty() {
            self.counters.branched.fetch_add(1, Ordering::Relaxed);
        }
        self.alphabet.len()
    }
}

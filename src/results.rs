//! Result Set and unresolved candidates.

use crate::candidate::Candidate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Confirmed complete secrets. Grows monotonically; inserts are linearizable.
#[derive(Debug, Default)]
pub struct ResultSet {
    secrets: Mutex<BTreeSet<String>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a secret. Returns false if it was already present.
    pub fn insert(&self, candidate: &Candidate) -> bool {
        self.secrets.lock().insert(candidate.as_str().to_string())
    }

    pub fn contains(&self, secret: &str) -> bool {
        self.secrets.lock().contains(secret)
    }

    pub fn len(&self) -> usize {
        self.secrets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.lock().is_empty()
    }

    pub fn snapshot(&self) -> BTreeSet<String> {
        self.secrets.lock().clone()
    }

    pub fn into_inner(self) -> BTreeSet<String> {
        self.secrets.into_inner()
    }
}

/// Why a candidate's fate could not be decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// The oracle failed for this candidate
    Oracle,
    /// The candidate could not be encoded for the oracle
    Encoding,
    /// Discovery stopped before the candidate was evaluated
    Cancelled,
}

/// A candidate that is neither confirmed nor ruled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unresolved {
    pub candidate: String,
    pub reason: UnresolvedReason,
    /// Failed evaluations of this candidate
    pub attempts: u32,
    pub message: String,
}

/// Concurrent accumulator for [`Unresolved`] records.
#[derive(Debug, Default)]
pub struct UnresolvedLog {
    entries: Mutex<Vec<Unresolved>>,
}

impl UnresolvedLog {
    pub fn push(&self, entry: Unresolved) {
        self.entries.lock().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Entries sorted by candidate for stable output.
    pub fn into_sorted(self) -> Vec<Unresolved> {
        let mut entries = self.entries.into_inner();
        entries.sort_by(|a, b| a.candidate.cmp(&b.candidate));
        entries
    }
}

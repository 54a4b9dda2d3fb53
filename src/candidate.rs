//! Candidate prefixes and the frontier items that carry them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A hypothesised prefix of at least one secret. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate(String);

impl Candidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The empty prefix.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// This candidate extended by one character.
    pub fn child(&self, ch: char) -> Self {
        let mut text = String::with_capacity(self.0.len() + ch.len_utf8());
        text.push_str(&self.0);
        text.push(ch);
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Candidate {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Candidate {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl AsRef<str> for Candidate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A candidate waiting on the frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub candidate: Candidate,
    /// Characters appended since the seed. Depth 0 is the seed itself.
    pub depth: usize,
    /// Evaluations of this candidate that already failed.
    pub attempt: u32,
}

impl Probe {
    pub fn seed(candidate: Candidate) -> Self {
        Self {
            candidate,
            depth: 0,
            attempt: 0,
        }
    }

    pub fn is_seed(&self) -> bool {
        self.depth == 0
    }

    /// A fresh probe for `self.candidate + ch`.
    pub fn child(&self, ch: char) -> Self {
        Self {
            candidate: self.candidate.child(ch),
            depth: self.depth + 1,
            attempt: 0,
        }
    }

    /// The same candidate, marked with one more failed attempt.
    pub fn retry(mut self) -> Self {
        self.attempt += 1;
        self
    }
}

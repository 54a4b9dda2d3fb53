//! In-memory oracle over a known secret set.
//!
//! Evaluates SQL `LIKE` patterns (as produced by [`LikeSyntax`](super::LikeSyntax))
//! against the secrets it was built with. Used by tests, benchmarks and the `demo`
//! command. Supports artificial latency and injected failures.

use crate::error::OracleError;
use crate::oracle::syntax::LikeSyntax;
use crate::oracle::Oracle;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyRun,
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        let token = match ch {
            LikeSyntax::ESCAPE => match chars.next() {
                Some(escaped) => Token::Literal(escaped),
                // A trailing escape matches itself
                None => Token::Literal(LikeSyntax::ESCAPE),
            },
            LikeSyntax::ANY_RUN => Token::AnyRun,
            LikeSyntax::ANY_ONE => Token::AnyOne,
            other => Token::Literal(other),
        };
        tokens.push(token);
    }
    tokens
}

/// Case-sensitive `LIKE` match of `text` against pre-tokenized `pattern`.
fn like_match(pattern: &[Token], text: &[char]) -> bool {
    // reachable[j]: pattern prefix consumed so far matches text[..j]
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;
    for token in pattern {
        let mut next = vec![false; text.len() + 1];
        match token {
            Token::AnyRun => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= reachable[j];
                    next[j] = seen;
                }
            }
            Token::AnyOne => {
                for j in 0..text.len() {
                    next[j + 1] = reachable[j];
                }
            }
            Token::Literal(ch) => {
                for j in 0..text.len() {
                    next[j + 1] = reachable[j] && text[j] == *ch;
                }
            }
        }
        reachable = next;
    }
    reachable[text.len()]
}

/// Simulated oracle backed by a fixed set of secrets.
pub struct SecretSetOracle {
    secrets: Vec<Vec<char>>,
    latency: Option<Duration>,
    calls: AtomicUsize,
    queried: Mutex<Vec<String>>,
    always_fail: HashSet<String>,
    fail_times: Mutex<HashMap<String, usize>>,
}

impl SecretSetOracle {
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            secrets: secrets
                .into_iter()
                .map(|s| s.as_ref().chars().collect())
                .collect(),
            latency: None,
            calls: AtomicUsize::new(0),
            queried: Mutex::new(Vec::new()),
            always_fail: HashSet::new(),
            fail_times: Mutex::new(HashMap::new()),
        }
    }

    /// Sleep for `latency` before answering each query.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every query for exactly `pattern` fails.
    pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
        self.always_fail.insert(pattern.into());
        self
    }

    /// The first `times` queries for exactly `pattern` fail, later ones are answered.
    pub fn failing_times(self, pattern: impl Into<String>, times: usize) -> Self {
        self.fail_times.lock().insert(pattern.into(), times);
        self
    }

    /// Total queries answered or failed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every pattern queried so far, in arrival order.
    pub fn queried_patterns(&self) -> Vec<String> {
        self.queried.lock().clone()
    }

    /// Answer a pattern without side effects.
    pub fn matches(&self, pattern: &str) -> bool {
        let tokens = tokenize(pattern);
        self.secrets.iter().any(|secret| like_match(&tokens, secret))
    }

    fn injected_failure(&self, pattern: &str) -> Option<OracleError> {
        if self.always_fail.contains(pattern) {
            return Some(OracleError::Unavailable(format!(
                "injected failure for {:?}",
                pattern
            )));
        }
        let mut fail_times = self.fail_times.lock();
        match fail_times.get_mut(pattern) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Some(OracleError::Unavailable(format!(
                    "injected transient failure for {:?}",
                    pattern
                )))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl Oracle for SecretSetOracle {
    async fn test(&self, pattern: &str) -> Result<bool, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queried.lock().push(pattern.to_string());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(err) = self.injected_failure(pattern) {
            return Err(err);
        }

        Ok(self.matches(pattern))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

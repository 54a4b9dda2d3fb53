//! Error types for prefix discovery.

use thiserror::Error;

/// Oracle transport errors. These are never interpreted as a pass or a fail.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("Oracle request failed: {0}")]
    RequestFailed(String),

    #[error("Oracle request timed out: {0}")]
    Timeout(String),

    #[error("Oracle connection error: {0}")]
    Connection(String),

    #[error("Oracle returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Malformed oracle response: {0}")]
    MalformedResponse(String),

    #[error("Oracle unavailable: {0}")]
    Unavailable(String),
}

/// A candidate that cannot be expressed in the oracle's pattern syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Character {ch:?} cannot be encoded in candidate {candidate:?}")]
    Unencodable { candidate: String, ch: char },
}

/// Top-level errors surfaced by the discovery driver, configuration and CLI.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Worker count must be at least 1 (got {0})")]
    InvalidWorkerCount(usize),

    #[error("Worker failed: {0}")]
    WorkerFailed(String),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ProbeError {
    fn from(err: config::ConfigError) -> Self {
        ProbeError::ConfigError(err.to_string())
    }
}

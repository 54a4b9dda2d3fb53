//! prefix-probe: adaptive prefix-tree discovery of secrets through a boolean oracle
//!
//! Starting from a root candidate, every candidate is extended by one character of the
//! alphabet and kept only while the oracle confirms it is the prefix of at least one
//! secret. Candidates the oracle also confirms exactly are collected as secrets. A fixed
//! pool of async workers shares the frontier and the run ends once no candidate is
//! queued or being evaluated.

pub mod alphabet;
pub mod candidate;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod expansion;
pub mod frontier;
pub mod logging;
pub mod oracle;
pub mod results;

pub use alphabet::Alphabet;
pub use candidate::Candidate;
pub use discovery::{discover, Discoverer, Discovery, ErrorPolicy};
pub use error::{EncodeError, OracleError, ProbeError};
pub use oracle::{Oracle, QuerySyntax};

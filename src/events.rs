//! Discovery events for live reporting.

use crate::results::UnresolvedReason;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Something observable that happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscoveryEvent {
    /// The candidate is a prefix of at least one secret
    Passed { candidate: String },
    /// The candidate is a complete secret
    Found { candidate: String },
    /// No secret starts with the candidate
    DeadEnd { candidate: String },
    /// The candidate's fate could not be decided
    Unresolved {
        candidate: String,
        reason: UnresolvedReason,
        message: String,
    },
}

/// Optional, non-blocking event channel.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<DiscoveryEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<DiscoveryEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Send an event. A dropped receiver is ignored.
    pub fn emit(&self, event: DiscoveryEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

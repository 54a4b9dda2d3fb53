//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ProbeError;

/// Map discovery errors to a string for CLI output.
pub fn map_error(e: &ProbeError) -> String {
    match e {
        ProbeError::InvalidWorkerCount(_) => format!("{} (see --workers)", e),
        _ => e.to_string(),
    }
}

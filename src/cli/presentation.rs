//! CLI presentation: text and JSON rendering of discovery results.

use crate::discovery::Discovery;
use crate::error::ProbeError;
use crate::results::UnresolvedReason;
use owo_colors::OwoColorize;
use std::fmt::Write;

const RULE: &str = "------------------------------";

fn reason_label(reason: UnresolvedReason) -> &'static str {
    match reason {
        UnresolvedReason::Oracle => "oracle",
        UnresolvedReason::Encoding => "encoding",
        UnresolvedReason::Cancelled => "cancelled",
    }
}

/// Live line for a newly found secret.
pub fn format_found_line(secret: &str, color: bool) -> String {
    if color {
        format!("{} - {:?}", "FOUND".green().bold(), secret)
    } else {
        format!("FOUND - {:?}", secret)
    }
}

/// Human-readable summary. Secrets are quoted so whitespace stays visible.
pub fn format_discovery_text(discovery: &Discovery, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    if color {
        let _ = writeln!(out, "{}", "Found:".bold());
    } else {
        let _ = writeln!(out, "Found:");
    }
    if discovery.secrets.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for secret in &discovery.secrets {
        let _ = writeln!(out, "  {:?}", secret);
    }

    if !discovery.unresolved.is_empty() {
        let header = format!("Unresolved ({}):", discovery.unresolved.len());
        if color {
            let _ = writeln!(out, "{}", header.yellow().bold());
        } else {
            let _ = writeln!(out, "{}", header);
        }
        for entry in &discovery.unresolved {
            let _ = writeln!(
                out,
                "  {:?} [{}, {} attempt(s)] {}",
                entry.candidate,
                reason_label(entry.reason),
                entry.attempts,
                entry.message
            );
        }
    }

    if discovery.aborted {
        let line = "Discovery aborted after an oracle failure";
        if color {
            let _ = writeln!(out, "{}", line.red());
        } else {
            let _ = writeln!(out, "{}", line);
        }
    }

    let stats = &discovery.stats;
    let _ = write!(
        out,
        "In {:.2} seconds ({} oracle calls, {} workers)",
        stats.elapsed().as_secs_f64(),
        stats.oracle_calls,
        stats.workers
    );
    out
}

pub fn format_discovery_json(discovery: &Discovery) -> Result<String, ProbeError> {
    serde_json::to_string_pretty(discovery)
        .map_err(|e| ProbeError::ConfigError(format!("Failed to render JSON: {}", e)))
}

pub fn format_check_result(pattern: &str, passed: bool, color: bool) -> String {
    let verdict = if passed { "PASS" } else { "FAIL" };
    if !color {
        return format!("{} - {:?}", verdict, pattern);
    }
    if passed {
        format!("{} - {:?}", verdict.green().bold(), pattern)
    } else {
        format!("{} - {:?}", verdict.red().bold(), pattern)
    }
}

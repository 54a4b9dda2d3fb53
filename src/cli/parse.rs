//! CLI parse: clap types for prefix-probe. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// prefix-probe - discover secret strings behind a prefix oracle
#[derive(Parser, Debug)]
#[command(name = "prefix-probe")]
#[command(about = "Discover secret strings through a boolean prefix oracle")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (merged over the global config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover secrets through the configured HTTP oracle
    Run {
        #[command(flatten)]
        search: SearchArgs,

        /// Oracle URL (overrides oracle.url)
        #[arg(long)]
        url: Option<String>,
    },
    /// Send a single candidate to the HTTP oracle
    Check {
        /// Raw candidate, encoded with the configured syntax
        candidate: String,

        /// Ask whether the candidate is a prefix instead of an exact secret
        #[arg(long)]
        open: bool,

        /// Oracle URL (overrides oracle.url)
        #[arg(long)]
        url: Option<String>,
    },
    /// Discover secrets from an in-memory oracle
    Demo {
        /// Secret known to the simulated oracle (repeatable)
        #[arg(long = "secret", required = true)]
        secrets: Vec<String>,

        #[command(flatten)]
        search: SearchArgs,

        /// Artificial oracle latency per query
        #[arg(long, default_value = "0")]
        latency_ms: u64,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// Discovery overrides shared by `run` and `demo`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Number of concurrent workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Prefix shared by every secret
    #[arg(long)]
    pub root: Option<String>,

    /// Explicit branching characters (overrides the alphabet preset)
    #[arg(long)]
    pub alphabet: Option<String>,

    /// Oracle failure handling
    #[arg(long, value_enum)]
    pub error_policy: Option<ErrorPolicyArg>,

    /// Attempts per candidate with the requeue policy
    #[arg(long, default_value = "3")]
    pub max_attempts: u32,

    /// Treat complete secrets as leaves (skips nested secrets, fewer queries)
    #[arg(long)]
    pub no_nested: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicyArg {
    Skip,
    Requeue,
    Abort,
}

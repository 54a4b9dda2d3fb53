//! CLI route: single route table and run context. Dispatches to discovery and presentation.

use crate::alphabet::Alphabet;
use crate::candidate::Candidate;
use crate::cli::parse::{Commands, ErrorPolicyArg, OutputFormat, SearchArgs};
use crate::cli::presentation::{
    format_check_result, format_discovery_json, format_discovery_text, format_found_line,
};
use crate::config::{ConfigLoader, ProbeConfig, ValidationError};
use crate::discovery::{Discoverer, Discovery, DiscoveryConfig, ErrorPolicy};
use crate::error::ProbeError;
use crate::events::{DiscoveryEvent, EventSink};
use crate::oracle::{HttpOracle, LikeSyntax, Oracle, QuerySyntax, SecretSetOracle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Exit code for a run that finished with undecided candidates.
pub const EXIT_INCOMPLETE: i32 = 2;

/// Rendered command result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub exit_code: i32,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self { text, exit_code: 0 }
    }
}

/// Runtime context for CLI execution: the merged configuration.
pub struct RunContext {
    config: ProbeConfig,
    color: bool,
}

impl RunContext {
    /// Load configuration from the standard sources plus an optional explicit file.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ProbeError> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self::new(config))
    }

    pub fn new(config: ProbeConfig) -> Self {
        let color = config.logging.color;
        Self { config, color }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub async fn execute(&self, command: &Commands) -> Result<CommandOutput, ProbeError> {
        match command {
            Commands::Run { search, url } => {
                let mut config = self.config.clone();
                if let Some(url) = url {
                    config.oracle.url = url.clone();
                }
                apply_search_args(&mut config.discovery, search);
                validate(&config, true)?;

                let syntax = config.oracle.syntax.build();
                let oracle: Arc<dyn Oracle> = Arc::new(HttpOracle::new(config.oracle.clone())?);
                self.discover(&config.discovery, oracle, syntax, search.format)
                    .await
            }
            Commands::Check { candidate, open, url } => {
                let mut config = self.config.clone();
                if let Some(url) = url {
                    config.oracle.url = url.clone();
                }
                validate(&config, true)?;

                let syntax = config.oracle.syntax.build();
                let candidate = Candidate::new(candidate.as_str());
                let pattern = if *open {
                    syntax.open_pattern(&candidate)?
                } else {
                    syntax.exact_pattern(&candidate)?
                };
                let oracle = HttpOracle::new(config.oracle.clone())?;
                let passed = oracle.test(&pattern).await?;
                Ok(CommandOutput::ok(format_check_result(
                    &pattern, passed, self.color,
                )))
            }
            Commands::Demo {
                secrets,
                search,
                latency_ms,
            } => {
                let mut config = self.config.clone();
                apply_search_args(&mut config.discovery, search);
                validate(&config, false)?;

                let mut oracle = SecretSetOracle::new(secrets);
                if *latency_ms > 0 {
                    oracle = oracle.with_latency(Duration::from_millis(*latency_ms));
                }
                self.discover(
                    &config.discovery,
                    Arc::new(oracle),
                    Arc::new(LikeSyntax),
                    search.format,
                )
                .await
            }
            Commands::Config => Ok(CommandOutput::ok(self.config.to_toml()?)),
        }
    }

    async fn discover(
        &self,
        config: &DiscoveryConfig,
        oracle: Arc<dyn Oracle>,
        syntax: Arc<dyn QuerySyntax>,
        format: OutputFormat,
    ) -> Result<CommandOutput, ProbeError> {
        let alphabet: Alphabet = config.alphabet.build();
        let root = Candidate::new(config.root.as_str());

        let mut discoverer = Discoverer::from_config(config);
        let printer = if format == OutputFormat::Text {
            let (tx, rx) = mpsc::unbounded_channel();
            discoverer = discoverer.with_events(EventSink::new(tx));
            Some(spawn_found_printer(rx, self.color))
        } else {
            None
        };

        let result = discoverer.run(root, alphabet, oracle, syntax).await;
        // Closes the event channel so the printer drains and exits
        drop(discoverer);
        if let Some(printer) = printer {
            let _ = printer.await;
        }
        let discovery = result?;

        info!(found = discovery.secrets.len(), "Discovery complete");
        render(&discovery, format, self.color)
    }
}

fn render(
    discovery: &Discovery,
    format: OutputFormat,
    color: bool,
) -> Result<CommandOutput, ProbeError> {
    let text = match format {
        OutputFormat::Text => format_discovery_text(discovery, color),
        OutputFormat::Json => format_discovery_json(discovery)?,
    };
    let exit_code = if discovery.is_complete() {
        0
    } else {
        EXIT_INCOMPLETE
    };
    Ok(CommandOutput { text, exit_code })
}

fn spawn_found_printer(
    mut rx: mpsc::UnboundedReceiver<DiscoveryEvent>,
    color: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let DiscoveryEvent::Found { candidate } = event {
                println!("{}", format_found_line(&candidate, color));
            }
        }
    })
}

/// Fold CLI overrides into the discovery section.
pub fn apply_search_args(config: &mut DiscoveryConfig, args: &SearchArgs) {
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(root) = &args.root {
        config.root = root.clone();
    }
    if let Some(chars) = &args.alphabet {
        config.alphabet.chars = Some(chars.clone());
    }
    if let Some(policy) = args.error_policy {
        config.error_policy = match policy {
            ErrorPolicyArg::Skip => ErrorPolicy::Skip,
            ErrorPolicyArg::Requeue => ErrorPolicy::Requeue {
                max_attempts: args.max_attempts,
            },
            ErrorPolicyArg::Abort => ErrorPolicy::Abort,
        };
    }
    if args.no_nested {
        config.branch_complete = false;
    }
}

fn validate(config: &ProbeConfig, require_oracle: bool) -> Result<(), ProbeError> {
    config.validate(require_oracle).map_err(|errors| {
        ProbeError::ConfigError(
            errors
                .iter()
                .map(ValidationError::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    })
}

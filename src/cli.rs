//! CLI domain: parse, route, output, and presentation only.
//! Single route table dispatches to the discovery driver.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ErrorPolicyArg, OutputFormat, SearchArgs};
pub use presentation::{
    format_check_result, format_discovery_json, format_discovery_text, format_found_line,
};
pub use route::{apply_search_args, CommandOutput, RunContext, EXIT_INCOMPLETE};

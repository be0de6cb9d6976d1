//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_models_json, format_models_text, format_run_report_json, format_run_report_text,
    format_status_json, format_status_text,
};
pub use route::RunContext;

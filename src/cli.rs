//! CLI domain: parse, route and presentation only.
//! No domain orchestration; single route table dispatches to the service.

mod parse;
mod presentation;
mod route;

pub use parse::{Cli, Commands};
pub use presentation::{format_check_json, format_check_text, MountSummary};
pub use route::RunContext;

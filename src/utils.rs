//! Utils

use clap::Parser;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Arguments for the quote demo
#[derive(Debug, Parser)]
pub struct QuoteArgs {
    /// Scenario set to load from `fixtures/scenarios`
    #[clap(short, long, default_value = "conformance")]
    pub fixture: String,

    /// Scenario to price; every scenario in the set when omitted
    #[clap(short, long)]
    pub scenario: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

//! Quote Example
//!
//! This example prices the bookings of a scenario set and prints their breakdown.
//!
//! Use `-f` to load a scenario set by name from `fixtures/scenarios`
//! Use `-s` to price a single scenario
//! Use `--log-format json` for structured logs

use std::io;

use anyhow::Result;
use clap::Parser;
use fare_composer::{
    fixtures::ScenarioSet,
    pricing::{Pricing, PricingComposer},
    summary::PriceSummary,
    utils::{LogFormat, QuoteArgs},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Quote Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let args = QuoteArgs::parse();

    init_logging(&args)?;

    let set = ScenarioSet::from_set(&args.fixture)?;
    let composer = PricingComposer::new(*set.policy());

    let names = match args.scenario.as_deref() {
        Some(name) => vec![name],
        None => set.names(),
    };

    for name in names {
        let scenario = set.scenario(name)?;

        println!("\n{name}");

        match composer.compose(&scenario.input())? {
            Pricing::Available(result) => PriceSummary::new(&result).write_to(io::stdout())?,
            Pricing::Unavailable => println!("  Price on request"),
        }
    }

    Ok(())
}

fn init_logging(args: &QuoteArgs) -> Result<()> {
    let filter = EnvFilter::try_new(&args.log_level)?;
    let registry = tracing_subscriber::registry().with(filter);

    match args.log_format {
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(true))
            .try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?,
    }

    Ok(())
}

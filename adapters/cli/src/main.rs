#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates a Maze Escape level, runs the
//! simulation headlessly and prints the final state.

mod options;
mod report;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use maze_escape_core::Command;
use maze_escape_system_simulation::{apply, query, Simulation};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{
    options::{CliArgs, OutputFormat},
    report::{EventTally, Report},
};

const DEFAULT_LOG_FILTER: &str = "info";

/// Entry point for the Maze Escape command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_level.as_deref());

    let level = args.level_config()?;
    let duration = args.duration()?;
    let mut simulation = Simulation::new(&level).context("invalid level configuration")?;

    let mut tally = EventTally::default();
    let mut events = Vec::new();
    for command in args.opening_commands()? {
        apply(&mut simulation, command, &mut events);
    }
    tally.record_all(events.drain(..));

    run(&mut simulation, duration, args.tick(), &mut tally);

    let report = Report::capture(&simulation, tally);
    match args.format {
        OutputFormat::Ascii => print!("{}", report.render_ascii()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(simulation: &mut Simulation, duration: Duration, dt: Duration, tally: &mut EventTally) {
    let mut events = Vec::new();
    let mut ticks = 0_u64;
    while query::now(simulation) < duration {
        apply(simulation, Command::Tick { dt }, &mut events);
        tally.record_all(events.drain(..));
        ticks += 1;
    }
    debug!(ticks, "simulation loop finished");
    info!(
        elapsed_ms = query::now(simulation).as_millis() as u64,
        events = tally.total(),
        "run complete"
    );
}

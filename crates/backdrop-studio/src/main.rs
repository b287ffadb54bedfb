mod cli;
mod present;
mod snapshot;
mod window;

use anyhow::Result;
use backdrop_engine::coords::Extent;
use backdrop_engine::logging::{init_logging, LoggingConfig};
use clap::Parser;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(match &cli.log {
        Some(filter) => LoggingConfig::with_filter(filter.clone()),
        None => LoggingConfig::default(),
    });

    let setup = cli.mount_setup()?;
    match cli.command {
        Command::Window { width, height } => window::run(setup, Extent::new(width, height)),
        Command::Snapshot {
            out,
            frames,
            width,
            height,
        } => snapshot::run(&setup, Extent::new(width, height), frames, &out),
    }
}

mod cli;
mod logging;
mod map;
mod model;
mod orchestrator;
mod storage;
mod store;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
mod validate;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args)
}

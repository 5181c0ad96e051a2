use clap::Parser;
use floorplan::init_logging;

mod cli;

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_logging()?;
    cli::run(args)
}

use clap::Parser;
use saksflyt_cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    run(Cli::parse())
}

mod cli;
mod graph;
mod particles;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let config = run::load_config(&cli.run)?;
    match cli.command {
        Command::Graph(args) => graph::run(&cli.run, &config, args),
        Command::Particles(args) => particles::run(&cli.run, &config, args),
    }
}

use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    quota::{self, QuotaArgs},
    sample::{self, SampleArgs},
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "msamp-sim",
    version,
    about = "Sample machines from the prior or posterior over model topologies"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Emit debug-level logs on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Allocate samples across the model table, run the generator and log a summary.
    Sample(SampleArgs),
    /// Print the per-model allocation without sampling anything.
    Quota(QuotaArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    match cli.command {
        Command::Sample(args) => sample::run(&args),
        Command::Quota(args) => quota::run(&args),
    }
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn Error>> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

mod commands;
mod output;
mod utils;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fio-balancer")]
#[command(about = "Spread fio load over NFS mount points across a fleet of hosts", long_about = None)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run this host's share of the fleet benchmark
    Run(commands::run::RunArgs),
    /// Run against an explicit list of addresses on one host
    Single(commands::single::SingleArgs),
    /// Unmount shares left behind by an interrupted run
    Teardown(commands::teardown::TeardownArgs),
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // logs go to stderr; stdout carries the plan and report
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run(args) => commands::run::handle(args).await,
        Commands::Single(args) => commands::single::handle(args).await,
        Commands::Teardown(args) => commands::teardown::handle(args).await,
        Commands::Version => {
            println!("fio-balancer {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::seed::SeedArgs;

#[derive(Debug, Parser)]
#[command(
    name = "eshop",
    about = "E-Shop customer store operator CLI",
    long_about = "Bulk-load synthetic customers, inspect configuration, and check storage readiness.",
    after_help = "Examples:\n  eshop seed --n 10000 --batch 1000\n  eshop doctor --json\n  eshop config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Insert synthetic pt-BR customers in batches and report the totals")]
    Seed {
        #[arg(long = "n", help = "Number of customers to generate (default: seed.count)")]
        count: Option<u64>,
        #[arg(long = "batch", help = "Records per bulk write (default: seed.batch_size)")]
        batch_size: Option<usize>,
        #[arg(long, help = "Target collection (default: store.default_collection)")]
        collection: Option<String>,
        #[arg(long = "seed", help = "RNG seed for a reproducible dataset")]
        rng_seed: Option<u64>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and storage connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command {
        Command::Seed { count, batch_size, collection, rng_seed } => {
            commands::seed::run(SeedArgs { count, batch_size, collection, rng_seed })
        }
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

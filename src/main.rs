// This is the entry point of the moderation CLI.
//
// **Architecture Overview:**
// - `core/` = Business logic (storage- and transport-agnostic)
// - `infra/` = Implementations of core traits (SQLite, HTTP classifier, audit sinks)
// - `cli/` = Command-line adapter (argument parsing, output)
//
// This file's job is to:
// 1. Load `.env`
// 2. Parse the command line
// 3. Hand off to the CLI layer, which wires services and runs the command

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "cli/cli_layer.rs"]
mod cli;
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use clap::Parser;

#[tokio::main]
async fn main() {
    // A missing .env file is fine; real deployments use the environment.
    dotenv::dotenv().ok();

    let cli = cli::Cli::parse();
    if let Err(err) = cli::run(cli).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

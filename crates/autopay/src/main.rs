// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Autopay - a standing-payment rule engine daemon.
//!
//! This is the binary entry point for the autopay daemon.

use clap::{Parser, Subcommand};

mod serve;
mod sim;

/// Autopay - standing payment rules, executed when their conditions hold.
#[derive(Parser, Debug)]
#[command(name = "autopay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the autopay engine with a set of demo rules.
    Serve,
    /// Print the effective configuration and exit.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match autopay_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            autopay_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) | None => {
            if let Err(error) = serve::run_serve(config).await {
                eprintln!("autopay: {error}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            println!("engine.tick_interval_secs = {}", config.engine.tick_interval_secs);
            println!("engine.settlement_delay_ms = {}", config.engine.settlement_delay_ms);
            println!("engine.price_symbol = {:?}", config.engine.price_symbol);
            println!("engine.funding_wallet = {:?}", config.engine.funding_wallet);
            println!("log.level = {:?}", config.log.level);
        }
    }
}

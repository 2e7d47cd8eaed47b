// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Qarz - a Telegram debt ledger bot for small shops.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check_config;
mod debts;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use qarz_config::QarzConfig;

/// Qarz - a Telegram debt ledger bot for small shops.
#[derive(Parser, Debug)]
#[command(name = "qarz", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot until interrupted.
    Serve,
    /// Validate the configuration and print the effective values.
    CheckConfig,
    /// Show what a phone number owes across all shops.
    Debts {
        /// Phone number in the configured format, e.g. +998901234567.
        phone: String,
    },
}

fn load_config(path: Option<&std::path::Path>) -> QarzConfig {
    let loaded = match path {
        Some(path) => qarz_config::load_and_validate_path(path),
        None => qarz_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            qarz_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("qarz: use --help for available commands");
        return;
    };

    let config = load_config(cli.config.as_deref());

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::CheckConfig => check_config::run_check_config(&config),
        Commands::Debts { phone } => debts::run_debts(&config, &phone).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

//! Knit Machine CLI
//!
//! Command-line interface for the knitting machine state simulator.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use knit_machine::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Knit Machine v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Knit Machine v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Info { machine } => {
            commands::info(machine.as_deref()).context("failed to describe machine")
        }
        Commands::Run { program, machine } => commands::run(&program, machine.as_deref())
            .with_context(|| format!("failed to run {}", program.display())),
    }
}

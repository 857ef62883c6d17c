//! CLI Module
//!
//! Command-line interface for the knitting machine simulator.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Knit Machine - V-bed knitting machine state simulator
#[derive(Parser, Debug)]
#[command(name = "knit-machine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the machine specification and sheet sizes per gauge
    #[command(name = "info")]
    Info {
        /// Machine specification (JSON); defaults are used if omitted
        #[arg(short, long)]
        machine: Option<PathBuf>,
    },

    /// Replay a program and print its knitout
    #[command(name = "run")]
    Run {
        /// Program file (JSON)
        program: PathBuf,

        /// Machine specification (JSON); overrides the program's own
        #[arg(short, long)]
        machine: Option<PathBuf>,
    },
}

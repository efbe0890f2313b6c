//! # Recipe Config CLI
//!
//! This is the binary entry point for the `recipe-config` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Reporting errors, with their context chain, on failure.
//!
//! Resolution, caching and the dependency ledger all live in the
//! `recipe_config` library; the binary is a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}

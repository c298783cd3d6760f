//! # Overlay SVM CLI
//!
//! This is the binary entry point for the `overlay-svm` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Reporting failures with a non-zero exit status.
//!
//! Overlay handling lives in the `overlay_svm` library crate; the binary only
//! resolves arguments and prints results.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}

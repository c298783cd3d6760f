//! # Ls Command Implementation
//!
//! This module implements the `ls` subcommand, which lists every overlay
//! known to the device: enabled overlays in the boot directory and stashed
//! overlays in the staging directory, grouped by name.
//!
//! This command is a safe, read-only operation that never remounts the boot
//! partition.

use anyhow::Result;
use clap::Args;

use overlay_svm::output::format_entry;

use crate::cli::GlobalArgs;

/// List enabled and stashed overlays
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Print the manifest as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs, global: &GlobalArgs) -> Result<()> {
    let manager = global.manager()?;
    let manifest = manager.manifest();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    if manifest.is_empty() {
        println!("No overlays found.");
        return Ok(());
    }

    let output = global.output();
    for (name, entry) in manifest.iter() {
        println!("{}", format_entry(&output, name, entry));
    }
    Ok(())
}

//! # Enable Command Implementation
//!
//! This module implements the `enable` subcommand, which copies an overlay
//! into the boot directory. If another version of the same overlay is
//! enabled it is replaced, and the replaced version is kept in the staging
//! directory.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use overlay_svm::output::symbol;

use crate::cli::{resolve_overlay, GlobalArgs};

/// Enable an overlay
#[derive(Args, Debug)]
pub struct EnableArgs {
    /// Overlay image path, or a filename in the staging or boot directory
    #[arg(value_name = "OVERLAY")]
    pub overlay: PathBuf,
}

/// Execute the `enable` command.
pub fn execute(args: EnableArgs, global: &GlobalArgs) -> Result<()> {
    let manager = global.manager()?;
    let overlay = resolve_overlay(manager.config(), &args.overlay)?;

    let replaced = manager.find_enabled_relative(&overlay);
    if !manager.enable(&overlay)? {
        println!("{} is already enabled", overlay);
        return Ok(());
    }

    let output = global.output();
    match replaced {
        Some(previous) => println!(
            "{} Enabled {} (replaced {})",
            symbol(&output, "✅", "[OK]"),
            overlay,
            previous.version()
        ),
        None => println!("{} Enabled {}", symbol(&output, "✅", "[OK]"), overlay),
    }
    Ok(())
}

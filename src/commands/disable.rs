//! # Disable Command Implementation
//!
//! This module implements the `disable` subcommand, which moves an enabled
//! overlay from the boot directory into the staging directory.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use overlay_svm::output::symbol;

use crate::cli::{resolve_overlay, GlobalArgs};

/// Disable an overlay
#[derive(Args, Debug)]
pub struct DisableArgs {
    /// Overlay image path, or a filename in the staging or boot directory
    #[arg(value_name = "OVERLAY")]
    pub overlay: PathBuf,
}

/// Execute the `disable` command.
pub fn execute(args: DisableArgs, global: &GlobalArgs) -> Result<()> {
    let manager = global.manager()?;
    let overlay = resolve_overlay(manager.config(), &args.overlay)?;

    if !manager.disable(&overlay)? {
        println!("{} is not enabled", overlay);
        return Ok(());
    }

    println!(
        "{} Disabled {}",
        symbol(&global.output(), "✅", "[OK]"),
        overlay
    );
    Ok(())
}

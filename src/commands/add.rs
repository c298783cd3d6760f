//! # Add Command Implementation
//!
//! This module implements the `add` subcommand, which copies an overlay
//! image into the staging directory so it can be enabled later.
//!
//! The image must already carry a canonical overlay filename; it is not
//! renamed or inspected.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use overlay_svm::output::symbol;
use overlay_svm::overlay::Overlay;

use crate::cli::GlobalArgs;

/// Copy an overlay image into the staging directory
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Path to an `overlay-<name>-<version>.sqfs` image
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Enable the overlay after adding it
    #[arg(long)]
    pub enable: bool,
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, global: &GlobalArgs) -> Result<()> {
    let manager = global.manager()?;
    let overlay = Overlay::from_path(&args.file)?;
    if !overlay.path().is_file() {
        anyhow::bail!("Overlay image not found: {}", overlay.path().display());
    }

    let staged = manager.stash(&overlay)?;
    let output = global.output();
    println!(
        "{} Added {} to {}",
        symbol(&output, "✅", "[OK]"),
        staged,
        manager.config().stash_dir.display()
    );

    if args.enable {
        if manager.enable(&staged)? {
            println!("{} Enabled {}", symbol(&output, "✅", "[OK]"), staged);
        } else {
            println!("{} is already enabled", staged);
        }
    }
    Ok(())
}

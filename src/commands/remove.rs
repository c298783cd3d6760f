//! # Remove Command Implementation
//!
//! This module implements the `remove` subcommand, which disables an overlay
//! if needed and deletes it from the staging directory. The image is gone
//! from the device afterwards, so the command asks for confirmation unless
//! `--yes` is given.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::PathBuf;

use overlay_svm::output::symbol;

use crate::cli::{resolve_overlay, GlobalArgs};

/// Remove an overlay from the device
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Overlay image path, or a filename in the staging or boot directory
    #[arg(value_name = "OVERLAY")]
    pub overlay: PathBuf,

    /// Non-interactive mode: remove without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the `remove` command.
pub fn execute(args: RemoveArgs, global: &GlobalArgs) -> Result<()> {
    let manager = global.manager()?;
    let overlay = resolve_overlay(manager.config(), &args.overlay)?;

    if !args.yes {
        let theme = ColorfulTheme::default();
        let confirmed = Confirm::with_theme(&theme)
            .with_prompt(format!("Remove {} from this device?", overlay))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    manager.remove(&overlay)?;
    println!(
        "{} Removed {}",
        symbol(&global.output(), "✅", "[OK]"),
        overlay
    );
    Ok(())
}

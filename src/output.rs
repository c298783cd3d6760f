//! # Output Configuration
//!
//! This module controls how the CLI renders overlay listings: whether color
//! and symbols are used, and how a manifest entry is formatted.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use overlay_svm::output::{OutputConfig, format_entry};
//!
//! let output = OutputConfig::from_env_and_flag("auto");
//! for (name, entry) in manager.manifest().iter() {
//!     println!("{}", format_entry(&output, name, entry));
//! }
//! ```

use std::env;

use console::style;

use crate::manager::ManifestEntry;

/// Output configuration for controlling colors and symbols.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and symbols should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns `fancy` when colors are enabled, `plain` otherwise.
pub fn symbol<'a>(config: &OutputConfig, fancy: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        fancy
    } else {
        plain
    }
}

/// Render one manifest line: the name followed by every known version.
///
/// The enabled version is marked with `*` and, when colors are on, shown in
/// green. A trailing note flags an available update.
pub fn format_entry(config: &OutputConfig, name: &str, entry: &ManifestEntry) -> String {
    let versions: Vec<String> = entry
        .versions()
        .iter()
        .map(|overlay| {
            let version = overlay.version().as_str();
            if Some(overlay.version()) != entry.enabled() {
                version.to_string()
            } else if config.use_color {
                format!("{}", style(format!("*{version}")).green().bold().force_styling(true))
            } else {
                format!("*{version}")
            }
        })
        .collect();

    let mut line = format!("{name}: {}", versions.join(" "));
    if entry.has_update() {
        line.push_str(&format!(" {} update available", symbol(config, "⬆", "(!)")));
    }
    line
}

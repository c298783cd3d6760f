//! CLI argument parsing and command dispatch

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use overlay_svm::config::{self, Config, DEFAULT_CONFIG_PATH};
use overlay_svm::manager::OverlayManager;
use overlay_svm::output::OutputConfig;
use overlay_svm::overlay::Overlay;

use crate::commands;

/// Overlay SVM - Manage squashfs overlays on the boot partition
#[derive(Parser, Debug)]
#[command(name = "overlay-svm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the configuration file
    #[arg(long, global = true, value_name = "FILE", env = "SVM_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Staging directory, overriding the configuration file
    #[arg(long, global = true, value_name = "DIR", env = "SVM_STASH_DIR")]
    pub stash_dir: Option<PathBuf>,

    /// Boot directory, overriding the configuration file
    #[arg(long, global = true, value_name = "DIR", env = "SVM_BOOT_DIR")]
    pub boot_dir: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List enabled and stashed overlays
    Ls(commands::ls::LsArgs),

    /// Enable an overlay, replacing any other enabled version
    Enable(commands::enable::EnableArgs),

    /// Disable an overlay, moving it to the staging directory
    Disable(commands::disable::DisableArgs),

    /// Remove an overlay from the device
    Remove(commands::remove::RemoveArgs),

    /// Copy an overlay image into the staging directory
    Add(commands::add::AddArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.global.log_level);
        let global = self.global;

        match self.command {
            Commands::Ls(args) => commands::ls::execute(args, &global),
            Commands::Enable(args) => commands::enable::execute(args, &global),
            Commands::Disable(args) => commands::disable::execute(args, &global),
            Commands::Remove(args) => commands::remove::execute(args, &global),
            Commands::Add(args) => commands::add::execute(args, &global),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running under a test harness.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

impl GlobalArgs {
    /// Load the configuration file and apply command-line overrides.
    ///
    /// A missing configuration file is tolerated when `--stash-dir` is
    /// given, in which case defaults fill in the rest.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match (self.config.exists(), &self.stash_dir) {
            (false, Some(stash_dir)) => Config::new(stash_dir),
            _ => config::from_file(&self.config).with_context(|| {
                format!("Failed to load config from {}", self.config.display())
            })?,
        };

        if let Some(stash_dir) = &self.stash_dir {
            config.stash_dir = stash_dir.clone();
        }
        if let Some(boot_dir) = &self.boot_dir {
            config.boot_dir = boot_dir.clone();
        }
        Ok(config)
    }

    pub fn manager(&self) -> Result<OverlayManager> {
        Ok(OverlayManager::new(self.load_config()?))
    }

    pub fn output(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }
}

/// Resolve an `<OVERLAY>` argument to an overlay.
///
/// A bare filename is looked up in the staging directory, then the boot
/// directory. Anything else is taken as a path.
pub fn resolve_overlay(config: &Config, arg: &Path) -> Result<Overlay> {
    let is_bare = arg.parent().is_none_or(|p| p.as_os_str().is_empty());
    let path = if is_bare {
        [&config.stash_dir, &config.boot_dir]
            .into_iter()
            .map(|dir| dir.join(arg))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| arg.to_path_buf())
    } else {
        arg.to_path_buf()
    };

    Ok(Overlay::from_path(path)?)
}

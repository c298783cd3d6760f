//! # Configuration
//!
//! This module defines the configuration consumed by the overlay manager and
//! the logic for loading it from YAML.
//!
//! The only value the embedding application must supply is the staging
//! directory (`stash_dir`). Everything else has a default matching a typical
//! device layout:
//!
//! ```yaml
//! stash_dir: /mnt/data/overlays
//! boot_dir: /boot              # default
//! mount_point: /boot           # default: boot_dir
//! mount:
//!   mount_command: /bin/mount  # default
//!   sync_command: /bin/sync    # default
//!   mounts_table: /proc/mounts # default
//! ```
//!
//! Paths are explicit fields rather than constants so tests can point the
//! manager at temporary directories.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file location used by the CLI.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/svm.yaml";

/// Overlay manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding overlays that are available but not enabled.
    pub stash_dir: PathBuf,
    /// Directory holding enabled overlays.
    #[serde(default = "default_boot_dir")]
    pub boot_dir: PathBuf,
    /// Mount point whose mode guards writes to `boot_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<PathBuf>,
    /// External commands and tables used by the mount controller.
    #[serde(default)]
    pub mount: MountConfig,
}

/// Mount controller settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    #[serde(default = "default_mount_command")]
    pub mount_command: PathBuf,
    #[serde(default = "default_sync_command")]
    pub sync_command: PathBuf,
    /// Mount table in `/proc/mounts` format.
    #[serde(default = "default_mounts_table")]
    pub mounts_table: PathBuf,
}

/// Get the default boot directory
///
/// # Examples
///
/// ```
/// use overlay_svm::config::default_boot_dir;
///
/// assert_eq!(default_boot_dir(), std::path::PathBuf::from("/boot"));
/// ```
pub fn default_boot_dir() -> PathBuf {
    PathBuf::from("/boot")
}

fn default_mount_command() -> PathBuf {
    PathBuf::from("/bin/mount")
}

fn default_sync_command() -> PathBuf {
    PathBuf::from("/bin/sync")
}

fn default_mounts_table() -> PathBuf {
    PathBuf::from("/proc/mounts")
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            mount_command: default_mount_command(),
            sync_command: default_sync_command(),
            mounts_table: default_mounts_table(),
        }
    }
}

impl Config {
    /// Configuration with the given staging directory and all defaults.
    pub fn new(stash_dir: impl Into<PathBuf>) -> Self {
        Self {
            stash_dir: stash_dir.into(),
            boot_dir: default_boot_dir(),
            mount_point: None,
            mount: MountConfig::default(),
        }
    }

    /// Replace the boot directory.
    pub fn with_boot_dir(mut self, boot_dir: impl Into<PathBuf>) -> Self {
        self.boot_dir = boot_dir.into();
        self
    }

    /// The path whose mount mode is queried and changed.
    pub fn mount_point(&self) -> &Path {
        self.mount_point.as_deref().unwrap_or(self.boot_dir.as_path())
    }

    fn validate(self) -> Result<Self> {
        if self.stash_dir.as_os_str().is_empty() {
            return Err(Error::ConfigParse {
                message: "stash_dir must not be empty".to_string(),
                hint: Some("Set 'stash_dir:' to the overlay staging directory".to_string()),
            });
        }
        if self.boot_dir.as_os_str().is_empty() {
            return Err(Error::ConfigParse {
                message: "boot_dir must not be empty".to_string(),
                hint: Some("Remove 'boot_dir:' to use the default /boot".to_string()),
            });
        }
        Ok(self)
    }
}

/// Parses a YAML string into a `Config`.
pub fn parse(yaml_content: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: if e.to_string().contains("stash_dir") {
            Some("'stash_dir:' is required".to_string())
        } else {
            None
        },
    })?;
    config.validate()
}

/// Parse a `Config` from a YAML file path
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

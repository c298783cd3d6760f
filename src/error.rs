//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! overlay manager. It uses the `thiserror` library to create an `Error`
//! enum that covers every anticipated failure mode, with descriptive
//! messages suitable for showing to an operator.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors.
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Callers of the lifecycle operations (`enable`, `disable`, `remove`) only
//! ever see [`Error::Operational`]: every lower-level failure, including an
//! indeterminable mount mode, is folded into it with the failing phase named.
//! Constructing an overlay from a badly named file yields
//! [`Error::InvalidFilename`].

use std::path::Path;

use thiserror::Error;

/// Main error type for overlay management
#[derive(Error, Debug)]
pub enum Error {
    /// The overlay path does not follow `overlay-<name>-<version>.sqfs`.
    #[error("Invalid overlay filename: {path}")]
    InvalidFilename { path: String },

    /// A version token could not be parsed.
    #[error("Invalid version: {version}")]
    InvalidVersion { version: String },

    /// The path was not found among the current mounts.
    #[error("Unable to determine mount mode of '{path}'")]
    IndeterminableMountMode { path: String },

    /// An enable, disable, remove or stash operation failed.
    ///
    /// `phase` names the step that failed (for example `remount` or
    /// `enable`), `message` carries the underlying cause.
    #[error("Overlay operation failed during {phase}: {message}")]
    Operational { phase: String, message: String },

    /// An error occurred while parsing the configuration file.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    pub(crate) fn invalid_filename(path: &Path) -> Self {
        Error::InvalidFilename {
            path: path.display().to_string(),
        }
    }

    /// Wrap any displayable cause as an [`Error::Operational`] for `phase`.
    pub(crate) fn operational(phase: &str, cause: impl std::fmt::Display) -> Self {
        Error::Operational {
            phase: phase.to_string(),
            message: cause.to_string(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

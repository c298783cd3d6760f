//! Overlay identity: name and version parsed from a canonical filename.
//!
//! An overlay image is named `overlay-<name>-<version>.sqfs`, where `<name>`
//! is alphanumeric and `<version>` starts with a digit followed by
//! characters from `[0-9a-z.]`. An [`Overlay`] is a value object over such a
//! path; the file itself may or may not exist.

use std::cmp::Ordering;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::version::Version;

/// Pattern an overlay filename must match, anchored at both ends.
pub const FILENAME_PATTERN: &str = r"^overlay-([A-Za-z0-9]+)-([0-9][.0-9a-z]*)\.sqfs$";

/// Glob used to discover overlays inside a directory.
pub const FILENAME_GLOB: &str = "overlay-*.sqfs";

/// Suffix of the temporary copy made while replacing an enabled overlay.
pub const NEW_EXT: &str = ".new";

/// Suffix given to the previously enabled overlay while it is being replaced.
pub const BACKUP_EXT: &str = ".backup";

/// A single overlay image, identified by `(name, version)`.
///
/// Two overlays are equal when name and version are equal, regardless of
/// where their files live. Ordering is only meaningful inside one family:
/// `partial_cmp` returns `None` for different names, so both `<` and `>`
/// are `false` there.
#[derive(Debug, Clone, Serialize)]
pub struct Overlay {
    path: PathBuf,
    filename: String,
    name: String,
    version: Version,
}

impl Overlay {
    /// Build an overlay from its path by parsing the filename.
    ///
    /// Fails with [`Error::InvalidFilename`] when the basename does not match
    /// [`FILENAME_PATTERN`] or the version token cannot be parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::invalid_filename(path))?;

        let re = Regex::new(FILENAME_PATTERN)?;
        let caps = re
            .captures(filename)
            .ok_or_else(|| Error::invalid_filename(path))?;
        let version = Version::parse(&caps[2]).map_err(|_| Error::invalid_filename(path))?;

        Ok(Self {
            path: path.to_path_buf(),
            filename: filename.to_string(),
            name: caps[1].to_string(),
            version,
        })
    }

    /// Full path this overlay was constructed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Basename of [`Overlay::path`].
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Whether `other` is present and has the same name and version.
    pub fn equals(&self, other: Option<&Overlay>) -> bool {
        other.is_some_and(|other| self == other)
    }

    /// Whether `other` is present, shares the name, and has a higher version.
    pub fn is_less_than(&self, other: Option<&Overlay>) -> bool {
        other.is_some_and(|other| self < other)
    }

    /// Whether `other` is present, shares the name, and has a lower version.
    pub fn is_greater_than(&self, other: Option<&Overlay>) -> bool {
        other.is_some_and(|other| self > other)
    }

    /// Whether `other` belongs to the same overlay family.
    pub fn is_relative_of(&self, other: &Overlay) -> bool {
        self.name == other.name
    }

    /// Whether the overlay's path lies inside `dir`.
    pub fn is_within(&self, dir: &Path) -> bool {
        self.path.starts_with(dir)
    }
}

/// Append `suffix` to the final component of `path`.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

impl PartialEq for Overlay {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for Overlay {}

impl PartialOrd for Overlay {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.name == other.name {
            Some(self.version.cmp(&other.version))
        } else {
            None
        }
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

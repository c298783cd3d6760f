//! # Overlay Lifecycle Manager
//!
//! This module ties overlay identity and the mount controller together. It
//! discovers overlays in the boot and staging directories, builds the
//! [`Manifest`] shown to users, and performs the three mutating operations:
//!
//! ```text
//! Stashed --enable()--> Enabled
//! Enabled --disable()--> Stashed
//! Enabled/Stashed --remove()--> (deleted)
//! ```
//!
//! ## Safety of mutations
//!
//! Every write to the boot directory happens while a
//! [`RemountGuard`](crate::mount::RemountGuard) is held, so the boot
//! partition is writable for the duration and returned to its original mode
//! afterwards, whatever the outcome.
//!
//! Replacing an enabled version with another one goes through a temporary
//! `.new` copy and a `.backup` of the old file, in an order that never leaves
//! the boot directory without either the old or the new image for that name.
//!
//! Callers must serialize access: nothing here protects against two
//! mutations running concurrently.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::mount::{MountOperations, RemountGuard, SystemMountOperations};
use crate::overlay::{with_suffix, Overlay, BACKUP_EXT, FILENAME_GLOB, NEW_EXT};
use crate::version::Version;

/// All versions known for one overlay name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestEntry {
    versions: Vec<Overlay>,
    enabled: Option<Version>,
}

impl ManifestEntry {
    /// Known versions, ascending, one per distinct version.
    pub fn versions(&self) -> &[Overlay] {
        &self.versions
    }

    /// Version currently present in the boot directory, if any.
    pub fn enabled(&self) -> Option<&Version> {
        self.enabled.as_ref()
    }

    pub fn enabled_overlay(&self) -> Option<&Overlay> {
        let enabled = self.enabled.as_ref()?;
        self.versions.iter().find(|o| o.version() == enabled)
    }

    /// Highest known version.
    pub fn latest(&self) -> Option<&Overlay> {
        self.versions.last()
    }

    /// Whether a version newer than the enabled one is available.
    pub fn has_update(&self) -> bool {
        match (&self.enabled, self.latest()) {
            (Some(enabled), Some(latest)) => latest.version() > enabled,
            _ => false,
        }
    }

    fn insert(&mut self, overlay: Overlay) {
        if self.versions.contains(&overlay) {
            return;
        }
        let idx = self
            .versions
            .partition_point(|o| o.version() < overlay.version());
        self.versions.insert(idx, overlay);
    }
}

/// Unified view of enabled and stashed overlays, keyed by name.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Build a manifest from enabled and stashed overlays.
    ///
    /// When the same version appears in both, the enabled copy is kept.
    pub fn build(
        enabled: impl IntoIterator<Item = Overlay>,
        stashed: impl IntoIterator<Item = Overlay>,
    ) -> Self {
        let mut manifest = Self::default();
        for overlay in enabled {
            let entry = manifest.entries.entry(overlay.name().to_string()).or_default();
            entry.enabled = entry.enabled.take().max(Some(overlay.version().clone()));
            entry.insert(overlay);
        }
        for overlay in stashed {
            manifest
                .entries
                .entry(overlay.name().to_string())
                .or_default()
                .insert(overlay);
        }
        manifest
    }

    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.get(name)
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Find overlays in `dir`.
///
/// Each call rescans the directory. Files that match the overlay glob but
/// not the canonical filename pattern are skipped with a warning, so one
/// stray file cannot hide every other overlay.
pub fn scan(dir: &Path) -> impl Iterator<Item = Overlay> {
    let pattern = format!(
        "{}/{}",
        Pattern::escape(&dir.to_string_lossy()),
        FILENAME_GLOB
    );
    let paths = match glob::glob(&pattern) {
        Ok(paths) => Some(paths),
        Err(e) => {
            warn!("SVM: invalid scan pattern '{}': {}", pattern, e);
            None
        }
    };

    paths
        .into_iter()
        .flatten()
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => match Overlay::from_path(&path) {
                Ok(overlay) => Some(overlay),
                Err(e) => {
                    warn!("SVM: skipping '{}': {}", path.display(), e);
                    None
                }
            },
            Ok(path) => {
                debug!("SVM: ignoring non-file '{}'", path.display());
                None
            }
            Err(e) => {
                warn!("SVM: cannot read '{}': {}", e.path().display(), e.error());
                None
            }
        })
}

/// Move a file, falling back to copy and delete across filesystems.
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(source, target)?;
            fs::remove_file(source)
        }
        other => other,
    }
}

/// Whether both paths resolve to the same existing file.
///
/// Follows symlinks and sees through relative, `..` and hard-linked
/// spellings. Missing paths are never the same file.
#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Best-effort removal of a leftover temporary file.
fn discard(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("SVM: could not remove '{}': {}", path.display(), e);
        }
    }
}

/// The entry point for managing overlays on a device.
pub struct OverlayManager {
    config: Config,
    mount_ops: Box<dyn MountOperations>,
}

impl OverlayManager {
    /// Creates a manager that uses the system mount table and commands
    /// named in `config`.
    pub fn new(config: Config) -> Self {
        let mount_ops = Box::new(SystemMountOperations::new(&config.mount));
        Self { config, mount_ops }
    }

    /// Creates a manager with a custom `MountOperations` implementation.
    pub fn with_operations(config: Config, mount_ops: Box<dyn MountOperations>) -> Self {
        Self { config, mount_ops }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Overlays currently in the boot directory.
    pub fn enabled(&self) -> impl Iterator<Item = Overlay> {
        scan(&self.config.boot_dir)
    }

    /// Overlays in the staging directory.
    pub fn stashed(&self) -> impl Iterator<Item = Overlay> {
        scan(&self.config.stash_dir)
    }

    /// Fresh manifest of enabled and stashed overlays.
    pub fn manifest(&self) -> Manifest {
        Manifest::build(self.enabled(), self.stashed())
    }

    /// Enabled overlay with the same name as `overlay`, whatever its version.
    pub fn find_enabled_relative(&self, overlay: &Overlay) -> Option<Overlay> {
        self.enabled().find(|o| o.is_relative_of(overlay))
    }

    /// Whether `overlay` lives in the boot directory, or an equal overlay
    /// (same name and version) does.
    pub fn is_enabled(&self, overlay: &Overlay) -> bool {
        overlay.is_within(&self.config.boot_dir) || self.enabled().any(|o| o == *overlay)
    }

    /// Copy `overlay` into the boot directory, replacing any other enabled
    /// version of it.
    ///
    /// Returns `false` without touching anything if the overlay is already
    /// enabled.
    pub fn enable(&self, overlay: &Overlay) -> Result<bool> {
        if self.is_enabled(overlay) {
            debug!("SVM: {} is already enabled", overlay);
            return Ok(false);
        }

        let _guard = RemountGuard::acquire(self.mount_ops.as_ref(), self.config.mount_point())?;
        self.install(overlay).map_err(|e| {
            error!("SVM: enabling {} failed: {}", overlay, e);
            Error::operational("enable", e)
        })?;
        info!("SVM: enabled {}", overlay);
        Ok(true)
    }

    /// Move `overlay` out of the boot directory into the staging directory.
    ///
    /// Returns `false` without touching anything if the overlay is not
    /// enabled.
    pub fn disable(&self, overlay: &Overlay) -> Result<bool> {
        if !self.is_enabled(overlay) {
            debug!("SVM: {} is not enabled", overlay);
            return Ok(false);
        }

        let installed = if overlay.is_within(&self.config.boot_dir) {
            overlay.clone()
        } else {
            self.enabled()
                .find(|o| o == overlay)
                .unwrap_or_else(|| overlay.clone())
        };

        let _guard = RemountGuard::acquire(self.mount_ops.as_ref(), self.config.mount_point())?;
        self.uninstall(&installed).map_err(|e| {
            error!("SVM: disabling {} failed: {}", overlay, e);
            Error::operational("disable", e)
        })?;
        info!("SVM: disabled {}", overlay);
        Ok(true)
    }

    /// Disable `overlay` if needed, then delete it from the staging directory.
    pub fn remove(&self, overlay: &Overlay) -> Result<()> {
        self.disable(overlay)?;

        for stashed in self.stashed().filter(|o| o == overlay) {
            fs::remove_file(stashed.path()).map_err(|e| {
                error!("SVM: removing '{}' failed: {}", stashed.path().display(), e);
                Error::operational("remove", e)
            })?;
        }
        info!("SVM: removed {}", overlay);
        Ok(())
    }

    /// Copy an overlay image into the staging directory.
    ///
    /// Returns the staged overlay. Does nothing if `overlay` already is the
    /// staged file, however its path is spelled.
    pub fn stash(&self, overlay: &Overlay) -> Result<Overlay> {
        let target = self.config.stash_dir.join(overlay.filename());
        if overlay.path() == target || is_same_file(overlay.path(), &target) {
            debug!("SVM: {} is already stashed", overlay);
            return Overlay::from_path(&target);
        }

        fs::create_dir_all(&self.config.stash_dir)
            .and_then(|_| fs::copy(overlay.path(), &target))
            .map_err(|e| {
                error!("SVM: stashing {} failed: {}", overlay, e);
                Error::operational("stash", e)
            })?;
        info!("SVM: stashed {}", overlay);
        Overlay::from_path(&target)
    }

    fn install(&self, overlay: &Overlay) -> Result<()> {
        let dest = self.config.boot_dir.join(overlay.filename());
        match self.find_enabled_relative(overlay) {
            Some(existing) => self.replace(overlay, &existing, &dest)?,
            None => {
                if let Err(e) = fs::copy(overlay.path(), &dest) {
                    discard(&dest);
                    return Err(e.into());
                }
            }
        }
        self.flush();
        Ok(())
    }

    /// Swap `existing` for `overlay` at `dest`.
    ///
    /// Order: copy to `<dest>.new`, move `existing` to `.backup`, move
    /// `.new` into place, retire the backup. A failure at any step leaves the
    /// old image or its backup in place and undoes what it can.
    fn replace(&self, overlay: &Overlay, existing: &Overlay, dest: &Path) -> Result<()> {
        let staged = with_suffix(dest, NEW_EXT);
        let backup = with_suffix(existing.path(), BACKUP_EXT);

        if let Err(e) = fs::copy(overlay.path(), &staged) {
            discard(&staged);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(existing.path(), &backup) {
            discard(&staged);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&staged, dest) {
            if let Err(restore) = fs::rename(&backup, existing.path()) {
                error!(
                    "SVM: could not restore '{}' from '{}': {}",
                    existing.path().display(),
                    backup.display(),
                    restore
                );
            }
            discard(&staged);
            return Err(e.into());
        }

        self.retire_backup(existing, &backup);
        Ok(())
    }

    /// Keep the replaced version available in the staging directory, or
    /// delete the backup if it already is.
    fn retire_backup(&self, existing: &Overlay, backup: &Path) {
        let stashed = self.config.stash_dir.join(existing.filename());
        let result = if stashed.exists() {
            fs::remove_file(backup)
        } else {
            fs::create_dir_all(&self.config.stash_dir).and_then(|_| move_file(backup, &stashed))
        };
        if let Err(e) = result {
            warn!("SVM: leaving '{}' behind: {}", backup.display(), e);
        }
    }

    fn uninstall(&self, installed: &Overlay) -> Result<()> {
        let target: PathBuf = self.config.stash_dir.join(installed.filename());
        fs::create_dir_all(&self.config.stash_dir)?;
        move_file(installed.path(), &target)?;
        self.flush();
        Ok(())
    }

    /// Sync failures are not fatal: the copy or move already completed.
    fn flush(&self) {
        if !self.mount_ops.sync() {
            warn!("SVM: sync failed, changes may not be on disk yet");
        }
    }
}

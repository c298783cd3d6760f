//! # Mount Controller
//!
//! Queries and changes the mount mode of the boot partition.
//!
//! The boot partition is normally mounted read-only. Every mutation of the
//! boot directory is bracketed by a [`RemountGuard`], which switches the
//! mount to read-write when needed and puts it back to read-only when the
//! guard is dropped, on every exit path.
//!
//! ## Design
//!
//! Mount access goes through the [`MountOperations`] trait so the lifecycle
//! manager can be exercised against temporary directories. The production
//! implementation, [`SystemMountOperations`], reads the kernel mount table
//! and shells out to `mount` and `sync`. Remount and sync failures are
//! logged and reported as `false` rather than propagated; callers decide
//! whether a failure is fatal.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, error, warn};

use crate::config::MountConfig;
use crate::error::{Error, Result};

/// Mount mode of a mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountMode {
    ReadOnly,
    ReadWrite,
}

impl MountMode {
    /// The mount option spelling (`ro` / `rw`).
    pub fn as_option(&self) -> &'static str {
        match self {
            MountMode::ReadOnly => "ro",
            MountMode::ReadWrite => "rw",
        }
    }
}

impl fmt::Display for MountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountMode::ReadOnly => f.write_str("read-only"),
            MountMode::ReadWrite => f.write_str("read-write"),
        }
    }
}

/// One line of a `/proc/mounts`-style table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_dir: PathBuf,
    pub fstype: String,
    pub options: Vec<String>,
}

impl MountEntry {
    /// Mount mode from the options list, if it names one.
    pub fn mode(&self) -> Option<MountMode> {
        if self.options.iter().any(|o| o == "rw") {
            Some(MountMode::ReadWrite)
        } else if self.options.iter().any(|o| o == "ro") {
            Some(MountMode::ReadOnly)
        } else {
            None
        }
    }
}

/// Parse a mount table in `/proc/mounts` format.
///
/// Malformed lines are skipped. Octal escapes used by the kernel for
/// whitespace and backslashes (`\040`, `\011`, `\012`, `\134`) are decoded in
/// the device and mount directory fields.
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_dir = fields.next()?;
            let fstype = fields.next()?;
            let options = fields.next()?;
            Some(MountEntry {
                device: unescape(device),
                mount_dir: PathBuf::from(unescape(mount_dir)),
                fstype: fstype.to_string(),
                options: options.split(',').map(str::to_string).collect(),
            })
        })
        .collect()
}

fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits.iter().fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(value) = u8::try_from(value) {
                    out.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Determine the mount mode of `path` from the contents of a mount table.
///
/// When `path` is mounted more than once the last entry wins, since it is
/// the one stacked on top. Fails with [`Error::IndeterminableMountMode`]
/// when `path` is absent or its options name neither `ro` nor `rw`.
pub fn mount_mode_from_table(table: &str, path: &Path) -> Result<MountMode> {
    parse_mounts(table)
        .iter()
        .rev()
        .filter(|entry| entry.mount_dir == path)
        .find_map(MountEntry::mode)
        .ok_or_else(|| Error::IndeterminableMountMode {
            path: path.display().to_string(),
        })
}

/// Read `mounts_table` and return the mount mode of `path`.
pub fn get_mount_mode(mounts_table: &Path, path: &Path) -> Result<MountMode> {
    let table = fs::read_to_string(mounts_table).map_err(|e| {
        warn!(
            "SVM: cannot read mount table '{}': {}",
            mounts_table.display(),
            e
        );
        Error::IndeterminableMountMode {
            path: path.display().to_string(),
        }
    })?;
    mount_mode_from_table(&table, path)
}

/// Remount `path` in `mode` by running `<mount_command> -o remount,<mode> <path>`.
///
/// Returns `true` on success. Failures are logged and reported as `false`.
pub fn remount(mount_command: &Path, path: &Path, mode: MountMode) -> bool {
    let option = format!("remount,{}", mode.as_option());
    debug!("SVM: remounting '{}' {}", path.display(), mode);
    run(Command::new(mount_command).args(["-o", &option]).arg(path))
        .map_err(|e| error!("SVM: '{}' remount failed: {}", path.display(), e))
        .is_ok()
}

/// Write any data buffered in memory out to disk.
///
/// Returns `true` on success. Failures are logged and reported as `false`.
pub fn sync(sync_command: &Path) -> bool {
    run(&mut Command::new(sync_command))
        .map_err(|e| error!("SVM: sync operation failed: {}", e))
        .is_ok()
}

fn run(command: &mut Command) -> std::result::Result<(), String> {
    let output = command.output().map_err(|e| e.to_string())?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("{} - {}", output.status, stderr.trim()))
    }
}

/// Trait for mount operations - allows mocking in tests
pub trait MountOperations: Send + Sync {
    /// Current mount mode of `path`.
    fn mount_mode(&self, path: &Path) -> Result<MountMode>;

    /// Remount `path` in `mode`; `false` on failure.
    fn remount(&self, path: &Path, mode: MountMode) -> bool;

    /// Flush buffered writes; `false` on failure.
    fn sync(&self) -> bool;
}

/// The default implementation of `MountOperations`, which reads the kernel
/// mount table and runs the system `mount` and `sync` commands.
#[derive(Debug, Clone)]
pub struct SystemMountOperations {
    mount_command: PathBuf,
    sync_command: PathBuf,
    mounts_table: PathBuf,
}

impl SystemMountOperations {
    pub fn new(config: &MountConfig) -> Self {
        Self {
            mount_command: config.mount_command.clone(),
            sync_command: config.sync_command.clone(),
            mounts_table: config.mounts_table.clone(),
        }
    }
}

impl MountOperations for SystemMountOperations {
    fn mount_mode(&self, path: &Path) -> Result<MountMode> {
        get_mount_mode(&self.mounts_table, path)
    }

    fn remount(&self, path: &Path, mode: MountMode) -> bool {
        remount(&self.mount_command, path, mode)
    }

    fn sync(&self) -> bool {
        sync(&self.sync_command)
    }
}

/// Keeps a mount point writable for as long as it is alive.
///
/// [`RemountGuard::acquire`] records the original mode and remounts
/// read-write if needed. Dropping the guard remounts read-only again if that
/// is how the mount was found. A failure to restore is logged, never raised,
/// so it cannot mask the outcome of the guarded operation.
pub struct RemountGuard<'a> {
    ops: &'a dyn MountOperations,
    path: &'a Path,
    original: MountMode,
}

impl<'a> RemountGuard<'a> {
    /// Make `path` writable.
    ///
    /// Fails with [`Error::Operational`] if the mount mode cannot be
    /// determined or the read-write remount fails.
    pub fn acquire(ops: &'a dyn MountOperations, path: &'a Path) -> Result<Self> {
        let original = ops.mount_mode(path).map_err(|e| {
            error!("SVM: {}", e);
            Error::operational("mount", e)
        })?;

        if original == MountMode::ReadOnly && !ops.remount(path, MountMode::ReadWrite) {
            error!("SVM: cannot remount '{}' in read-write mode", path.display());
            return Err(Error::operational(
                "remount",
                format!("Cannot remount '{}' in read-write mode", path.display()),
            ));
        }

        Ok(Self {
            ops,
            path,
            original,
        })
    }

    /// Mode the mount point was in before the guard was acquired.
    pub fn original_mode(&self) -> MountMode {
        self.original
    }
}

impl Drop for RemountGuard<'_> {
    fn drop(&mut self) {
        if self.original == MountMode::ReadOnly && !self.ops.remount(self.path, MountMode::ReadOnly)
        {
            error!(
                "SVM: failed to restore '{}' to read-only mode",
                self.path.display()
            );
        }
    }
}

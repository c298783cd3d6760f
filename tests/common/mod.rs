//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a fixture laying out a fake device: a boot
//! directory, a staging directory, a mount table and a configuration file
//! pointing at all of them.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_stashed("overlay-news-1.0.sqfs");
//!     fixture.command().arg("ls").assert().success();
//! }
//! ```

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
#[allow(unused_imports)]
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    pub use super::TestFixture;
}

/// A fake device rooted in a temporary directory.
///
/// The boot directory is listed in the fixture's mount table, read-write by
/// default so no remount is attempted. Syncing runs `true`; remounting runs
/// `false`, so any remount the CLI attempts fails.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a fixture whose boot directory is mounted read-write.
    pub fn new() -> Self {
        Self::with_boot_mode("rw")
    }

    /// Create a fixture whose boot directory is mounted read-only.
    #[allow(dead_code)]
    pub fn read_only() -> Self {
        Self::with_boot_mode("ro")
    }

    fn with_boot_mode(mode: &str) -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir.child("boot").create_dir_all().expect("Failed to create boot dir");
        temp_dir.child("stash").create_dir_all().expect("Failed to create stash dir");

        let fixture = Self { temp_dir };
        fixture
            .temp_dir
            .child("mounts")
            .write_str(&format!(
                "/dev/root / ext4 ro,relatime 0 0\n/dev/mmcblk0p1 {} vfat {},relatime 0 0\n",
                fixture.boot_dir().display(),
                mode
            ))
            .expect("Failed to write mount table");
        fixture
            .temp_dir
            .child("svm.yaml")
            .write_str(&format!(
                "stash_dir: {}\nboot_dir: {}\nmount:\n  mount_command: \"false\"\n  sync_command: \"true\"\n  mounts_table: {}\n",
                fixture.stash_dir().display(),
                fixture.boot_dir().display(),
                fixture.path().join("mounts").display()
            ))
            .expect("Failed to write config file");
        fixture
    }

    /// Put an overlay image into the staging directory.
    #[allow(dead_code)]
    pub fn with_stashed(self, filename: &str) -> Self {
        self.write_image("stash", filename);
        self
    }

    /// Put an overlay image into the boot directory.
    #[allow(dead_code)]
    pub fn with_enabled(self, filename: &str) -> Self {
        self.write_image("boot", filename);
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    fn write_image(&self, dir: &str, filename: &str) {
        self.temp_dir
            .child(dir)
            .child(filename)
            .write_str(&format!("squashfs {filename}"))
            .expect("Failed to write overlay image");
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn boot_dir(&self) -> PathBuf {
        self.path().join("boot")
    }

    pub fn stash_dir(&self) -> PathBuf {
        self.path().join("stash")
    }

    /// Get the path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.path().join("svm.yaml")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Sorted file names in the boot directory.
    #[allow(dead_code)]
    pub fn enabled(&self) -> Vec<String> {
        list(&self.boot_dir())
    }

    /// Sorted file names in the staging directory.
    #[allow(dead_code)]
    pub fn stashed(&self) -> Vec<String> {
        list(&self.stash_dir())
    }

    /// A CLI command pointed at this fixture's configuration.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("overlay-svm");
        cmd.current_dir(self.path())
            .env_remove("SVM_STASH_DIR")
            .env_remove("SVM_BOOT_DIR")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

//! # Overlay Software Version Manager
//!
//! This library manages squashfs overlay images on a device whose boot
//! partition is normally mounted read-only. It is used by the `overlay-svm`
//! command-line tool but can be embedded in any application that needs to
//! list, enable, disable or remove overlays.
//!
//! ## Quick Example
//!
//! ```no_run
//! use overlay_svm::config::Config;
//! use overlay_svm::manager::OverlayManager;
//! use overlay_svm::overlay::Overlay;
//!
//! let manager = OverlayManager::new(Config::new("/mnt/data/overlays"));
//!
//! for (name, entry) in manager.manifest().iter() {
//!     println!("{name}: enabled {:?}", entry.enabled().map(|v| v.as_str()));
//! }
//!
//! let overlay = Overlay::from_path("/mnt/data/overlays/overlay-news-1.1.sqfs").unwrap();
//! manager.enable(&overlay).unwrap();
//! ```
//!
//! ## Core Concepts
//!
//! - **Versions (`version`)**: Parsing and total ordering of version tokens
//!   such as `1.0`, `1.0rc1` or `2.1.post3`.
//! - **Overlays (`overlay`)**: Identity parsed from a filename of the form
//!   `overlay-<name>-<version>.sqfs`.
//! - **Mount control (`mount`)**: Querying and changing the mount mode of
//!   the boot partition, and flushing writes.
//! - **Lifecycle (`manager`)**: The manifest of enabled and stashed
//!   overlays, and the `enable`/`disable`/`remove` operations.
//! - **Configuration (`config`)**: Directory and command locations.
//!
//! An overlay is *enabled* when its image sits in the boot directory and
//! *stashed* when it sits in the staging directory. At most one version of
//! each name is expected to be enabled at a time.

pub mod config;
pub mod error;
pub mod manager;
pub mod mount;
pub mod output;
pub mod overlay;
pub mod version;

#[cfg(test)]
mod version_proptest;

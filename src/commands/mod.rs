//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `overlay-svm` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments, derived
//!   using `clap`.
//! - An `execute` function that takes the parsed `Args` and the global
//!   options, and calls into the `overlay_svm` library.

pub mod add;
pub mod completions;
pub mod disable;
pub mod enable;
pub mod ls;
pub mod remove;

//! # Overlay Version Parsing and Ordering
//!
//! Overlay filenames carry a version token such as `1.2.3`, `0.1.002b4` or
//! `1.0rc1`. This module turns that token into a [`Version`] with a total
//! order that follows the usual Python packaging conventions:
//!
//! - Release segments compare numerically, and trailing zero segments are
//!   insignificant (`1.0 == 1.0.0`, `0.1.002 == 0.1.2`).
//! - Pre-releases (`a`/`alpha`, `b`/`beta`, `c`/`rc`/`pre`/`preview`) sort
//!   before the final release with the same release segments, in that order,
//!   and their numeric suffix compares numerically (`b4 < b5 < rc1`).
//! - Post-releases (`post`, `rev`, `r`) sort after the final release.
//! - Development releases (`dev`) sort before whatever they are attached to.
//!
//! Tokens that use the permitted alphabet (`[0-9][0-9a-z.]*`) but do not fit
//! that grammar, such as `1.0foo`, are still accepted as *legacy* versions.
//! Legacy versions compare by their numeric and alphabetic runs and always
//! sort before every version that fits the grammar.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

const RELEASE_PATTERN: &str = r"^(?P<release>[0-9]+(?:\.[0-9]+)*)(?:\.?(?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)\.?(?P<pre_n>[0-9]+)?)?(?:\.?(?P<post_l>post|rev|r)\.?(?P<post_n>[0-9]+)?)?(?:\.?(?P<dev_l>dev)\.?(?P<dev_n>[0-9]+)?)?$";

/// Pre-release marker kinds, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PreKind {
    Alpha,
    Beta,
    Candidate,
}

impl PreKind {
    fn from_label(label: &str) -> Self {
        match label {
            "a" | "alpha" => PreKind::Alpha,
            "b" | "beta" => PreKind::Beta,
            _ => PreKind::Candidate,
        }
    }
}

/// Where a version sits relative to its final release.
///
/// A bare development release (`1.0dev1`) sorts before any pre-release of
/// the same release segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
    DevOnly,
    Pre(PreKind, Number),
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
    Dev(Number),
    Released,
}

/// A run of decimal digits of any length, compared by value.
///
/// Leading zeros are dropped, so zero is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Number(String);

impl Number {
    fn new(digits: &str) -> Self {
        Number(digits.trim_start_matches('0').to_string())
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Comparison key for versions that fit the release grammar. Field order
/// is comparison order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ReleaseKey {
    release: Vec<Number>,
    pre: PreKey,
    post: Option<Number>,
    dev: DevKey,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum LegacyPart {
    Dev,
    Word(String),
    Number(Number),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Key {
    Legacy(Vec<LegacyPart>),
    Release(ReleaseKey),
}

/// A parsed, totally ordered overlay version.
///
/// Equality follows the ordering, so `Version::parse("1.0")` equals
/// `Version::parse("1.0.0")` even though the original text differs.
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    key: Key,
}

impl Version {
    /// Parse a version token.
    ///
    /// Fails with [`Error::InvalidVersion`] if `text` does not start with a
    /// digit or contains characters outside `[0-9a-z.]`. Numeric runs may be
    /// of any length.
    pub fn parse(text: &str) -> Result<Self> {
        if !is_permitted(text) {
            return Err(invalid(text));
        }

        let re = Regex::new(RELEASE_PATTERN).map_err(|_| invalid(text))?;
        let key = match re.captures(text) {
            Some(caps) => {
                let number = |name: &str| -> Number {
                    caps.name(name)
                        .map(|m| Number::new(m.as_str()))
                        .unwrap_or_default()
                };

                let mut release: Vec<Number> =
                    caps["release"].split('.').map(Number::new).collect();
                while release.last().is_some_and(Number::is_zero) {
                    release.pop();
                }

                let pre = caps.name("pre_l").map(|m| PreKind::from_label(m.as_str()));
                let post = caps.name("post_l").map(|_| number("post_n"));
                let dev = match caps.name("dev_l") {
                    Some(_) => DevKey::Dev(number("dev_n")),
                    None => DevKey::Released,
                };
                let pre = match pre {
                    Some(kind) => PreKey::Pre(kind, number("pre_n")),
                    None if post.is_none() && dev != DevKey::Released => PreKey::DevOnly,
                    None => PreKey::Final,
                };

                Key::Release(ReleaseKey {
                    release,
                    pre,
                    post,
                    dev,
                })
            }
            None => Key::Legacy(legacy_key(text)),
        };

        Ok(Self {
            text: text.to_string(),
            key,
        })
    }

    /// The version token exactly as it appeared in the filename.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether this is a pre-release or development release.
    pub fn is_prerelease(&self) -> bool {
        match &self.key {
            Key::Release(key) => key.pre != PreKey::Final || key.dev != DevKey::Released,
            Key::Legacy(parts) => parts.iter().any(|part| match part {
                LegacyPart::Dev => true,
                LegacyPart::Word(word) => word.as_str() < "final",
                LegacyPart::Number(_) => false,
            }),
        }
    }

    /// Whether the token did not fit the release grammar.
    pub fn is_legacy(&self) -> bool {
        matches!(self.key, Key::Legacy(_))
    }
}

fn is_permitted(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_digit())
        && chars.all(|c| c.is_ascii_digit() || c.is_ascii_lowercase() || c == '.')
}

fn invalid(text: &str) -> Error {
    Error::InvalidVersion {
        version: text.to_string(),
    }
}

/// Build the comparison key for a token outside the release grammar.
///
/// The token is split into digit and letter runs (dots only separate).
/// `pre`, `preview` and `rc` are folded into `c`, `dev` sorts below
/// everything, and an implicit `final` word terminates the key. Trailing
/// zero numbers are dropped before each word so `1.0b` equals `1b`.
fn legacy_key(text: &str) -> Vec<LegacyPart> {
    let mut tokens: Vec<&str> = Vec::new();
    let mut start = None;
    for (idx, c) in text.char_indices() {
        match start {
            Some(s) => {
                let prev_digit = text[s..].starts_with(|p: char| p.is_ascii_digit());
                if c == '.' || c.is_ascii_digit() != prev_digit {
                    tokens.push(&text[s..idx]);
                    start = if c == '.' { None } else { Some(idx) };
                }
            }
            None if c != '.' => start = Some(idx),
            None => {}
        }
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }

    let mut parts = Vec::new();
    for token in tokens.into_iter().chain(std::iter::once("final")) {
        if token.starts_with(|c: char| c.is_ascii_digit()) {
            parts.push(LegacyPart::Number(Number::new(token)));
            continue;
        }
        let word = match token {
            "dev" => {
                parts.push(LegacyPart::Dev);
                continue;
            }
            "pre" | "preview" | "rc" => "c",
            other => other,
        };
        while matches!(parts.last(), Some(LegacyPart::Number(n)) if n.is_zero()) {
            parts.pop();
        }
        parts.push(LegacyPart::Word(word.to_string()));
    }
    parts
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

//! Build labels of the form `//package:name`.

use std::fmt;

use schemars::JsonSchema;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Identifies a rule as `"//package:name"` (e.g. `"//tools/base:common"`).
///
/// Wraps the label string used throughout the rule graph. Provides typed
/// accessors for the package and target components so callers never split
/// the string themselves. Ordering is plain lexicographic order of the label
/// text, which is the order roots are emitted in.
///
/// Serializes transparently as a plain string for JSON compatibility.
/// Deserialization goes through [`Label::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    /// Constructs a label from a package path and a target name.
    pub fn new(package: &str, name: &str) -> Self {
        Self(format!("//{package}:{name}"))
    }

    /// Parses a label, returning `None` if the syntax is invalid.
    ///
    /// Accepts `//pkg:name`, `//:name` (root package) and the shorthand
    /// `//pkg/sub`, which names the target after the last package segment.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("//")?;
        let (package, name) = match rest.split_once(':') {
            Some((package, name)) => (package, name),
            None => (rest, rest.rsplit('/').next()?),
        };
        if !valid_package(package) || !valid_name(name) {
            return None;
        }
        Some(Self::new(package, name))
    }

    /// Returns the package portion (between `//` and `:`).
    pub fn package(&self) -> &str {
        self.split().0
    }

    /// Returns the target name portion (after `:`).
    pub fn name(&self) -> &str {
        self.split().1
    }

    /// Returns the underlying string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split(&self) -> (&str, &str) {
        // Every constructor writes "//" and a ':' after the package.
        let rest = self.0.get(2..).unwrap_or_default();
        rest.split_once(':').unwrap_or((rest, ""))
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).ok_or_else(|| de::Error::custom(format_args!("invalid label `{text}`")))
    }
}

fn valid_package(package: &str) -> bool {
    if package.is_empty() {
        return true;
    }
    package.split('/').all(|segment| {
        !segment.is_empty()
            && segment.chars().all(|c| {
                c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+' | '@')
            })
    })
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && !name.ends_with('/')
        && name.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '_' | '-' | '.' | '+' | '/' | '@' | '#' | '=' | ',' | '~')
        })
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Label {
    /// Enables `HashMap<Label, _>::get("//pkg:name")` lookups.
    fn borrow(&self) -> &str {
        &self.0
    }
}

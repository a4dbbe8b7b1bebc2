//! Mount eligibility rules over request metadata

use crate::error::VersionParseError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Metadata field carrying the client's dotted version string.
pub const VERSION_FIELD: &str = "version";

/// Dotted integer version, compared component-wise like a tuple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(Vec<u32>);

impl Version {
    pub fn new(components: Vec<u32>) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// True when this version's leading components equal `prefix` exactly.
    pub fn starts_with(&self, prefix: &Version) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionParseError(s.to_string()));
        }
        trimmed
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(VersionParseError(s.to_string()));
                }
                part.parse::<u32>()
                    .map_err(|_| VersionParseError(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Key/value metadata declared by the client alongside its file list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    fields: HashMap<String, String>,
}

impl RequestMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata carrying only a version string.
    pub fn with_version(version: impl Into<String>) -> Self {
        let mut metadata = Self::new();
        metadata.insert(VERSION_FIELD, version);
        metadata
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Raw version string, if declared.
    pub fn version_str(&self) -> Option<&str> {
        self.get(VERSION_FIELD)
    }

    /// Parsed version; `None` when missing or malformed.
    pub fn version(&self) -> Option<Version> {
        self.version_str()?.parse().ok()
    }
}

/// Whether a mount may serve a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Eligibility {
    /// Serves every request
    #[default]
    Always,
    /// Serves clients whose version starts with the given components
    VersionPrefix(Version),
}

impl Eligibility {
    pub fn is_eligible(&self, metadata: &RequestMetadata) -> bool {
        match self {
            Eligibility::Always => true,
            Eligibility::VersionPrefix(required) => metadata
                .version()
                .map(|version| version.starts_with(required))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::Always => write!(f, "always"),
            Eligibility::VersionPrefix(version) => write!(f, "version {}.*", version),
        }
    }
}

//! Change-set computation
//!
//! A client submits its gamedata files as flat form fields:
//!
//! ```text
//! version=1.10.0
//! files=2
//! file_0_name=gamedata/core.games.txt
//! file_0_md5=<hex md5>
//! file_1_name=gamedata/sdktools.games/game.tf.txt
//! file_1_md5=<hex md5>
//! ```
//!
//! The resolver answers with the files whose authoritative copy differs,
//! keyed by path without the gamedata prefix.

use crate::error::RequestError;
use crate::mount::eligibility::VERSION_FIELD;
use crate::mount::{path, Hash, MountRegistry, RequestMetadata};
use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Flat field mapping decoded from a request body.
pub type RequestFields = HashMap<String, String>;

/// Namespace every submitted path must start with.
pub const DEFAULT_GAMEDATA_PREFIX: &str = "gamedata/";

/// Field holding the declared number of submitted files.
pub const FILE_COUNT_FIELD: &str = "files";

/// Characters escaped in a location path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// One file as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedFile {
    /// Path including the gamedata prefix
    pub path: String,
    /// Client-side hash, possibly empty
    pub hash: String,
}

impl SubmittedFile {
    pub fn new(path: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hash: hash.into(),
        }
    }
}

/// A file the client should update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    /// Posix path without the gamedata prefix
    pub path: String,
    /// Authoritative hash of the server copy
    pub hash: Hash,
    /// URL-safe path the client fetches the file from
    pub location: String,
}

/// Changed files keyed by canonical path, in submission order.
pub type ChangeSet = IndexMap<String, ChangeEntry>;

/// A decoded diff request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffRequest {
    pub metadata: RequestMetadata,
    pub files: Vec<SubmittedFile>,
}

impl DiffRequest {
    /// Decode the request from its form fields.
    ///
    /// `version` and `files` are required and `files` must be a non-negative
    /// integer. Indices in `[0, files)` missing either their name or hash field
    /// are skipped. Files come back ordered by index.
    pub fn from_fields(fields: &RequestFields) -> Result<Self, RequestError> {
        if fields.is_empty() {
            return Err(RequestError::Malformed);
        }
        let declared: u64 = fields
            .get(FILE_COUNT_FIELD)
            .and_then(|count| count.trim().parse().ok())
            .ok_or(RequestError::Malformed)?;
        if !fields.contains_key(VERSION_FIELD) {
            return Err(RequestError::Malformed);
        }

        let mut metadata = RequestMetadata::new();
        // Walk the submitted keys rather than 0..declared so a huge count
        // costs nothing beyond the fields actually present.
        let mut names = BTreeMap::new();
        for (key, value) in fields {
            match file_field_index(key, "_name") {
                Some(index) if index < declared => {
                    names.insert(index, value);
                }
                Some(_) => {}
                None if file_field_index(key, "_md5").is_none() => {
                    metadata.insert(key.clone(), value.clone());
                }
                None => {}
            }
        }

        let files = names
            .into_iter()
            .filter_map(|(index, name)| {
                let hash = fields.get(&format!("file_{}_md5", index))?;
                Some(SubmittedFile::new(name.clone(), hash.clone()))
            })
            .collect();

        Ok(Self { metadata, files })
    }
}

/// Parse `file_<n><suffix>` into `n`.
///
/// Only the canonical decimal spelling matches, so `file_01_name` never
/// shadows `file_1_name`.
fn file_field_index(key: &str, suffix: &str) -> Option<u64> {
    let digits = key.strip_prefix("file_")?.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: u64 = digits.parse().ok()?;
    (index.to_string() == digits).then_some(index)
}

/// Computes change-sets against the mount registry.
#[derive(Debug, Clone)]
pub struct DiffResolver {
    registry: Arc<MountRegistry>,
    prefix: String,
}

impl DiffResolver {
    pub fn new(registry: Arc<MountRegistry>) -> Self {
        Self::with_prefix(registry, DEFAULT_GAMEDATA_PREFIX)
    }

    pub fn with_prefix(registry: Arc<MountRegistry>, prefix: impl Into<String>) -> Self {
        Self {
            registry,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Canonical lookup path for a submitted path, or `None` when the path is
    /// outside the gamedata prefix or not a plain relative path.
    pub fn canonical_path(&self, submitted: &str) -> Option<String> {
        let stripped = submitted.strip_prefix(self.prefix.as_str())?;
        path::normalize_relative(stripped)
    }

    /// Files whose server copy differs from what the client submitted.
    ///
    /// Files outside the prefix, with an empty submitted hash, or held by no
    /// eligible mount are left out.
    pub fn resolve(&self, metadata: &RequestMetadata, files: &[SubmittedFile]) -> ChangeSet {
        let mut changes = ChangeSet::new();

        for file in files {
            let Some(relative) = self.canonical_path(&file.path) else {
                debug!(path = %file.path, "Ignoring path outside gamedata prefix");
                continue;
            };
            if file.hash.is_empty() {
                continue;
            }
            let Some((mount, local_hash)) = self.registry.resolve_hash(&relative, metadata) else {
                debug!(path = %relative, "No eligible mount holds file");
                continue;
            };
            if local_hash == file.hash {
                continue;
            }

            let location = location_for(mount.name(), &relative);
            changes.insert(
                relative.clone(),
                ChangeEntry {
                    path: relative,
                    hash: local_hash,
                    location,
                },
            );
        }

        changes
    }
}

/// Client retrieval path for `relative` under mount `mount_name`.
pub fn location_for(mount_name: &str, relative: &str) -> String {
    std::iter::once(mount_name)
        .chain(relative.split('/'))
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

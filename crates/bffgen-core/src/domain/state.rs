//! The generation ledger.
//!
//! [`GenerationState`] records which routes and files earlier runs produced.
//! It is a plain value: loading and persisting go through the
//! `StateStore` port, and the regenerator threads one instance through a
//! whole cycle by `&mut` reference.
//!
//! The ledger is additive. Routes that disappear from the config stay
//! recorded until an explicit [`GenerationState::reset`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::config_model::{ProjectType, RouteKey};

/// On-disk ledger format version.
pub const STATE_VERSION: &str = "2.0.0";

/// Record of one generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    /// `sha256:<hex>` of the complete file as last written.
    pub content_hash: String,
    pub last_generated_at: DateTime<Utc>,
    pub has_markers: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationState {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
    #[serde(default)]
    pub last_generation: Option<DateTime<Utc>>,
    #[serde(default)]
    generated_routes: BTreeSet<RouteKey>,
    #[serde(default)]
    generated_files: BTreeMap<String, GeneratedFile>,
}

impl Default for GenerationState {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationState {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            project_type: None,
            last_generation: None,
            generated_routes: BTreeSet::new(),
            generated_files: BTreeMap::new(),
        }
    }

    pub fn is_route_generated(&self, route: &RouteKey) -> bool {
        self.generated_routes.contains(route)
    }

    /// Record a route. Returns `true` if it was not already recorded.
    pub fn track_route(&mut self, route: RouteKey) -> bool {
        self.generated_routes.insert(route)
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteKey> {
        self.generated_routes.iter()
    }

    pub fn route_count(&self) -> usize {
        self.generated_routes.len()
    }

    pub fn track_generated_file(
        &mut self,
        path: impl Into<String>,
        content_hash: impl Into<String>,
        has_markers: bool,
        at: DateTime<Utc>,
    ) {
        self.generated_files.insert(
            path.into(),
            GeneratedFile {
                content_hash: content_hash.into(),
                last_generated_at: at,
                has_markers,
            },
        );
    }

    pub fn is_file_generated(&self, path: &str) -> bool {
        self.generated_files.contains_key(path)
    }

    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.generated_files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = (&String, &GeneratedFile)> {
        self.generated_files.iter()
    }

    /// `true` when the hash of the file on disk no longer matches what was
    /// last written. Unknown files are never considered modified.
    pub fn is_modified_since_generation(&self, path: &str, current_hash: &str) -> bool {
        self.generated_files
            .get(path)
            .is_some_and(|f| f.content_hash != current_hash)
    }

    /// Forget every route and file. Used by forced regeneration and when the
    /// project type changes underneath an existing ledger.
    pub fn reset(&mut self) {
        self.generated_routes.clear();
        self.generated_files.clear();
        self.project_type = None;
    }

    pub fn is_empty(&self) -> bool {
        self.generated_routes.is_empty() && self.generated_files.is_empty()
    }

    /// Stamp the ledger just before it is written out.
    pub fn mark_persisted(&mut self, at: DateTime<Utc>) {
        self.last_generation = Some(at);
        self.version = STATE_VERSION.to_string();
    }
}

/// `sha256:<hex>` digest of file content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(7 + digest.len() * 2);
    out.push_str("sha256:");
    for byte in digest.iter() {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

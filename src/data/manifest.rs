//! Manifest (`districts_index.json`) and the catalog built from it.

use crate::{Error, Result};
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Manifest entry as written by the preparation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub code: String,
    pub name: String,
    pub filename: String,
    #[serde(alias = "record_count", default)]
    pub tree_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_mb: Option<f64>,
}

/// Manifest document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(alias = "total_records", default)]
    pub total_trees: u64,
    #[serde(alias = "total_shards", default)]
    pub total_districts: u64,
    #[serde(alias = "shards")]
    pub districts: Vec<ManifestEntry>,
}

/// Identifies one fetchable shard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardDescriptor {
    /// Unique code, e.g. `"01"`
    pub code: String,
    /// Human-readable label, e.g. `"Centro"`
    pub label: String,
    /// Filename or URL of the shard's feature collection
    pub source: String,
    /// Record count declared by the manifest
    pub declared_records: u64,
    pub size_mb: Option<f64>,
}

impl From<ManifestEntry> for ShardDescriptor {
    fn from(entry: ManifestEntry) -> Self {
        Self {
            code: entry.code,
            label: entry.name,
            source: entry.filename,
            declared_records: entry.tree_count,
            size_mb: entry.size_mb,
        }
    }
}

impl std::fmt::Display for ShardDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.code, self.label)
    }
}

/// Immutable description of every shard of the dataset, in load order
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    shards: Vec<ShardDescriptor>,
    declared_shards: u64,
    total_records: u64,
}

impl Catalog {
    /// Build a catalog, rejecting blank or duplicate codes and blank filenames.
    pub fn from_manifest(manifest: Manifest) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for entry in &manifest.districts {
            if entry.code.trim().is_empty() {
                return Err(Error::InvalidManifest(format!(
                    "shard '{}' has an empty code",
                    entry.name
                )));
            }
            if entry.filename.trim().is_empty() {
                return Err(Error::InvalidManifest(format!(
                    "shard {} has an empty filename",
                    entry.code
                )));
            }
            if !seen.insert(entry.code.as_str()) {
                return Err(Error::InvalidManifest(format!(
                    "duplicate shard code {}",
                    entry.code
                )));
            }
        }

        Ok(Self {
            declared_shards: manifest.total_districts,
            total_records: manifest.total_trees,
            shards: manifest.districts.into_iter().map(ShardDescriptor::from).collect(),
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let manifest: Manifest = serde_json::from_slice(bytes)?;
        Self::from_manifest(manifest)
    }

    pub fn shards(&self) -> &[ShardDescriptor] {
        &self.shards
    }

    /// Number of shards actually listed; progress is computed against this.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard count as declared by the manifest. The split script leaves the
    /// "no district" bucket out of it, so it can be one short of `shard_count`.
    pub fn declared_shards(&self) -> u64 {
        self.declared_shards
    }

    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    pub fn get(&self, code: &str) -> Option<&ShardDescriptor> {
        self.shards.iter().find(|s| s.code == code)
    }
}

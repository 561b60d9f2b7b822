//! Where manifests and shards come from
//!
//! A `ShardSource` hands back raw bytes; parsing happens in the loaders so
//! every transport fails the same way on a bad payload.

pub mod http;
pub mod memory;

#[cfg(all(feature = "tokio-runtime", not(target_arch = "wasm32")))]
pub mod fs;

use crate::data::manifest::ShardDescriptor;
use crate::Result;
use async_trait::async_trait;

/// Transport for the manifest fetch and the per-shard fetch
#[async_trait]
pub trait ShardSource: Send + Sync {
    /// Fetch the manifest body
    async fn fetch_manifest(&self) -> Result<Vec<u8>>;

    /// Fetch one shard's feature collection body
    async fn fetch_shard(&self, shard: &ShardDescriptor) -> Result<Vec<u8>>;

    /// Short description for logs
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Resolve a shard reference against the data base location.
///
/// Absolute URLs and rooted paths are used as-is.
pub fn resolve_location(base: &str, reference: &str) -> String {
    if reference.contains("://") || reference.starts_with('/') || base.is_empty() {
        return reference.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), reference.trim_start_matches("./"))
}

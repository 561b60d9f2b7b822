use crate::data::manifest::Catalog;
use crate::source::ShardSource;
use crate::{Error, Result};

/// Fetch and parse the manifest once.
///
/// Any failure (transport, HTTP status, bad JSON, invalid entries) comes back
/// as `Error::CatalogUnavailable`. There is no retry: without a catalog the
/// session cannot start.
pub async fn load_catalog(source: &dyn ShardSource) -> Result<Catalog> {
    log::info!("loading shard catalog from {}", source.describe());

    let catalog = source
        .fetch_manifest()
        .await
        .and_then(|bytes| Catalog::from_slice(&bytes))
        .map_err(|e| {
            log::error!("catalog unavailable: {}", e);
            Error::catalog_unavailable(e)
        })?;

    log::info!(
        "catalog loaded: {} shards, {} records",
        catalog.shard_count(),
        catalog.total_records()
    );
    Ok(catalog)
}

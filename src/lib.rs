//! # shardmap
//!
//! Incremental, viewport-driven loading of very large point datasets.
//!
//! The dataset is split into named shards (districts) described by a manifest.
//! Shards are fetched on demand and their records are streamed into a shared
//! rendering aggregate in fixed-size batches, yielding to the host scheduler
//! between batches so the map stays responsive while hundreds of thousands of
//! points are loaded.

pub mod core;
pub mod data;
pub mod layers;
pub mod loading;
pub mod prelude;
pub mod runtime;
pub mod session;
pub mod source;
pub mod traits;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{LoaderConfig, LoadingProfile},
    geo::{LatLng, LatLngBounds},
    viewport::{Viewport, ViewportEvent},
};

pub use data::{
    attributes::{Attribute, AttributeBundle},
    geojson::{FeatureCollection, FeatureDefect, RawFeature},
    manifest::{Catalog, ShardDescriptor},
    point::RenderPoint,
};

pub use layers::cluster::ClusterLayer;

pub use loading::{
    coordinator::{
        AllShards, Coordinator, CycleOutcome, CycleReport, RelevancePolicy, ShardFailure,
    },
    ingest::{IngestReport, Ingestor},
    reactor::{ViewportNotifier, ViewportReactor},
    state::{LoadState, Progress, SharedLoadState},
};

pub use runtime::{EventLoopScheduler, HostScheduler};

pub use session::{LoaderSession, SessionBuilder};

pub use source::{ShardSource, http::HttpSource, memory::MemorySource};

#[cfg(all(feature = "tokio-runtime", not(target_arch = "wasm32")))]
pub use source::fs::FsSource;

pub use traits::{PointSink, StatusSink};

pub use ui::reporter::{LogStatus, Notification, Reporter};

/// Initialise `env_logger` from `RUST_LOG`, defaulting to `info` for this crate.
///
/// Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("shardmap=info"),
    )
    .try_init();
}

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Loader error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The manifest could not be fetched or parsed. Fatal for a session.
    #[error("catalog unavailable: {source}")]
    CatalogUnavailable {
        #[source]
        source: Box<Error>,
    },

    /// One shard could not be fetched or parsed. The cycle carries on.
    #[error("failed to load shard {code}: {source}")]
    ShardFetchFailed {
        code: String,
        #[source]
        source: Box<Error>,
    },

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn catalog_unavailable(source: Error) -> Self {
        match source {
            already @ Error::CatalogUnavailable { .. } => already,
            other => Error::CatalogUnavailable {
                source: Box::new(other),
            },
        }
    }

    pub(crate) fn shard_failed(code: &str, source: Error) -> Self {
        Error::ShardFetchFailed {
            code: code.to_string(),
            source: Box::new(source),
        }
    }

    /// HTTP status of the underlying failure, if there was one
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            Error::CatalogUnavailable { source } | Error::ShardFetchFailed { source, .. } => {
                source.http_status()
            }
            _ => None,
        }
    }
}

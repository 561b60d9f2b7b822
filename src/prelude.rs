//! Prelude module for common shardmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use shardmap::prelude::*;`

pub use crate::core::{
    config::{LoaderConfig, LoadingProfile},
    geo::{LatLng, LatLngBounds},
    viewport::{Viewport, ViewportEvent},
};

pub use crate::data::{
    attributes::{Attribute, AttributeBundle},
    geojson::FeatureCollection,
    manifest::{Catalog, ShardDescriptor},
    point::RenderPoint,
};

pub use crate::layers::cluster::ClusterLayer;

pub use crate::loading::{
    coordinator::{AllShards, CycleOutcome, CycleReport, RelevancePolicy},
    reactor::{channel as viewport_channel, ViewportNotifier, ViewportReactor},
    state::Progress,
};

pub use crate::runtime::{EventLoopScheduler, HostScheduler};
pub use crate::session::{LoaderSession, SessionBuilder};
pub use crate::source::{http::HttpSource, memory::MemorySource, ShardSource};

#[cfg(all(feature = "tokio-runtime", not(target_arch = "wasm32")))]
pub use crate::source::fs::FsSource;

pub use crate::traits::{PointSink, StatusSink};
pub use crate::ui::reporter::{LogStatus, Reporter};

pub use crate::{Error, Result};

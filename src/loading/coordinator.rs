//! Shard loading coordinator
//!
//! One load cycle walks the relevant shards in catalog order, fetching and
//! ingesting the ones that are not resident yet. Only one cycle runs at a
//! time; a second call while a cycle is in flight returns `Skipped`.

use crate::core::viewport::Viewport;
use crate::data::geojson::FeatureCollection;
use crate::data::manifest::{Catalog, ShardDescriptor};
use crate::loading::ingest::{IngestReport, Ingestor};
use crate::loading::state::{Progress, SharedLoadState};
use crate::runtime::HostScheduler;
use crate::source::ShardSource;
use crate::traits::PointSink;
use crate::ui::reporter::Reporter;
use crate::{Error, Result};
use std::sync::Arc;

/// Decides which shards the current view needs
pub trait RelevancePolicy: Send + Sync {
    fn relevant_shards<'c>(
        &self,
        catalog: &'c Catalog,
        viewport: Option<&Viewport>,
    ) -> Vec<&'c ShardDescriptor>;
}

/// Every shard is relevant, whatever the viewport
#[derive(Debug, Default, Clone, Copy)]
pub struct AllShards;

impl RelevancePolicy for AllShards {
    fn relevant_shards<'c>(
        &self,
        catalog: &'c Catalog,
        _viewport: Option<&Viewport>,
    ) -> Vec<&'c ShardDescriptor> {
        catalog.shards().iter().collect()
    }
}

#[derive(Debug)]
pub struct ShardFailure {
    pub code: String,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct CycleReport {
    /// Codes that became resident during this cycle, in load order
    pub loaded: Vec<String>,
    pub failed: Vec<ShardFailure>,
    pub points_added: usize,
    pub progress: Progress,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub enum CycleOutcome {
    /// Another cycle held the guard
    Skipped,
    Completed(CycleReport),
}

impl CycleOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, CycleOutcome::Skipped)
    }

    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            CycleOutcome::Skipped => None,
        }
    }
}

/// Keeps the loading overlay up for the life of a cycle, including a cycle
/// future that is dropped mid-fetch.
struct OverlayGuard<'a> {
    reporter: &'a Reporter,
}

impl<'a> OverlayGuard<'a> {
    fn show(reporter: &'a Reporter) -> Self {
        reporter.loading(true);
        Self { reporter }
    }
}

impl Drop for OverlayGuard<'_> {
    fn drop(&mut self) {
        self.reporter.loading(false);
    }
}

pub struct Coordinator {
    catalog: Arc<Catalog>,
    source: Arc<dyn ShardSource>,
    sink: Arc<dyn PointSink>,
    reporter: Arc<Reporter>,
    scheduler: Arc<dyn HostScheduler>,
    policy: Box<dyn RelevancePolicy>,
    state: SharedLoadState,
    batch_size: usize,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<Catalog>,
        source: Arc<dyn ShardSource>,
        sink: Arc<dyn PointSink>,
        reporter: Arc<Reporter>,
        scheduler: Arc<dyn HostScheduler>,
        policy: Box<dyn RelevancePolicy>,
        batch_size: usize,
    ) -> Self {
        Self {
            catalog,
            source,
            sink,
            reporter,
            scheduler,
            policy,
            state: SharedLoadState::new(),
            batch_size,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &SharedLoadState {
        &self.state
    }

    /// Make every shard relevant to `viewport` resident.
    ///
    /// Shards are processed one at a time in catalog order. A failed shard is
    /// reported and left non-resident so the next cycle retries it.
    pub async fn run_cycle(&self, viewport: Option<&Viewport>) -> CycleOutcome {
        let Some(_guard) = self.state.try_begin_cycle() else {
            log::debug!("load cycle already in progress, skipping");
            return CycleOutcome::Skipped;
        };

        let missing: Vec<&ShardDescriptor> = self
            .policy
            .relevant_shards(&self.catalog, viewport)
            .into_iter()
            .filter(|shard| !self.state.is_resident(&shard.code))
            .collect();

        let mut report = CycleReport {
            progress: self.state.with(|s| s.progress()),
            ..CycleReport::default()
        };
        if missing.is_empty() {
            log::trace!("all relevant shards resident");
            return CycleOutcome::Completed(report);
        }

        log::info!("load cycle started: {} shards missing", missing.len());
        let overlay = OverlayGuard::show(&self.reporter);

        for shard in missing {
            match self.load_shard(shard).await {
                Ok(ingested) => {
                    report.points_added += ingested.added;
                    report.loaded.push(ingested.shard);
                }
                Err(error) => {
                    self.reporter.shard_failed(shard, &error);
                    report.failed.push(ShardFailure {
                        code: shard.code.clone(),
                        error,
                    });
                }
            }

            let total = self.catalog.shard_count();
            report.progress = self.state.with(|s| s.update_progress(total));
            self.reporter.progress(report.progress);
            self.scheduler.yield_now().await;
        }

        drop(overlay);
        log::info!(
            "load cycle finished: {} loaded, {} failed, {}",
            report.loaded.len(),
            report.failed.len(),
            report.progress
        );
        CycleOutcome::Completed(report)
    }

    async fn load_shard(&self, shard: &ShardDescriptor) -> Result<IngestReport> {
        log::debug!("fetching shard {} from {}", shard, shard.source);
        let collection = self
            .source
            .fetch_shard(shard)
            .await
            .and_then(|bytes| FeatureCollection::from_slice(&bytes))
            .map_err(|e| Error::shard_failed(&shard.code, e))?;

        if let Some(props) = &collection.properties {
            log::debug!("shard {} collection properties: {:?}", shard.code, props);
        }

        let ingestor = Ingestor::new(
            self.sink.as_ref(),
            self.scheduler.as_ref(),
            &self.state,
            self.batch_size,
        );
        Ok(ingestor.ingest(shard, collection).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::cluster::ClusterLayer;
    use crate::runtime::EventLoopScheduler;
    use crate::source::memory::MemorySource;
    use crate::ui::reporter::LogStatus;
    use std::time::Duration;

    const MANIFEST: &str = r#"{
        "total_trees": 3, "total_districts": 2,
        "districts": [
            {"code": "01", "name": "Centro", "filename": "a.geojson", "tree_count": 2},
            {"code": "02", "name": "Arganzuela", "filename": "b.geojson", "tree_count": 1}
        ]
    }"#;

    const SHARD_A: &str = r#"{"type": "FeatureCollection", "features": [
        {"geometry": {"coordinates": [-3.70, 40.41]}, "properties": {"sn": "Platanus"}},
        {"geometry": {"coordinates": [-3.71, 40.42]}, "properties": {}}
    ]}"#;

    const SHARD_B: &str = r#"{"features": [{"geometry": {"coordinates": [-3.69, 40.40]}}]}"#;

    fn coordinator(source: Arc<MemorySource>, layer: Arc<ClusterLayer>) -> Coordinator {
        let catalog = Catalog::from_slice(MANIFEST.as_bytes()).unwrap();
        Coordinator::new(
            Arc::new(catalog),
            source,
            layer,
            Arc::new(Reporter::new(Arc::new(LogStatus), Duration::from_secs(5))),
            Arc::new(EventLoopScheduler),
            Box::new(AllShards),
            500,
        )
    }

    #[tokio::test]
    async fn test_cycle_loads_in_catalog_order() {
        let source = Arc::new(
            MemorySource::new(MANIFEST)
                .with_shard("a.geojson", SHARD_A)
                .with_shard("b.geojson", SHARD_B),
        );
        let layer = Arc::new(ClusterLayer::default());
        let coordinator = coordinator(source.clone(), layer.clone());

        let outcome = coordinator.run_cycle(None).await;
        let report = outcome.report().unwrap();
        assert_eq!(report.loaded, vec!["01", "02"]);
        assert!(report.is_clean());
        assert_eq!(report.points_added, 3);
        assert_eq!(report.progress, Progress::new(2, 2));
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.snapshot()[0].shard, "01");
        assert!(!coordinator.state().is_loading());
    }

    #[tokio::test]
    async fn test_failed_shard_does_not_stop_the_cycle() {
        let source = Arc::new(
            MemorySource::new(MANIFEST)
                .with_status("a.geojson", 500)
                .with_shard("b.geojson", SHARD_B),
        );
        let layer = Arc::new(ClusterLayer::default());
        let coordinator = coordinator(source, layer.clone());

        let outcome = coordinator.run_cycle(None).await;
        let report = outcome.report().unwrap();
        assert_eq!(report.loaded, vec!["02"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].code, "01");
        assert!(matches!(report.failed[0].error, Error::ShardFetchFailed { .. }));
        assert_eq!(report.failed[0].error.http_status(), Some(500));
        assert_eq!(report.progress, Progress::new(1, 2));
        assert!(!coordinator.state().is_resident("01"));
    }

    #[tokio::test]
    async fn test_unparseable_shard_is_a_shard_failure() {
        let source = Arc::new(
            MemorySource::new(MANIFEST)
                .with_shard("a.geojson", "<html>not found</html>")
                .with_shard("b.geojson", SHARD_B),
        );
        let coordinator = coordinator(source, Arc::new(ClusterLayer::default()));

        let outcome = coordinator.run_cycle(None).await;
        let report = outcome.report().unwrap();
        assert_eq!(report.failed[0].code, "01");
        assert_eq!(report.loaded, vec!["02"]);
    }

    #[tokio::test]
    async fn test_held_guard_skips_cycle() {
        let source = Arc::new(MemorySource::new(MANIFEST));
        let coordinator = coordinator(source.clone(), Arc::new(ClusterLayer::default()));

        let _guard = coordinator.state().try_begin_cycle().unwrap();
        assert!(coordinator.run_cycle(None).await.is_skipped());
        assert_eq!(source.shard_requests(), 0);
    }

    #[test]
    fn test_all_shards_ignores_viewport() {
        let catalog = Catalog::from_slice(MANIFEST.as_bytes()).unwrap();
        let far_away = Viewport::new(crate::core::geo::LatLng::new(-33.9, 151.2), 3.0);
        let codes: Vec<&str> = AllShards
            .relevant_shards(&catalog, Some(&far_away))
            .iter()
            .map(|s| s.code.as_str())
            .collect();
        assert_eq!(codes, ["01", "02"]);
    }
}

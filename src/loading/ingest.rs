//! Chunked feature ingestion
//!
//! A shard can hold tens of thousands of features. Converting and handing
//! them all over in one go would block the event loop for the whole shard, so
//! points are buffered and flushed in fixed-size batches with a yield to the
//! host after every full batch.

use crate::data::geojson::FeatureCollection;
use crate::data::manifest::ShardDescriptor;
use crate::data::point::RenderPoint;
use crate::loading::state::SharedLoadState;
use crate::runtime::HostScheduler;
use crate::traits::PointSink;

/// Outcome of ingesting one shard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub shard: String,
    /// Render points handed to the sink
    pub added: usize,
    /// Features dropped for missing or malformed geometry
    pub skipped: usize,
    pub batches: usize,
    /// Host yields performed between batches
    pub yields: usize,
}

pub struct Ingestor<'a> {
    sink: &'a dyn PointSink,
    scheduler: &'a dyn HostScheduler,
    state: &'a SharedLoadState,
    batch_size: usize,
}

impl<'a> Ingestor<'a> {
    pub fn new(
        sink: &'a dyn PointSink,
        scheduler: &'a dyn HostScheduler,
        state: &'a SharedLoadState,
        batch_size: usize,
    ) -> Self {
        Self {
            sink,
            scheduler,
            state,
            batch_size: batch_size.max(1),
        }
    }

    /// Stream every valid feature of `collection` into the sink, then mark the
    /// shard resident.
    ///
    /// Feature order is preserved. After each full batch the ingestor yields
    /// once, but only when another valid feature follows, so N valid features
    /// cost `(N - 1) / batch_size` yields.
    pub async fn ingest(
        &self,
        shard: &ShardDescriptor,
        collection: FeatureCollection,
    ) -> IngestReport {
        let mut report = IngestReport {
            shard: shard.code.clone(),
            ..IngestReport::default()
        };
        let mut buffer = Vec::with_capacity(self.batch_size.min(collection.len()));
        let mut yield_pending = false;

        for feature in collection.features {
            let point = match RenderPoint::from_feature(&feature, &shard.code) {
                Ok(point) => point,
                Err(defect) => {
                    log::trace!("skipping feature in shard {}: {}", shard.code, defect);
                    report.skipped += 1;
                    continue;
                }
            };

            if yield_pending {
                self.scheduler.yield_now().await;
                report.yields += 1;
                yield_pending = false;
            }

            buffer.push(point);
            if buffer.len() == self.batch_size {
                self.flush(&mut buffer, &mut report);
                yield_pending = true;
            }
        }

        if !buffer.is_empty() {
            self.flush(&mut buffer, &mut report);
        }

        self.state.mark_resident(&shard.code, report.added);

        log::debug!(
            "shard {} ingested: {} points in {} batches, {} skipped",
            shard,
            report.added,
            report.batches,
            report.skipped
        );
        report
    }

    fn flush(&self, buffer: &mut Vec<RenderPoint>, report: &mut IngestReport) {
        let batch = std::mem::replace(buffer, Vec::with_capacity(self.batch_size));
        report.added += batch.len();
        report.batches += 1;
        self.sink.add_points(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geojson::RawFeature;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<Vec<RenderPoint>>>,
    }

    impl RecordingSink {
        fn sizes(&self) -> Vec<usize> {
            self.batches.lock().unwrap().iter().map(Vec::len).collect()
        }
    }

    impl PointSink for RecordingSink {
        fn add_points(&self, batch: Vec<RenderPoint>) {
            self.batches.lock().unwrap().push(batch);
        }
    }

    #[derive(Default)]
    struct CountingScheduler {
        yields: AtomicUsize,
    }

    #[async_trait]
    impl HostScheduler for CountingScheduler {
        async fn yield_now(&self) {
            self.yields.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn shard() -> ShardDescriptor {
        ShardDescriptor {
            code: "01".into(),
            label: "Centro".into(),
            source: "district_01_Centro.geojson".into(),
            declared_records: 0,
            size_mb: None,
        }
    }

    fn valid(i: usize) -> RawFeature {
        serde_json::from_value(json!({
            "geometry": {"type": "Point", "coordinates": [-3.70, 40.0 + i as f64 * 1e-5]},
            "properties": {"sn": format!("tree {i}")}
        }))
        .unwrap()
    }

    fn collection(n: usize) -> FeatureCollection {
        FeatureCollection::new((0..n).map(valid).collect())
    }

    async fn run(collection: FeatureCollection, batch_size: usize) -> (IngestReport, RecordingSink, usize) {
        let sink = RecordingSink::default();
        let scheduler = CountingScheduler::default();
        let state = SharedLoadState::new();
        let report = Ingestor::new(&sink, &scheduler, &state, batch_size)
            .ingest(&shard(), collection)
            .await;
        assert!(state.is_resident("01"));
        let yields = scheduler.yields.load(Ordering::SeqCst);
        (report, sink, yields)
    }

    #[tokio::test]
    async fn test_yield_cadence() {
        for n in [0usize, 1, 499, 500, 501, 1000, 1001, 1234] {
            let (report, sink, yields) = run(collection(n), 500).await;
            let expected = if n == 0 { 0 } else { (n - 1) / 500 };
            assert_eq!(yields, expected, "n = {n}");
            assert_eq!(report.yields, expected, "n = {n}");
            assert_eq!(report.added, n);
            assert_eq!(sink.sizes().iter().sum::<usize>(), n);
            assert!(sink.sizes().iter().all(|&size| size <= 500));
        }
    }

    #[tokio::test]
    async fn test_batches_are_full_except_last() {
        let (report, sink, _) = run(collection(1234), 500).await;
        assert_eq!(sink.sizes(), vec![500, 500, 234]);
        assert_eq!(report.batches, 3);
    }

    #[tokio::test]
    async fn test_malformed_features_are_skipped_not_counted() {
        let mut features: Vec<RawFeature> = (0..6).map(valid).collect();
        features.insert(2, RawFeature::new(None, None));
        features.insert(4, serde_json::from_value(json!({"geometry": {"coordinates": [1.0]}})).unwrap());
        features.push(serde_json::from_value(json!({"geometry": {"coordinates": ["a", "b"]}})).unwrap());

        let (report, sink, yields) = run(FeatureCollection::new(features), 3).await;
        assert_eq!(report.added, 6);
        assert_eq!(report.skipped, 3);
        assert_eq!(sink.sizes(), vec![3, 3]);
        assert_eq!(yields, 1);
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let (_, sink, _) = run(collection(7), 3).await;
        let species: Vec<String> = sink
            .batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|p| p.attributes.species.clone())
            .collect();
        let expected: Vec<String> = (0..7).map(|i| format!("tree {i}")).collect();
        assert_eq!(species, expected);
    }

    #[tokio::test]
    async fn test_empty_shard_is_still_resident() {
        let (report, sink, yields) = run(FeatureCollection::default(), 500).await;
        assert_eq!(report.added, 0);
        assert!(sink.sizes().is_empty());
        assert_eq!(yields, 0);
    }
}

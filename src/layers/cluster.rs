use crate::core::geo::LatLngBounds;
use crate::data::point::RenderPoint;
use crate::traits::PointSink;
use std::sync::Mutex;

/// Single shared point aggregate behind the marker-clustering renderer.
///
/// All shards feed the same layer so the renderer clusters over the full
/// resident point set. The layer only stores points; grouping them into
/// clusters is the renderer's job.
#[derive(Debug)]
pub struct ClusterLayer {
    id: String,
    points: Mutex<Vec<RenderPoint>>,
    batches: Mutex<usize>,
}

impl ClusterLayer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            points: Mutex::new(Vec::new()),
            batches: Mutex::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.points.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `add_points` calls received
    pub fn batch_count(&self) -> usize {
        self.batches.lock().map(|b| *b).unwrap_or(0)
    }

    pub fn count_for_shard(&self, code: &str) -> usize {
        self.points
            .lock()
            .map(|p| p.iter().filter(|point| point.shard == code).count())
            .unwrap_or(0)
    }

    /// Points whose position falls inside `bounds`, for the renderer's visible set
    pub fn points_in(&self, bounds: &LatLngBounds) -> Vec<RenderPoint> {
        self.points
            .lock()
            .map(|p| {
                p.iter()
                    .filter(|point| bounds.contains(&point.position))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Vec<RenderPoint> {
        self.points.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for ClusterLayer {
    fn default() -> Self {
        Self::new("clusters")
    }
}

impl PointSink for ClusterLayer {
    fn add_points(&self, batch: Vec<RenderPoint>) {
        log::trace!("layer {} receives {} points", self.id, batch.len());
        if let Ok(mut points) = self.points.lock() {
            points.extend(batch);
        }
        if let Ok(mut batches) = self.batches.lock() {
            *batches += 1;
        }
    }
}

use crate::core::constants::MAX_ZOOM;
use crate::core::geo::{LatLng, LatLngBounds};
use serde::{Deserialize, Serialize};

/// The current view of the map as reported by the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// Visible bounds, when the renderer knows them
    pub bounds: Option<LatLngBounds>,
}

impl Viewport {
    /// Creates a new viewport, clamping the zoom to the supported range
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, MAX_ZOOM),
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: LatLngBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(0.0, MAX_ZOOM);
    }

    /// Whether a point falls inside the visible bounds. Unknown bounds contain everything.
    pub fn contains(&self, point: &LatLng) -> bool {
        self.bounds.as_ref().map_or(true, |b| b.contains(point))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::default(), 0.0)
    }
}

/// Viewport-change notification from the map component
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    /// Pan finished (`moveend`)
    Moved(Viewport),
    /// Zoom animation finished (`zoomend`)
    ZoomEnded(Viewport),
}

impl ViewportEvent {
    pub fn viewport(&self) -> &Viewport {
        match self {
            ViewportEvent::Moved(v) | ViewportEvent::ZoomEnded(v) => v,
        }
    }

    pub fn into_viewport(self) -> Viewport {
        match self {
            ViewportEvent::Moved(v) | ViewportEvent::ZoomEnded(v) => v,
        }
    }
}

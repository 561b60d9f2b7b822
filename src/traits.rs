//! Seams to the external collaborators
//!
//! The loader never draws anything itself. Points go to a `PointSink` (the
//! clustering layer of whatever map renders them) and status goes to a
//! `StatusSink` (progress text, loading overlay, error banner).

use crate::data::point::RenderPoint;
use std::time::Duration;

/// The rendering layer's "add these points as one batch" capability.
///
/// Every batch of every shard goes to the same sink so clustering decisions
/// see the whole resident point set.
pub trait PointSink: Send + Sync {
    fn add_points(&self, batch: Vec<RenderPoint>);
}

/// UI collaborators around the map
pub trait StatusSink: Send + Sync {
    /// Replace the progress text
    fn show_progress(&self, text: &str);

    /// Show or hide the loading overlay
    fn set_loading_overlay(&self, visible: bool);

    /// Show an error banner. `dismiss_after: None` means the error is blocking.
    fn show_error(&self, message: &str, dismiss_after: Option<Duration>);
}

impl<T: PointSink + ?Sized> PointSink for std::sync::Arc<T> {
    fn add_points(&self, batch: Vec<RenderPoint>) {
        (**self).add_points(batch)
    }
}

impl<T: StatusSink + ?Sized> StatusSink for std::sync::Arc<T> {
    fn show_progress(&self, text: &str) {
        (**self).show_progress(text)
    }

    fn set_loading_overlay(&self, visible: bool) {
        (**self).set_loading_overlay(visible)
    }

    fn show_error(&self, message: &str, dismiss_after: Option<Duration>) {
        (**self).show_error(message, dismiss_after)
    }
}

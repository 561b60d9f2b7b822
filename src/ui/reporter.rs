//! Progress and error reporting
//!
//! The reporter turns loader events into text for the UI collaborators. It
//! never blocks the map: shard errors become auto-dismissing notifications and
//! only a missing catalog is shown as a blocking error.

use crate::data::manifest::ShardDescriptor;
use crate::loading::state::Progress;
use crate::traits::StatusSink;
use crate::Error;
use instant::Instant;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Error banner currently on screen
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub shown_at: Instant,
    /// `None` for blocking errors that stay until the page is reloaded
    pub auto_close_duration: Option<Duration>,
}

impl Notification {
    pub fn new(message: String, auto_close_duration: Option<Duration>) -> Self {
        Self {
            message,
            shown_at: Instant::now(),
            auto_close_duration,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.auto_close_duration.is_none()
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.auto_close_duration {
            Some(duration) => now.saturating_duration_since(self.shown_at) >= duration,
            None => false,
        }
    }

    pub fn should_auto_close(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

pub struct Reporter {
    sink: Arc<dyn StatusSink>,
    error_display: Duration,
    banner: Mutex<Option<Notification>>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn StatusSink>, error_display: Duration) -> Self {
        Self {
            sink,
            error_display,
            banner: Mutex::new(None),
        }
    }

    /// Render a progress snapshot as text
    pub fn progress(&self, progress: Progress) {
        let text = progress.to_string();
        log::info!("shards loaded: {}", text);
        self.sink.show_progress(&text);
    }

    pub fn loading(&self, visible: bool) {
        self.sink.set_loading_overlay(visible);
    }

    /// Transient notification for a shard that failed to load
    pub fn shard_failed(&self, shard: &ShardDescriptor, error: &Error) {
        log::warn!("shard {} failed: {}", shard, error);
        let message = format!("Could not load {}: {}", shard.label, error);
        self.notify(Notification::new(message, Some(self.error_display)));
    }

    /// Blocking error for a failed initialization
    pub fn fatal(&self, error: &Error) {
        log::error!("initialization failed: {}", error);
        let message = format!("The data could not be loaded: {}", error);
        self.notify(Notification::new(message, None));
    }

    /// Banner still on screen, if any. Expired notifications are dropped here.
    pub fn active_notification(&self) -> Option<Notification> {
        let mut banner = self.banner.lock().ok()?;
        if banner.as_ref().is_some_and(Notification::should_auto_close) {
            *banner = None;
        }
        banner.clone()
    }

    fn notify(&self, notification: Notification) {
        self.sink
            .show_error(&notification.message, notification.auto_close_duration);
        if let Ok(mut banner) = self.banner.lock() {
            *banner = Some(notification);
        }
    }
}

/// `StatusSink` that writes everything to the log, for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn show_progress(&self, text: &str) {
        log::info!("progress: {}", text);
    }

    fn set_loading_overlay(&self, visible: bool) {
        log::debug!("loading overlay {}", if visible { "shown" } else { "hidden" });
    }

    fn show_error(&self, message: &str, dismiss_after: Option<Duration>) {
        match dismiss_after {
            Some(duration) => log::warn!("{} (dismissed after {:?})", message, duration),
            None => log::error!("{}", message),
        }
    }
}

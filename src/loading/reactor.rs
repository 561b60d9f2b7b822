//! Viewport change reactor
//!
//! Every move or zoom-end event starts a load cycle on its own task. Events
//! that arrive while a cycle is running hit the coordinator's guard and end
//! up as no-ops; nothing is debounced here.

use crate::core::viewport::{Viewport, ViewportEvent};
use crate::loading::coordinator::Coordinator;
use crate::runtime::{self, AsyncHandle, TaskHandle};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::future::join_all;
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// Sending half handed to the map's viewport-change hooks
#[derive(Debug, Clone)]
pub struct ViewportNotifier {
    tx: UnboundedSender<ViewportEvent>,
}

impl ViewportNotifier {
    /// Queue an event. Returns false once the reactor has gone away.
    pub fn notify(&self, event: ViewportEvent) -> bool {
        self.tx.unbounded_send(event).is_ok()
    }

    pub fn moved(&self, viewport: Viewport) -> bool {
        self.notify(ViewportEvent::Moved(viewport))
    }

    pub fn zoom_ended(&self, viewport: Viewport) -> bool {
        self.notify(ViewportEvent::ZoomEnded(viewport))
    }
}

/// Create a notifier and the event stream it feeds
pub fn channel() -> (ViewportNotifier, UnboundedReceiver<ViewportEvent>) {
    let (tx, rx) = mpsc::unbounded();
    (ViewportNotifier { tx }, rx)
}

pub struct ViewportReactor {
    coordinator: Arc<Coordinator>,
}

impl ViewportReactor {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    /// Dispatch a cycle for each event until the stream ends, then wait for
    /// the dispatched cycles. Returns the number of events handled.
    pub async fn run<S>(&self, events: S) -> usize
    where
        S: Stream<Item = ViewportEvent> + Unpin,
    {
        let mut events = events;
        let mut handles: Vec<TaskHandle> = Vec::new();
        let mut dispatched = 0;

        while let Some(event) = events.next().await {
            log::trace!("viewport event: {:?}", event);
            let coordinator = self.coordinator.clone();
            let viewport = event.into_viewport();
            handles.push(runtime::spawn(async move {
                let outcome = coordinator.run_cycle(Some(&viewport)).await;
                if outcome.is_skipped() {
                    log::trace!("viewport change ignored, cycle in flight");
                }
            }));
            dispatched += 1;
            handles.retain(|handle| !handle.is_finished());
        }

        join_all(handles).await;
        log::debug!("viewport stream closed after {} events", dispatched);
        dispatched
    }
}

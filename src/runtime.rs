//! Runtime abstraction layer for cooperative loading
//!
//! The loader runs on a single event loop and only gives control back at
//! explicit points: network awaits, after every full ingestion batch, and
//! between shards. `HostScheduler` is that give-back point; `spawn` starts
//! a load cycle as its own task so viewport events never wait on each other.

use async_trait::async_trait;
use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// Cooperative yield point
#[async_trait]
pub trait HostScheduler: Send + Sync {
    /// Suspend once so other tasks (input handling, rendering) can run
    async fn yield_now(&self);
}

/// Yields to whatever event loop drives the current task
#[derive(Debug, Default, Clone, Copy)]
pub struct EventLoopScheduler;

#[async_trait]
impl HostScheduler for EventLoopScheduler {
    async fn yield_now(&self) {
        #[cfg(feature = "tokio-runtime")]
        {
            tokio::task::yield_now().await;
        }

        #[cfg(not(feature = "tokio-runtime"))]
        {
            YieldNow::default().await;
        }
    }
}

/// Zero-delay deferred resumption: pending once, waking itself immediately
#[derive(Debug, Default)]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Handle to a spawned task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;
}

/// Completion handle returned by [`spawn`].
///
/// Awaiting it resolves once the task has run to completion, or once the task
/// has been dropped by its executor, without polling.
#[derive(Debug)]
pub struct TaskHandle {
    finished: Arc<AtomicBool>,
    done: oneshot::Receiver<()>,
}

impl AsyncHandle for TaskHandle {
    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Future for TaskHandle {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        Pin::new(&mut self.done).poll(cx).map(|_| ())
    }
}

/// Spawn a future on the host runtime.
///
/// With `tokio-runtime` this must be called from inside a tokio runtime. With
/// `wasm` the future runs on the browser event loop. Without either, the
/// future is driven to completion on the calling thread.
pub fn spawn<F>(future: F) -> TaskHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();
    let (tx, done) = oneshot::channel();
    let task = async move {
        future.await;
        flag.store(true, Ordering::SeqCst);
        let _ = tx.send(());
    };

    #[cfg(feature = "tokio-runtime")]
    {
        tokio::spawn(task);
    }

    #[cfg(all(feature = "wasm", not(feature = "tokio-runtime")))]
    {
        wasm_bindgen_futures::spawn_local(task);
    }

    #[cfg(not(any(feature = "tokio-runtime", feature = "wasm")))]
    {
        futures::executor::block_on(task);
    }

    TaskHandle { finished, done }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yield_now_is_pending_once() {
        let mut fut = YieldNow::default();
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(Pin::new(&mut fut).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut fut).poll(&mut cx).is_ready());
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_spawned_task_finishes() {
        let handle = spawn(async {
            EventLoopScheduler.yield_now().await;
        });
        assert!(!handle.is_finished());

        let finished = handle.finished.clone();
        handle.await;
        assert!(finished.load(Ordering::SeqCst));
    }
}

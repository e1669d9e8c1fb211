use std::{
    future::Future,
    io,
    pin::Pin,
    task::{Context, Poll},
    thread,
};

use tokio::{
    runtime::{self, Handle},
    task::JoinHandle,
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, warn};

use crate::error::WaitError;

/// Single-threaded cooperative event loop.
///
/// All async work of the demo runs on one tokio current-thread runtime, driven
/// by a dedicated loop thread. The thread that started the loop stays free, so
/// a synchronous caller can block on work it handed to the loop.
///
/// Every unit spawned through a [`Spawner`] is tracked. [`EventLoop::drain`]
/// returns once all of them have finished, which is how the process stays
/// alive until the last pending timer has fired.
///
/// The loop thread logs through the `tracing` dispatcher that was current on
/// the thread calling [`EventLoop::start`].
///
/// Dropping the loop without draining it stops it right away: units still
/// pending are dropped unfinished.
pub struct EventLoop {
    spawner: Spawner,
    stop: CancellationToken,
    thread: Option<thread::JoinHandle<()>>,
}

impl EventLoop {
    pub fn start() -> io::Result<Self> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let tracker = TaskTracker::new();
        let spawner = Spawner {
            handle: runtime.handle().clone(),
            tracker: tracker.clone(),
        };

        let stop = CancellationToken::new();
        let stopped = stop.clone();
        let dispatch = tracing::dispatcher::get_default(|current| current.clone());

        let thread = thread::Builder::new()
            .name("event-loop".to_string())
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    // `wait` only completes once the tracker is closed and
                    // empty, until then this drives every spawned unit.
                    runtime.block_on(async {
                        tokio::select! {
                            _ = tracker.wait() => debug!("event loop drained"),
                            _ = stopped.cancelled() => {
                                warn!(pending = tracker.len(), "event loop stopped before draining");
                            }
                        }
                    });
                    // Dropping the runtime here drops whatever is still pending.
                    drop(runtime);
                });
            })?;

        Ok(Self {
            spawner,
            stop,
            thread: Some(thread),
        })
    }

    pub fn spawner(&self) -> Spawner {
        self.spawner.clone()
    }

    /// Wait for every spawned unit to finish and stop the loop thread.
    ///
    /// Units spawned by other units while draining are waited for as well.
    /// This does not return while any unit can never finish.
    pub fn drain(mut self) -> thread::Result<()> {
        self.join()
    }

    fn join(&mut self) -> thread::Result<()> {
        self.spawner.tracker.close();
        match self.thread.take() {
            Some(thread) => thread.join(),
            None => Ok(()),
        }
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.stop.cancel();
        if self.join().is_err() {
            warn!("event loop thread panicked");
        }
    }
}

/// Cheap handle used to put work on the [`EventLoop`].
#[derive(Debug, Clone)]
pub struct Spawner {
    handle: Handle,
    tracker: TaskTracker,
}

impl Spawner {
    /// Run `future` on the loop without waiting for it.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn_on(future, &self.handle)
    }

    /// Run a fallible unit on the loop and get an [`Eventual`] for its result.
    ///
    /// The unit keeps running even if the `Eventual` is dropped.
    pub fn launch<T, F>(&self, future: F) -> Eventual<T>
    where
        F: Future<Output = Result<T, WaitError>> + Send + 'static,
        T: Send + 'static,
    {
        Eventual {
            handle: self.spawn(future),
        }
    }

    /// Number of units spawned on the loop that have not finished yet.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }
}

/// Result of a unit running on the loop.
///
/// Resolves with the unit's own result, or with [`WaitError::Abandoned`] if
/// the unit panicked or was torn down before settling.
#[derive(Debug)]
pub struct Eventual<T> {
    handle: JoinHandle<Result<T, WaitError>>,
}

impl<T> Future for Eventual<T> {
    type Output = Result<T, WaitError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(settled)) => Poll::Ready(settled),
            Poll::Ready(Err(e)) => {
                warn!("background unit failed: {e}");
                Poll::Ready(Err(WaitError::Abandoned))
            }
        }
    }
}

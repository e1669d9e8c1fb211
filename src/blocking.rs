//! Blocking a synchronous caller on work running on the event loop.
//!
//! A [`Completer`] / [`Completion`] pair is a single-slot cell: the background
//! unit stores its value once, the caller blocks until it is there. The
//! caller either sleeps on a condition variable or busy-polls a flag with a
//! fixed interval, see [`WaitStrategy`].

use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread,
    time::Duration,
};

use serde::Serialize;
use tracing::debug;

use crate::{error::WaitError, event_loop::Spawner};

/// Interval of the busy-poll loop unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStrategy {
    /// Sleep on a condition variable until the value is stored.
    #[default]
    Notify,
    /// Re-check a completion flag every `interval_ms`, sleeping in between.
    Poll { interval_ms: u64 },
}

/// Value handed over by a background unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed<T> {
    pub value: T,
    /// Sleep-and-check rounds the caller went through. Always 0 for
    /// [`WaitStrategy::Notify`].
    pub polls: u32,
}

enum State<T> {
    Pending,
    Ready(T),
    Abandoned,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    settled: AtomicBool,
    cond: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, state: State<T>) {
        let mut guard = self.lock();
        *guard = state;
        // Set under the lock so a poller that sees the flag finds the value.
        self.settled.store(true, Ordering::Release);
        drop(guard);
        self.cond.notify_all();
    }
}

/// Create a connected writer/reader pair.
pub fn completion<T>() -> (Completer<T>, Completion<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State::Pending),
        settled: AtomicBool::new(false),
        cond: Condvar::new(),
    });

    (
        Completer {
            shared: Some(shared.clone()),
        },
        Completion { shared },
    )
}

/// Writing half. Dropping it without completing abandons the wait.
pub struct Completer<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> Completer<T> {
    pub fn complete(mut self, value: T) {
        if let Some(shared) = self.shared.take() {
            shared.settle(State::Ready(value));
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.settle(State::Abandoned);
        }
    }
}

/// Reading half.
pub struct Completion<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Completion<T> {
    pub fn is_complete(&self) -> bool {
        self.shared.settled.load(Ordering::Acquire)
    }

    /// Block the calling thread until the writer settles.
    pub fn wait(self, strategy: WaitStrategy) -> Result<Completed<T>, WaitError> {
        let mut polls = 0;

        let mut guard = match strategy {
            WaitStrategy::Notify => self
                .shared
                .cond
                .wait_while(self.shared.lock(), |state| matches!(state, State::Pending))
                .unwrap_or_else(PoisonError::into_inner),
            WaitStrategy::Poll { interval_ms } => {
                let interval = Duration::from_millis(interval_ms);
                while !self.is_complete() {
                    thread::sleep(interval);
                    polls += 1;
                }
                self.shared.lock()
            }
        };

        debug!(polls, "background unit settled");

        match std::mem::replace(&mut *guard, State::Abandoned) {
            State::Ready(value) => Ok(Completed { value, polls }),
            State::Pending | State::Abandoned => Err(WaitError::Abandoned),
        }
    }
}

/// Hand `work` to the event loop and block the calling thread until it is
/// done.
///
/// Must not be called from the loop thread itself: the loop would be blocked
/// waiting on work only it can run.
pub fn block_on_loop<T, F>(
    spawner: &Spawner,
    strategy: WaitStrategy,
    work: F,
) -> Result<Completed<T>, WaitError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (completer, completion) = completion();

    spawner.spawn(async move {
        let value = work.await;
        completer.complete(value);
    });

    completion.wait(strategy)
}

//! Latency simulation.
//!
//! [`WaitSimulator`] stands in for a latency-bearing operation such as a
//! network call: it draws a delay, arms a one-shot timer and settles with
//! either the drawn delay or a [`WaitError::Rejected`] carrying it.

use std::{
    collections::VecDeque,
    fmt,
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use rand::Rng;
use serde::Serialize;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Level};

use crate::{
    config::UPPER_BOUND_VAR,
    error::{ConfigError, WaitError},
};

/// Exclusive upper bound of drawn delays unless configured otherwise.
pub const DEFAULT_UPPER_BOUND_MS: u64 = 1000;

/// Settled result of one simulated wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaitOutcome {
    pub duration_ms: u64,
    pub succeeded: bool,
}

impl WaitOutcome {
    pub fn into_result(self) -> Result<u64, WaitError> {
        if self.succeeded {
            Ok(self.duration_ms)
        } else {
            Err(WaitError::Rejected(self.duration_ms))
        }
    }
}

/// Where simulated delays come from.
pub trait DurationSource: Send + Sync {
    /// Draw a delay in `[0, upper_bound_ms)`. `upper_bound_ms` is never zero.
    fn draw(&self, upper_bound_ms: u64) -> u64;
}

/// Uniformly random delays, as the demo uses.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomDurations;

impl DurationSource for RandomDurations {
    fn draw(&self, upper_bound_ms: u64) -> u64 {
        rand::thread_rng().gen_range(0..upper_bound_ms)
    }
}

/// Delays handed out in a fixed order.
///
/// Values at or above the bound are clamped to `upper_bound_ms - 1`. Once the
/// script runs dry every draw yields 0.
#[derive(Debug, Default)]
pub struct ScriptedDurations {
    queue: Mutex<VecDeque<u64>>,
}

impl ScriptedDurations {
    pub fn new(durations: impl IntoIterator<Item = u64>) -> Self {
        Self {
            queue: Mutex::new(durations.into_iter().collect()),
        }
    }
}

impl DurationSource for ScriptedDurations {
    fn draw(&self, upper_bound_ms: u64) -> u64 {
        let next = match self.queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        next.unwrap_or(0).min(upper_bound_ms - 1)
    }
}

#[derive(Clone)]
pub struct WaitSimulator {
    upper_bound_ms: u64,
    durations: Arc<dyn DurationSource>,
}

impl WaitSimulator {
    pub fn new(upper_bound_ms: u64) -> Result<Self, ConfigError> {
        Self::with_source(upper_bound_ms, RandomDurations)
    }

    pub fn with_source<S>(upper_bound_ms: u64, source: S) -> Result<Self, ConfigError>
    where
        S: DurationSource + 'static,
    {
        if upper_bound_ms == 0 {
            return Err(ConfigError::Zero {
                var: UPPER_BOUND_VAR,
            });
        }

        Ok(Self {
            upper_bound_ms,
            durations: Arc::new(source),
        })
    }

    pub fn upper_bound_ms(&self) -> u64 {
        self.upper_bound_ms
    }

    /// Start a simulated wait.
    ///
    /// The delay is drawn and the deadline fixed when this is called, not when
    /// the returned future is first polled, so several waits created together
    /// run their timers concurrently even if they are awaited one by one.
    pub fn simulate(
        &self,
        fail: bool,
    ) -> impl Future<Output = Result<u64, WaitError>> + Send + 'static {
        let duration_ms = self.durations.draw(self.upper_bound_ms);
        info!("waiting for {duration_ms} ms...");
        let deadline = Instant::now() + Duration::from_millis(duration_ms);

        async move {
            time::sleep_until(deadline).await;

            let verb = if fail { "rejecting" } else { "resolving" };
            info!("{duration_ms} ms passed, {verb}");

            let outcome = WaitOutcome {
                duration_ms,
                succeeded: !fail,
            };
            if tracing::enabled!(Level::DEBUG) {
                if let Ok(rendered) = serde_json::to_string(&outcome) {
                    debug!(outcome = %rendered, "wait settled");
                }
            }
            outcome.into_result()
        }
    }

    pub fn resolve(&self) -> impl Future<Output = Result<u64, WaitError>> + Send + 'static {
        self.simulate(false)
    }

    pub fn reject(&self) -> impl Future<Output = Result<u64, WaitError>> + Send + 'static {
        self.simulate(true)
    }

    /// Like [`simulate`](Self::simulate), but settles with
    /// [`WaitError::Cancelled`] if `token` fires before the timer does.
    pub fn simulate_cancellable(
        &self,
        fail: bool,
        token: CancellationToken,
    ) -> impl Future<Output = Result<u64, WaitError>> + Send + 'static {
        let wait = self.simulate(fail);

        async move {
            tokio::select! {
                biased;

                outcome = wait => outcome,
                _ = token.cancelled() => {
                    info!("wait cancelled");
                    Err(WaitError::Cancelled)
                }
            }
        }
    }
}

impl Default for WaitSimulator {
    fn default() -> Self {
        Self {
            upper_bound_ms: DEFAULT_UPPER_BOUND_MS,
            durations: Arc::new(RandomDurations),
        }
    }
}

impl fmt::Debug for WaitSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitSimulator")
            .field("upper_bound_ms", &self.upper_bound_ms)
            .finish_non_exhaustive()
    }
}

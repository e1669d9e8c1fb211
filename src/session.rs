use std::future::Future;

use tokio::task::JoinHandle;

use crate::{
    blocking::{self, Completed, WaitStrategy},
    error::WaitError,
    event_loop::Spawner,
    simulator::WaitSimulator,
};

/// Everything one example invocation gets to work with.
///
/// Each dispatch builds its own session, so nothing about a run leaks into
/// another one.
#[derive(Debug, Clone)]
pub struct Session {
    spawner: Spawner,
    simulator: WaitSimulator,
    wait_strategy: WaitStrategy,
}

impl Session {
    pub fn new(spawner: Spawner, simulator: WaitSimulator, wait_strategy: WaitStrategy) -> Self {
        Self {
            spawner,
            simulator,
            wait_strategy,
        }
    }

    pub fn simulator(&self) -> &WaitSimulator {
        &self.simulator
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub fn wait_strategy(&self) -> WaitStrategy {
        self.wait_strategy
    }

    /// Detach `future` onto the event loop.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.spawner.spawn(future)
    }

    /// Run `work` on the event loop and block the calling thread until it is
    /// done, using the configured strategy.
    pub fn block_on<T, F>(&self, work: F) -> Result<Completed<T>, WaitError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        blocking::block_on_loop(&self.spawner, self.wait_strategy, work)
    }
}

//! Ways of waiting on several simulated waits at once.

use std::{future::Future, time::Duration};

use futures::{
    future,
    stream::{FuturesUnordered, StreamExt},
    FutureExt,
};
use tokio::time;

use crate::error::WaitError;

/// Settle once every wait succeeded, with their values in submission order.
///
/// Fails as soon as any wait fails, with that wait's error, however many
/// waits there are. The remaining waits are dropped; launch them on the loop
/// first if they must keep running.
pub async fn join_all<T, I, F>(waits: I) -> Result<Vec<T>, WaitError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, WaitError>>,
{
    let mut pending: FuturesUnordered<_> = waits
        .into_iter()
        .enumerate()
        .map(|(index, wait)| wait.map(move |settled| (index, settled)))
        .collect();

    let mut values: Vec<Option<T>> = (0..pending.len()).map(|_| None).collect();
    while let Some((index, settled)) = pending.next().await {
        values[index] = Some(settled?);
    }

    Ok(values.into_iter().flatten().collect())
}

/// Settle with whichever wait settles first, success or failure.
///
/// An empty race never settles. Use [`race_within`] to bound it: a unit stuck
/// on an unbounded empty race keeps [`EventLoop::drain`] from returning.
///
/// [`EventLoop::drain`]: crate::event_loop::EventLoop::drain
pub async fn race<T, I, F>(waits: I) -> Result<T, WaitError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, WaitError>>,
{
    let waits: Vec<_> = waits.into_iter().map(Box::pin).collect();
    if waits.is_empty() {
        return future::pending().await;
    }

    let (settled, _index, _rest) = future::select_all(waits).await;
    settled
}

/// [`join_all`] that gives up with [`WaitError::DeadlineElapsed`] after
/// `deadline`.
pub async fn join_all_within<T, I, F>(deadline: Duration, waits: I) -> Result<Vec<T>, WaitError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, WaitError>>,
{
    time::timeout(deadline, join_all(waits))
        .await
        .unwrap_or(Err(WaitError::DeadlineElapsed(deadline)))
}

/// [`race`] that gives up with [`WaitError::DeadlineElapsed`] after
/// `deadline`.
pub async fn race_within<T, I, F>(deadline: Duration, waits: I) -> Result<T, WaitError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, WaitError>>,
{
    time::timeout(deadline, race(waits))
        .await
        .unwrap_or(Err(WaitError::DeadlineElapsed(deadline)))
}

/// Run `rounds` waits strictly one after another.
///
/// `step` is only called for round `n + 1` once round `n` has settled, so no
/// two rounds ever overlap. A failed round does not stop the sequence.
pub async fn sequence<T, S, F>(rounds: usize, mut step: S) -> Vec<Result<T, WaitError>>
where
    S: FnMut(usize) -> F,
    F: Future<Output = Result<T, WaitError>>,
{
    let mut settled = Vec::with_capacity(rounds);
    for round in 0..rounds {
        settled.push(step(round).await);
    }
    settled
}

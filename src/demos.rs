//! The thirteen example routines.
//!
//! Run one with `N=<n> cargo run --bin wait-demo`, e.g. `N=2` for `ex2`.

use std::future::Future;

use futures::{FutureExt, TryFutureExt};
use tracing::{error, info};

use crate::{
    dispatch::{Example, ExampleKind},
    error::WaitError,
    event_loop::{Eventual, Spawner},
    join,
    session::Session,
    simulator::WaitSimulator,
};

/// Waits started by the join and race examples.
const FAN_OUT: usize = 5;

/// Position of the rejecting wait in ex12 and ex13.
const REJECTING_SLOT: usize = 2;

/// Rounds of the sequential examples.
const ROUNDS: usize = 5;

pub fn registry() -> Vec<Example> {
    use ExampleKind::*;

    vec![
        Example::new("ex1", Callback, "resolving wait with a success continuation", ex1),
        Example::new("ex2", Callback, "rejecting wait with success and failure continuations", ex2),
        Example::new("ex3", Callback, "rejecting wait with a failure-only continuation", ex3),
        Example::new("ex4", Await, "awaiting a resolving wait", ex4),
        Example::new("ex5", Await, "awaiting a rejecting wait with local recovery", ex5),
        Example::new("ex6", Detached, "synchronous routine launching a detached async unit", ex6),
        Example::new("ex7", Blocking, "synchronous routine blocking on a resolving wait", ex7),
        Example::new("ex8", Blocking, "synchronous routine blocking on a rejecting wait", ex8),
        Example::new("ex9", Sequential, "five waits awaited one after another", ex9),
        Example::new("ex10", Sequential, "five sequential waits behind a blocking caller", ex10),
        Example::new("ex11", JoinAll, "joining five resolving waits", ex11),
        Example::new("ex12", JoinAll, "joining five waits where one rejects", ex12),
        Example::new("ex13", Race, "racing five waits where one rejects", ex13),
    ]
}

fn log_rejected(err: &WaitError) {
    match err.duration_ms() {
        Some(ms) => error!("rejected: {ms}"),
        None => error!("rejected: {err}"),
    }
}

fn ex1(session: &Session) {
    let wait = session.simulator().resolve();
    session.spawn(wait.map_ok(|ms| info!("resolved: {ms}")).map(|_| ()));
}

fn ex2(session: &Session) {
    let wait = session.simulator().reject();
    session.spawn(wait.map(|settled| match settled {
        Ok(_) => info!("you should not see this"),
        Err(e) => log_rejected(&e),
    }));
}

fn ex3(session: &Session) {
    let wait = session.simulator().reject();
    session.spawn(wait.map_ok(|_| ()).unwrap_or_else(|e| log_rejected(&e)));
}

async fn await_resolving(sim: WaitSimulator) {
    if let Ok(ms) = sim.resolve().await {
        info!("resolved: {ms}");
    }
}

async fn await_rejecting(sim: WaitSimulator) {
    match sim.reject().await {
        Ok(_) => info!("you should not see this"),
        Err(e) => log_rejected(&e),
    }
}

fn ex4(session: &Session) {
    session.spawn(await_resolving(session.simulator().clone()));
}

fn ex5(session: &Session) {
    session.spawn(await_rejecting(session.simulator().clone()));
}

fn ex6(session: &Session) {
    let sim = session.simulator().clone();
    session.spawn(async move {
        let ms = sim.resolve().await?;
        info!("resolved: {ms}");
        Ok::<_, WaitError>(())
    });
}

fn ex7(session: &Session) {
    let sim = session.simulator().clone();

    match session.block_on(async move { sim.resolve().await }) {
        Ok(done) => match done.value {
            Ok(ms) => info!(polls = done.polls, "resolved: {ms}"),
            Err(e) => log_rejected(&e),
        },
        Err(e) => error!("background unit failed: {e}"),
    }
}

fn ex8(session: &Session) {
    let sim = session.simulator().clone();

    let waited = session.block_on(async move {
        match sim.reject().await {
            Ok(_) => info!("you should not see this"),
            Err(e) => log_rejected(&e),
        }
    });

    if let Err(e) = waited {
        error!("background unit failed: {e}");
    }
    info!("end");
}

fn logged_resolve(sim: &WaitSimulator) -> impl Future<Output = Result<u64, WaitError>> {
    let wait = sim.resolve();
    async move {
        let settled = wait.await;
        match &settled {
            Ok(ms) => info!("resolved: {ms}"),
            Err(_) => info!("you should not see this"),
        }
        settled
    }
}

async fn resolve_in_sequence(sim: WaitSimulator) {
    join::sequence(ROUNDS, |_| logged_resolve(&sim)).await;
}

fn ex9(session: &Session) {
    let sim = session.simulator().clone();
    session.spawn(async move {
        resolve_in_sequence(sim).await;
        info!("end");
    });
}

fn ex10(session: &Session) {
    let sim = session.simulator().clone();

    if let Err(e) = session.block_on(resolve_in_sequence(sim)) {
        error!("background unit failed: {e}");
    }
    info!("end");
}

/// Launch `FAN_OUT` waits on the loop; the one at `rejecting` fails.
///
/// Launched waits keep running after a join or race has settled, so every
/// timer still reports when it fires.
fn launch_waits(
    spawner: &Spawner,
    sim: &WaitSimulator,
    rejecting: Option<usize>,
) -> Vec<Eventual<u64>> {
    (0..FAN_OUT)
        .map(|slot| spawner.launch(sim.simulate(Some(slot) == rejecting)))
        .collect()
}

fn ex11(session: &Session) {
    let spawner = session.spawner().clone();
    let sim = session.simulator().clone();

    session.spawn(async move {
        let waits = launch_waits(&spawner, &sim, None);
        match join::join_all(waits).await {
            Ok(durations) => info!("durations: {durations:?}"),
            Err(e) => log_rejected(&e),
        }
        info!("end");
    });
}

fn ex12(session: &Session) {
    let spawner = session.spawner().clone();
    let sim = session.simulator().clone();

    session.spawn(async move {
        let waits = launch_waits(&spawner, &sim, Some(REJECTING_SLOT));
        if let Err(e) = join::join_all(waits).await {
            match e.duration_ms() {
                Some(ms) => info!("rejected duration: {ms}"),
                None => info!("rejected: {e}"),
            }
        }
        info!("end");
    });
}

fn ex13(session: &Session) {
    let spawner = session.spawner().clone();
    let sim = session.simulator().clone();

    session.spawn(async move {
        let waits = launch_waits(&spawner, &sim, Some(REJECTING_SLOT));
        match join::race(waits).await {
            Ok(ms) => info!("durations: {ms}"),
            Err(e) => match e.duration_ms() {
                Some(ms) => info!("rejected duration: {ms}"),
                None => info!("rejected: {e}"),
            },
        }
        info!("end");
    });
}

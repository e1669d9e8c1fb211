use anyhow::{Context, Result};
use tracing::{debug, error};
use wait_demo::{logging, Config, Dispatcher, EventLoop, Session, WaitSimulator};

fn main() -> Result<()> {
    logging::init().context("failed to initialize logging")?;

    let config = Config::from_env().context("invalid configuration")?;
    let rendered = serde_json::to_string(&config)?;
    debug!(config = %rendered, "loaded configuration");

    let dispatcher = Dispatcher::builtin().context("failed to build example registry")?;
    let simulator = WaitSimulator::new(config.upper_bound_ms)?;

    let event_loop = EventLoop::start().context("failed to start event loop")?;
    let session = Session::new(event_loop.spawner(), simulator, config.wait_strategy);

    let dispatched = dispatcher.dispatch(config.selector().as_ref(), &session);

    // Keep the process alive until every pending timer has fired.
    if event_loop.drain().is_err() {
        error!("event loop thread panicked");
    }

    if dispatched.is_err() && config.strict_exit {
        std::process::exit(1);
    }

    Ok(())
}

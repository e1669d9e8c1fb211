use tracing::Level;
use tracing_subscriber::{
    fmt::{self, writer::MakeWriterExt},
    prelude::*,
    util::TryInitError,
    EnvFilter,
};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber.
///
/// Warnings and errors go to stderr, everything else to stdout, so the demo's
/// trace lines and its failure lines can be told apart the usual way.
pub fn init() -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_timer(fmt::time::uptime()),
        )
        .try_init()
}

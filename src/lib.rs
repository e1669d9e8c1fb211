//! Ways of waiting on asynchronous work, one example at a time.
//!
//! A [`WaitSimulator`] stands in for a slow operation. Thirteen example
//! routines wait on it with continuations, `.await`, a blocked synchronous
//! caller, sequential loops, join-all and race. The [`Dispatcher`] picks one
//! by name and runs it against a [`Session`] on the single-threaded
//! [`EventLoop`].

pub mod blocking;
pub mod config;
mod demos;
pub mod dispatch;
pub mod error;
pub mod event_loop;
pub mod join;
pub mod logging;
pub mod session;
pub mod simulator;

pub use blocking::WaitStrategy;
pub use config::Config;
pub use dispatch::{Dispatcher, SelectorToken};
pub use error::{ConfigError, DispatchError, WaitError};
pub use event_loop::{EventLoop, Spawner};
pub use session::Session;
pub use simulator::{WaitOutcome, WaitSimulator};

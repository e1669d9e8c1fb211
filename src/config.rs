use serde::Serialize;

use crate::{
    blocking::{WaitStrategy, DEFAULT_POLL_INTERVAL_MS},
    dispatch::SelectorToken,
    error::ConfigError,
    simulator::DEFAULT_UPPER_BOUND_MS,
};

pub const EXAMPLE_VAR: &str = "N";
pub const UPPER_BOUND_VAR: &str = "WAIT_UPPER_BOUND_MS";
pub const POLL_INTERVAL_VAR: &str = "WAIT_POLL_INTERVAL_MS";
pub const STRATEGY_VAR: &str = "WAIT_STRATEGY";
pub const STRICT_VAR: &str = "WAIT_DEMO_STRICT";

/// Process configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Raw value of `N`, if set and not blank.
    pub example: Option<String>,
    pub upper_bound_ms: u64,
    pub wait_strategy: WaitStrategy,
    /// Exit with a failure status when dispatch fails.
    pub strict_exit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            example: None,
            upper_bound_ms: DEFAULT_UPPER_BOUND_MS,
            wait_strategy: WaitStrategy::default(),
            strict_exit: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let upper_bound_ms = match read(UPPER_BOUND_VAR) {
            Some(value) => positive(UPPER_BOUND_VAR, &value)?,
            None => DEFAULT_UPPER_BOUND_MS,
        };

        let interval_ms = match read(POLL_INTERVAL_VAR) {
            Some(value) => positive(POLL_INTERVAL_VAR, &value)?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };

        let wait_strategy = match read(STRATEGY_VAR).as_deref() {
            None | Some("notify") => WaitStrategy::Notify,
            Some("poll") => WaitStrategy::Poll { interval_ms },
            Some(other) => return Err(ConfigError::UnknownStrategy(other.to_string())),
        };

        let strict_exit = matches!(
            read(STRICT_VAR).as_deref(),
            Some("1" | "true" | "yes" | "on")
        );

        Ok(Self {
            example: read(EXAMPLE_VAR),
            upper_bound_ms,
            wait_strategy,
            strict_exit,
        })
    }

    pub fn selector(&self) -> Option<SelectorToken> {
        self.example.as_deref().map(SelectorToken::from_number)
    }
}

fn positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    let parsed: u64 = value.parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })?;

    if parsed == 0 {
        return Err(ConfigError::Zero { var });
    }
    Ok(parsed)
}

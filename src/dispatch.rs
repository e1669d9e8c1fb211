//! Selecting and running an example by name.
//!
//! Names resolve through a closed table built at startup. Nothing the caller
//! passes in is ever evaluated: a token either names a registered routine or
//! is rejected.

use std::{
    any::Any,
    collections::HashSet,
    fmt,
    panic::{self, AssertUnwindSafe},
};

use serde::Serialize;
use tracing::{error, info};

use crate::{error::DispatchError, session::Session};

/// Printed before every dispatch.
pub const SEPARATOR: &str = "---------------------------------";

const NAME_PREFIX: &str = "ex";

/// Name of an example, `ex<N>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorToken(String);

impl SelectorToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Token for the example number given in `N`.
    pub fn from_number(number: &str) -> Self {
        Self(format!("{NAME_PREFIX}{}", number.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SelectorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleKind {
    Callback,
    Await,
    Detached,
    Blocking,
    Sequential,
    JoinAll,
    Race,
}

/// Public description of a registered example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleInfo {
    pub name: String,
    pub kind: ExampleKind,
    pub description: String,
}

type Routine = Box<dyn Fn(&Session) + Send + Sync>;

pub struct Example {
    info: ExampleInfo,
    routine: Routine,
}

impl Example {
    pub fn new<R>(
        name: impl Into<String>,
        kind: ExampleKind,
        description: impl Into<String>,
        routine: R,
    ) -> Self
    where
        R: Fn(&Session) + Send + Sync + 'static,
    {
        Self {
            info: ExampleInfo {
                name: name.into(),
                kind,
                description: description.into(),
            },
            routine: Box::new(routine),
        }
    }

    pub fn info(&self) -> &ExampleInfo {
        &self.info
    }
}

impl fmt::Debug for Example {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Example")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    examples: Vec<Example>,
}

impl Dispatcher {
    /// Build a dispatcher over `examples`.
    ///
    /// Every name must be unique and of the form `ex<N>`.
    pub fn new(examples: Vec<Example>) -> Result<Self, DispatchError> {
        let mut seen = HashSet::new();

        for example in &examples {
            let name = example.info.name.as_str();
            let numbered = name
                .strip_prefix(NAME_PREFIX)
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));

            if !numbered {
                return Err(DispatchError::InvalidRegistry(format!(
                    "{name:?} does not follow the {NAME_PREFIX}<N> convention"
                )));
            }
            if !seen.insert(name) {
                return Err(DispatchError::InvalidRegistry(format!(
                    "{name:?} is registered twice"
                )));
            }
        }

        Ok(Self { examples })
    }

    /// Dispatcher over the thirteen built-in examples.
    pub fn builtin() -> Result<Self, DispatchError> {
        Self::new(crate::demos::registry())
    }

    pub fn examples(&self) -> impl Iterator<Item = &ExampleInfo> {
        self.examples.iter().map(Example::info)
    }

    fn resolve(&self, token: &SelectorToken) -> Option<&Example> {
        self.examples
            .iter()
            .find(|example| example.info.name == token.as_str())
    }

    /// Run the example named by `selector`.
    ///
    /// The routine runs on the calling thread. Whatever it hands to the event
    /// loop is not waited for here.
    ///
    /// A missing or unknown selector and a panicking routine are logged and
    /// returned as errors; this never unwinds into the caller.
    pub fn dispatch(
        &self,
        selector: Option<&SelectorToken>,
        session: &Session,
    ) -> Result<(), DispatchError> {
        let dispatched = self.try_dispatch(selector, session);
        if let Err(e) = &dispatched {
            error!("{e}");
        }
        dispatched
    }

    fn try_dispatch(
        &self,
        selector: Option<&SelectorToken>,
        session: &Session,
    ) -> Result<(), DispatchError> {
        info!("{SEPARATOR}");

        let token = selector.ok_or(DispatchError::MissingSelector(self.examples.len()))?;
        info!("Calling {token}() ...");

        let example = self
            .resolve(token)
            .ok_or_else(|| DispatchError::UnknownExample(token.to_string()))?;

        panic::catch_unwind(AssertUnwindSafe(|| (example.routine)(session))).map_err(|payload| {
            DispatchError::Panicked {
                name: example.info.name.clone(),
                message: panic_message(payload.as_ref()),
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

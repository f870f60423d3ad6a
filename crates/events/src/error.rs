//! Dispatch error model.

use thiserror::Error;

/// Result type returned by `trigger`.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Failure of a `trigger` call.
///
/// Registration (`subscribe`, `unsubscribe`, `set`) never fails; only
/// dispatching can.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The event name has no entry in the registry.
    #[error("event `{name}` is not registered")]
    NameNotRegistered { name: String },

    /// A handler returned an error; handlers after it were not invoked.
    #[error("handler #{index} for event `{name}` failed")]
    HandlerFailed {
        name: String,
        index: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    pub fn name_not_registered(name: impl Into<String>) -> Self {
        Self::NameNotRegistered { name: name.into() }
    }

    pub fn handler_failed(name: impl Into<String>, index: usize, source: anyhow::Error) -> Self {
        Self::HandlerFailed {
            name: name.into(),
            index,
            source,
        }
    }

    /// Name of the event the failing `trigger` targeted.
    pub fn event_name(&self) -> &str {
        match self {
            Self::NameNotRegistered { name } | Self::HandlerFailed { name, .. } => name,
        }
    }
}

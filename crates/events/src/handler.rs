//! Event handlers and their identities.

use core::fmt;
use core::str::FromStr;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use uuid::Uuid;

/// Identity of a registered handler.
///
/// Every [`Handler`] gets a fresh id when it is built; clones share it.
/// Unsubscription matches on this id, never on what the closure does.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(Uuid);

impl HandlerId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered), so ids sort by creation time.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for HandlerId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<HandlerId> for Uuid {
    fn from(value: HandlerId) -> Self {
        value.0
    }
}

impl FromStr for HandlerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

type HandlerFn<T> = dyn Fn(&T) -> anyhow::Result<()> + Send + Sync;

/// A callback invoked with the parameter of a triggered event.
///
/// Handlers are cheap to clone (the callback sits behind an `Arc`) and a
/// clone is the *same* handler: it compares equal and unsubscribing either
/// copy removes the registration. Two handlers built from identical closures
/// are distinct.
///
/// A registry keeps its copy alive until the handler is unsubscribed,
/// replaced or cleared. Anything the callback captures lives at least that
/// long, so unsubscribe before tearing down state the callback relies on.
pub struct Handler<T> {
    id: HandlerId,
    callback: Arc<HandlerFn<T>>,
}

impl<T> Handler<T> {
    /// Wrap a callback that cannot fail.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::fallible(move |parameter: &T| {
            callback(parameter);
            Ok(())
        })
    }

    /// Wrap a callback that may fail.
    ///
    /// An error aborts the `trigger` call that invoked it: handlers registered
    /// after this one are skipped for that call.
    pub fn fallible<F>(callback: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            id: HandlerId::new(),
            callback: Arc::new(callback),
        }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Invoke the callback directly, outside of any registry.
    pub fn call(&self, parameter: &T) -> anyhow::Result<()> {
        (self.callback)(parameter)
    }
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Handler<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handler<T> {}

impl<T> Hash for Handler<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("id", &self.id).finish_non_exhaustive()
    }
}

impl<T, F> From<F> for Handler<T>
where
    F: Fn(&T) + Send + Sync + 'static,
{
    fn from(callback: F) -> Self {
        Self::new(callback)
    }
}

impl<T> From<&Handler<T>> for HandlerId {
    fn from(handler: &Handler<T>) -> Self {
        handler.id
    }
}

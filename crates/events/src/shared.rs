//! Thread-safe registry.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::DispatchResult;
use crate::handler::{Handler, HandlerId};
use crate::registry::{self, Registry};

/// A [`Registry`] behind a single mutex.
///
/// - One lock guards every operation
/// - `trigger` runs handlers *after* releasing the lock, so a handler may
///   subscribe, unsubscribe or trigger on the same registry
/// - Changes made while a trigger is running apply to later triggers only
/// - Handlers that leave the registry are dropped after the lock is
///   released, so state they capture may touch the registry in its `Drop`
#[derive(Debug)]
pub struct SharedRegistry<T> {
    label: String,
    inner: Mutex<Registry<T>>,
}

impl<T> SharedRegistry<T> {
    pub fn new() -> Self {
        Self::from(Registry::new())
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self::from(Registry::with_label(label))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    // Handler code (calls and drops) never runs under the lock, so a
    // poisoned guard still holds a consistent map.
    fn lock(&self) -> MutexGuard<'_, Registry<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`Registry::subscribe`].
    pub fn subscribe(&self, name: impl Into<String>, handler: impl Into<Handler<T>>) -> HandlerId {
        self.lock().subscribe(name, handler)
    }

    /// See [`Registry::unsubscribe`].
    pub fn unsubscribe(&self, name: &str, handler: impl Into<HandlerId>) -> bool {
        let removed = self.lock().take(name, handler.into());
        removed.is_some()
    }

    /// See [`Registry::set`].
    pub fn set(&self, name: impl Into<String>, handler: Option<Handler<T>>) {
        let displaced = self.lock().replace(name.into(), handler);
        drop(displaced);
    }

    /// Invoke a snapshot of the handlers of `name`.
    ///
    /// Same results as [`Registry::trigger`].
    pub fn trigger(&self, name: &str, parameter: &T) -> DispatchResult<usize> {
        match self.handlers(name) {
            Some(handlers) => registry::dispatch(&self.label, name, &handlers, parameter),
            None => Err(registry::not_registered(&self.label, name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains(name)
    }

    pub fn handler_count(&self, name: &str) -> Option<usize> {
        self.lock().handler_count(name)
    }

    /// Copy of the handlers under `name`, in invocation order.
    pub fn handlers(&self, name: &str) -> Option<Vec<Handler<T>>> {
        self.lock().handlers(name).map(<[Handler<T>]>::to_vec)
    }

    /// Names with an entry, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.lock().names().map(str::to_owned).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// See [`Registry::remove`].
    pub fn remove(&self, name: &str) -> Option<Vec<Handler<T>>> {
        self.lock().remove(name)
    }

    pub fn clear(&self) {
        let dropped = self.lock().take_all();
        drop(dropped);
    }

    pub fn into_inner(self) -> Registry<T> {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for SharedRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Registry<T>> for SharedRegistry<T> {
    fn from(registry: Registry<T>) -> Self {
        Self {
            label: registry.label().to_owned(),
            inner: Mutex::new(registry),
        }
    }
}

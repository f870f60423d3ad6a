//! Named event registry (single owner).
//!
//! A [`Registry`] maps event names to ordered handler lists. All handlers of
//! one registry take the same parameter type `T`.
//!
//! Each name is either **absent** (never subscribed, or removed) or
//! **present**, possibly with zero handlers:
//!
//! ```text
//! absent --subscribe / set(Some)--> present
//! present --set(None) / unsubscribe--> present (maybe empty)
//! present --remove--> absent
//! ```
//!
//! Triggering an absent name is an error. Triggering a present name with no
//! handlers invokes nothing and returns `Ok(0)`.
//!
//! ## Subscribe vs. set
//!
//! [`Registry::subscribe`] accumulates: every handler subscribed under a name
//! is invoked, in subscription order. [`Registry::set`] replaces: afterwards
//! the name holds exactly the given handler (or none).

use core::fmt;
use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::error::{DispatchError, DispatchResult};
use crate::handler::{Handler, HandlerId};

const DEFAULT_LABEL: &str = "default";

/// Mapping from event names to ordered handler lists.
///
/// Not synchronized; wrap it in [`crate::SharedRegistry`] to share it
/// between threads.
pub struct Registry<T> {
    label: String,
    entries: HashMap<String, Vec<Handler<T>>>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::with_label(DEFAULT_LABEL)
    }

    /// Create a registry whose log events carry `label`.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: HashMap::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Append `handler` to the handlers of `name`, creating the entry if needed.
    ///
    /// Any string is a valid name, including the empty one.
    pub fn subscribe(&mut self, name: impl Into<String>, handler: impl Into<Handler<T>>) -> HandlerId {
        let name = name.into();
        let handler = handler.into();
        let id = handler.id();

        debug!(registry = %self.label, event = %name, handler = %id, "handler subscribed");
        self.entries.entry(name).or_default().push(handler);

        id
    }

    /// Remove the first registration of `handler` under `name`.
    ///
    /// Unknown names and unknown handlers are ignored. The entry stays
    /// present even when its last handler goes. Returns whether a handler
    /// was removed.
    pub fn unsubscribe(&mut self, name: &str, handler: impl Into<HandlerId>) -> bool {
        self.take(name, handler.into()).is_some()
    }

    /// Assignment-style registration.
    ///
    /// `Some(handler)` replaces every handler of `name` with `handler`.
    /// `None` silences `name`: its handlers are dropped but the entry stays
    /// present. `None` on an absent name leaves it absent.
    pub fn set(&mut self, name: impl Into<String>, handler: Option<Handler<T>>) {
        self.replace(name.into(), handler);
    }

    /// Detach the first registration of `id` under `name` and hand it back.
    pub(crate) fn take(&mut self, name: &str, id: HandlerId) -> Option<Handler<T>> {
        let handlers = self.entries.get_mut(name)?;
        let position = handlers.iter().position(|h| h.id() == id)?;

        let removed = handlers.remove(position);
        debug!(
            registry = %self.label,
            event = name,
            handler = %id,
            handlers = handlers.len(),
            "handler unsubscribed"
        );
        Some(removed)
    }

    /// `set`, returning the handlers it displaced.
    pub(crate) fn replace(&mut self, name: String, handler: Option<Handler<T>>) -> Vec<Handler<T>> {
        match handler {
            Some(handler) => {
                let displaced = self.entries.remove(&name).unwrap_or_default();
                self.subscribe(name, handler);
                displaced
            }
            None => match self.entries.get_mut(&name) {
                Some(handlers) => {
                    let displaced = std::mem::take(handlers);
                    debug!(registry = %self.label, event = %name, dropped = displaced.len(), "handlers cleared");
                    displaced
                }
                None => Vec::new(),
            },
        }
    }

    /// Invoke every handler of `name`, in subscription order.
    ///
    /// Returns the number of handlers invoked. The first handler error stops
    /// the call and is returned as [`DispatchError::HandlerFailed`].
    pub fn trigger(&self, name: &str, parameter: &T) -> DispatchResult<usize> {
        match self.entries.get(name) {
            Some(handlers) => dispatch(&self.label, name, handlers, parameter),
            None => Err(not_registered(&self.label, name)),
        }
    }

    /// Whether `name` has an entry (possibly with no handlers).
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of handlers under `name`; `None` if the name is absent.
    pub fn handler_count(&self, name: &str) -> Option<usize> {
        self.entries.get(name).map(Vec::len)
    }

    /// Handlers under `name`, in invocation order.
    pub fn handlers(&self, name: &str) -> Option<&[Handler<T>]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Names with an entry, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Number of names with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the entry for `name`, making it absent again.
    pub fn remove(&mut self, name: &str) -> Option<Vec<Handler<T>>> {
        let removed = self.entries.remove(name);
        if let Some(handlers) = &removed {
            debug!(registry = %self.label, event = name, dropped = handlers.len(), "event removed");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.take_all();
    }

    /// `clear`, returning every entry it dropped.
    pub(crate) fn take_all(&mut self) -> HashMap<String, Vec<Handler<T>>> {
        debug!(registry = %self.label, events = self.entries.len(), "registry cleared");
        std::mem::take(&mut self.entries)
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .entries
            .iter()
            .map(|(name, handlers)| (name.as_str(), handlers.len()))
            .collect();
        f.debug_struct("Registry")
            .field("label", &self.label)
            .field("entries", &counts)
            .finish()
    }
}

/// Run `handlers` in order against `parameter`.
pub(crate) fn dispatch<T>(
    label: &str,
    name: &str,
    handlers: &[Handler<T>],
    parameter: &T,
) -> DispatchResult<usize> {
    if handlers.is_empty() {
        debug!(registry = label, event = name, "event has no handlers");
        return Ok(0);
    }

    trace!(registry = label, event = name, handlers = handlers.len(), "triggering event");
    for (index, handler) in handlers.iter().enumerate() {
        if let Err(source) = handler.call(parameter) {
            warn!(
                registry = label,
                event = name,
                index,
                handler = %handler.id(),
                error = %source,
                "handler failed"
            );
            return Err(DispatchError::handler_failed(name, index, source));
        }
    }

    Ok(handlers.len())
}

pub(crate) fn not_registered(label: &str, name: &str) -> DispatchError {
    warn!(registry = label, event = name, "trigger on unregistered event");
    DispatchError::name_not_registered(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<(&'static str, i32)>>>;

    fn recorder(log: &Log, tag: &'static str) -> Handler<i32> {
        let log = Arc::clone(log);
        Handler::new(move |v: &i32| log.lock().unwrap().push((tag, *v)))
    }

    fn calls(log: &Log) -> Vec<(&'static str, i32)> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn unknown_name_fails_without_invoking_anything() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.subscribe("score", recorder(&log, "a"));

        let err = registry.trigger("unused", &0).unwrap_err();

        assert!(matches!(err, DispatchError::NameNotRegistered { ref name } if name == "unused"));
        assert!(calls(&log).is_empty());
    }

    #[test]
    fn subscribers_run_in_subscription_order() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.subscribe("score", recorder(&log, "onScoreA"));
        registry.subscribe("score", recorder(&log, "onScoreB"));

        assert_eq!(registry.trigger("score", &42).unwrap(), 2);
        assert_eq!(calls(&log), vec![("onScoreA", 42), ("onScoreB", 42)]);
    }

    #[test]
    fn closures_subscribe_directly() {
        let total = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&total);
        let mut registry: Registry<i32> = Registry::new();
        registry.subscribe("add", move |v: &i32| *sink.lock().unwrap() += *v);

        registry.trigger("add", &3).unwrap();
        registry.trigger("add", &4).unwrap();

        assert_eq!(*total.lock().unwrap(), 7);
    }

    #[test]
    fn empty_name_is_a_valid_key() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.subscribe("", recorder(&log, "blank"));

        registry.trigger("", &1).unwrap();
        assert_eq!(calls(&log), vec![("blank", 1)]);
    }

    #[test]
    fn unsubscribing_unknown_handler_changes_nothing() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.subscribe("score", recorder(&log, "a"));
        let stranger = recorder(&log, "stranger");

        assert!(!registry.unsubscribe("score", &stranger));
        assert!(!registry.unsubscribe("missing", &stranger));
        assert!(!registry.contains("missing"));

        registry.trigger("score", &5).unwrap();
        assert_eq!(calls(&log), vec![("a", 5)]);
    }

    #[test]
    fn unsubscribe_removes_first_registration_only() {
        let log = Log::default();
        let mut registry = Registry::new();
        let a = recorder(&log, "a");
        let b = recorder(&log, "b");
        registry.subscribe("score", a.clone());
        registry.subscribe("score", b.clone());
        registry.subscribe("score", a.clone());

        assert!(registry.unsubscribe("score", &a));
        registry.trigger("score", &1).unwrap();

        assert_eq!(calls(&log), vec![("b", 1), ("a", 1)]);
    }

    #[test]
    fn unsubscribe_accepts_returned_id() {
        let mut registry: Registry<i32> = Registry::new();
        let id = registry.subscribe("score", |_: &i32| {});

        assert!(registry.unsubscribe("score", id));
        assert_eq!(registry.handler_count("score"), Some(0));
    }

    #[test]
    fn set_none_twice_leaves_present_empty_entry() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.subscribe("score", recorder(&log, "a"));

        registry.set("score", None);
        assert_eq!(registry.handler_count("score"), Some(0));
        registry.set("score", None);
        assert_eq!(registry.handler_count("score"), Some(0));
        assert!(registry.contains("score"));
    }

    #[test]
    fn set_none_on_absent_name_keeps_it_absent() {
        let mut registry: Registry<i32> = Registry::new();
        registry.set("ghost", None);

        assert!(!registry.contains("ghost"));
        assert!(registry.trigger("ghost", &0).is_err());
    }

    #[test]
    fn set_replaces_instead_of_accumulating() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.subscribe("score", recorder(&log, "subscribed"));
        registry.set("score", Some(recorder(&log, "h1")));
        registry.set("score", Some(recorder(&log, "h2")));

        assert_eq!(registry.trigger("score", &9).unwrap(), 1);
        assert_eq!(calls(&log), vec![("h2", 9)]);
    }

    #[test]
    fn subscribe_after_set_accumulates() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.set("score", Some(recorder(&log, "set")));
        registry.subscribe("score", recorder(&log, "added"));

        registry.trigger("score", &2).unwrap();
        assert_eq!(calls(&log), vec![("set", 2), ("added", 2)]);
    }

    #[test]
    fn trigger_after_last_unsubscribe_is_a_no_op() {
        let log = Log::default();
        let mut registry = Registry::new();
        let h = recorder(&log, "h");
        registry.subscribe("score", h.clone());
        registry.unsubscribe("score", &h);

        assert_eq!(registry.trigger("score", &1).unwrap(), 0);
        assert!(calls(&log).is_empty());
    }

    #[test]
    fn trigger_after_set_none_is_a_no_op() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.subscribe("score", recorder(&log, "h"));
        registry.set("score", None);

        assert_eq!(registry.trigger("score", &1).unwrap(), 0);
        assert!(calls(&log).is_empty());
    }

    #[test]
    fn failing_handler_aborts_remaining_handlers() {
        let log = Log::default();
        let mut registry = Registry::new();
        registry.subscribe("score", recorder(&log, "before"));
        registry.subscribe("score", Handler::fallible(|_: &i32| anyhow::bail!("rejected")));
        registry.subscribe("score", recorder(&log, "after"));

        let err = registry.trigger("score", &3).unwrap_err();

        match err {
            DispatchError::HandlerFailed { name, index, source } => {
                assert_eq!(name, "score");
                assert_eq!(index, 1);
                assert_eq!(source.to_string(), "rejected");
            }
            other => panic!("expected handler failure, got {other:?}"),
        }
        assert_eq!(calls(&log), vec![("before", 3)]);
    }

    #[test]
    fn remove_makes_name_absent_again() {
        let mut registry = Registry::new();
        let h = Handler::new(|_: &i32| {});
        registry.subscribe("score", h.clone());

        assert_eq!(registry.remove("score"), Some(vec![h]));
        assert!(registry.remove("score").is_none());
        assert!(matches!(
            registry.trigger("score", &0),
            Err(DispatchError::NameNotRegistered { .. })
        ));
    }

    #[test]
    fn inspection_reflects_entries() {
        let mut registry: Registry<i32> = Registry::with_label("game");
        registry.subscribe("score", |_: &i32| {});
        registry.subscribe("score", |_: &i32| {});
        registry.subscribe("level", |_: &i32| {});

        assert_eq!(registry.label(), "game");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.handler_count("score"), Some(2));
        assert_eq!(registry.handler_count("nothing"), None);
        let mut names: Vec<&str> = registry.names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["level", "score"]);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Subscribe(usize),
        Unsubscribe(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4).prop_map(Op::Subscribe),
            (0usize..4).prop_map(Op::Unsubscribe),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: subscribe/unsubscribe on one name behaves like push and
        /// remove-first-match on a plain list, and trigger runs that list.
        #[test]
        fn registry_matches_list_model(ops in prop::collection::vec(op(), 1..40)) {
            let log: Arc<Mutex<Vec<usize>>> = Arc::default();
            let pool: Vec<Handler<i32>> = (0..4)
                .map(|slot| {
                    let log = Arc::clone(&log);
                    Handler::new(move |_: &i32| log.lock().unwrap().push(slot))
                })
                .collect();

            let mut registry = Registry::new();
            let mut model: Vec<usize> = Vec::new();

            for op in ops {
                match op {
                    Op::Subscribe(slot) => {
                        registry.subscribe("n", pool[slot].clone());
                        model.push(slot);
                    }
                    Op::Unsubscribe(slot) => {
                        let removed = registry.unsubscribe("n", &pool[slot]);
                        let expected = model.iter().position(|s| *s == slot);
                        prop_assert_eq!(removed, expected.is_some());
                        if let Some(pos) = expected {
                            model.remove(pos);
                        }
                    }
                }
            }

            match registry.trigger("n", &0) {
                Ok(invoked) => prop_assert_eq!(invoked, model.len()),
                Err(_) => prop_assert!(model.is_empty() && !registry.contains("n")),
            }
            prop_assert_eq!(log.lock().unwrap().clone(), model);
        }
    }
}

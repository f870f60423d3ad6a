//! `messenger-events` — named, typed, in-process event dispatch.
//!
//! Handlers are registered under string names and invoked synchronously, in
//! subscription order, when their name is triggered. Every handler of one
//! registry takes the same parameter type.
//!
//! - [`Registry`]: single-owner registry
//! - [`SharedRegistry`]: mutex-guarded registry for use across threads
//! - [`global`]: lazily created process-wide registry per parameter type

pub mod error;
pub mod global;
pub mod handler;
pub mod registry;
pub mod shared;

pub use error::{DispatchError, DispatchResult};
pub use global::global;
pub use handler::{Handler, HandlerId};
pub use registry::Registry;
pub use shared::SharedRegistry;

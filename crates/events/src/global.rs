//! Process-wide registries, one per parameter type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::shared::SharedRegistry;

type Registries = Mutex<HashMap<TypeId, &'static (dyn Any + Send + Sync)>>;

static REGISTRIES: OnceLock<Registries> = OnceLock::new();

/// The process-wide registry for parameter type `T`.
///
/// Created on first use and never dropped. Every caller asking for the same
/// `T` gets the same registry; its log label is the type name of `T`.
pub fn global<T: 'static>() -> &'static SharedRegistry<T> {
    let registries = REGISTRIES.get_or_init(Registries::default);
    let mut registries = registries.lock().unwrap_or_else(PoisonError::into_inner);

    let registry = *registries.entry(TypeId::of::<T>()).or_insert_with(|| {
        let label = std::any::type_name::<T>();
        debug!(registry = label, "creating global registry");
        let registry: &'static SharedRegistry<T> = Box::leak(Box::new(SharedRegistry::with_label(label)));
        registry as &'static (dyn Any + Send + Sync)
    });

    // The map is keyed by `TypeId::of::<T>()`, so the entry always holds a
    // `SharedRegistry<T>`.
    let Some(registry) = registry.downcast_ref::<SharedRegistry<T>>() else {
        unreachable!("global registry stored under the wrong TypeId");
    };
    registry
}

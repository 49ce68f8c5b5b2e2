//! # Shared Registry
//!
//! One registry behind one [`parking_lot::Mutex`]. Every access takes the
//! lock for the whole operation, so mutations are serialized.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::ecs::Registry;

/// Cloneable, thread-safe handle to a single registry.
///
/// # Example
///
/// ```rust
/// use strata_core::{Health, SharedRegistry};
///
/// let shared = SharedRegistry::default();
/// let e = shared.with(|registry| registry.create_entity());
///
/// let worker = shared.clone();
/// std::thread::spawn(move || {
///     worker.with(|registry| registry.add_component(e, Health::full(10)));
/// })
/// .join()
/// .unwrap();
///
/// assert!(shared.lock().contains::<Health>(e));
/// ```
#[derive(Clone, Debug, Default)]
pub struct SharedRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl SharedRegistry {
    /// Takes ownership of a registry.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// Blocks until the registry is available.
    pub fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock()
    }

    /// Returns the guard only if nobody else holds it.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Registry>> {
        self.inner.try_lock()
    }

    /// Runs `f` with exclusive access.
    pub fn with<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        let mut registry = self.inner.lock();
        f(&mut registry)
    }

    /// Returns the number of clones sharing this registry.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Recovers the registry if this is the last clone.
    ///
    /// # Errors
    ///
    /// Gives `self` back if other clones are still alive.
    pub fn try_into_inner(self) -> Result<Registry, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}

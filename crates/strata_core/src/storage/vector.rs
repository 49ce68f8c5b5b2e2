//! # Vector Container
//!
//! Dense storage for a single component type: the arena holds back-to-back
//! records of exactly `size_of::<T>()` bytes.

use std::marker::PhantomData;
use std::mem::size_of;

use crate::config::ArenaConfig;
use crate::ecs::{Component, ComponentId, Handle, TypeTag};
use crate::error::{StrataError, StrataResult};
use crate::storage::ComponentContainer;

/// Homogeneous, typed component container.
///
/// # Example
///
/// ```rust
/// use strata_core::{Position, VectorContainer};
///
/// let mut positions = VectorContainer::<Position>::new(16, 0.1);
/// let id = positions.push(Position::new(1.0, 2.0)).unwrap();
/// assert_eq!(positions.get(id), Some(Position::new(1.0, 2.0)));
/// ```
#[derive(Clone, Debug)]
pub struct VectorContainer<T> {
    inner: ComponentContainer,
    _marker: PhantomData<T>,
}

impl<T: Component> VectorContainer<T> {
    /// Creates a container sized for `records` values.
    #[must_use]
    pub fn new(records: usize, fragmentation_threshold: f32) -> Self {
        Self::with_config(&ArenaConfig::for_records(
            records,
            size_of::<T>(),
            fragmentation_threshold,
        ))
    }

    /// Creates a container from an arena config.
    #[must_use]
    pub fn with_config(config: &ArenaConfig) -> Self {
        Self {
            inner: ComponentContainer::new(config),
            _marker: PhantomData,
        }
    }

    /// Stores a value under an explicit id.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::DuplicateRecord`] if the id is taken.
    pub fn insert(&mut self, id: ComponentId, value: T) -> StrataResult<&Handle> {
        let handle = Handle::new(TypeTag::of::<T>(), id);
        self.inner.insert(handle, bytemuck::bytes_of(&value))
    }

    /// Stores a value under a fresh id.
    ///
    /// # Errors
    ///
    /// Propagates arena errors.
    pub fn push(&mut self, value: T) -> StrataResult<ComponentId> {
        self.insert(ComponentId::new(), value).map(Handle::id)
    }

    /// Removes a value and hands it back.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ComponentNotFound`] if the id is absent.
    pub fn remove(&mut self, id: ComponentId) -> StrataResult<T> {
        let (_, bytes) = self.inner.remove(id)?;
        Ok(bytemuck::pod_read_unaligned(&bytes))
    }

    /// Reads a value.
    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<T> {
        self.inner.bytes(id).map(bytemuck::pod_read_unaligned)
    }

    /// Overwrites a value.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ComponentNotFound`] if the id is absent.
    pub fn set(&mut self, id: ComponentId, value: T) -> StrataResult<()> {
        self.inner.write(id, bytemuck::bytes_of(&value))
    }

    /// Returns a value's handle.
    #[must_use]
    pub fn handle(&self, id: ComponentId) -> Option<&Handle> {
        self.inner.handle(id)
    }

    /// Checks if a value is stored under `id`.
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.inner.contains(id)
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Checks if the container is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the occupied arena bytes, holes included.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.inner.arena().raw()
    }

    /// Copies live values out in storage order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        let arena = self.inner.arena();
        arena
            .ordered()
            .into_iter()
            .filter_map(|(_, location)| arena.slice(location))
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    /// Compacts the backing arena.
    pub fn defragment(&mut self) {
        self.inner.defragment();
    }
}

impl<T: Component> Default for VectorContainer<T> {
    fn default() -> Self {
        Self::with_config(&ArenaConfig::default())
    }
}

impl<T: Component> TryFrom<&[T]> for VectorContainer<T> {
    type Error = StrataError;

    fn try_from(values: &[T]) -> StrataResult<Self> {
        let mut container = Self::new(
            values.len().max(1),
            ArenaConfig::DEFAULT_FRAGMENTATION_THRESHOLD,
        );
        for value in values {
            container.push(*value)?;
        }
        Ok(container)
    }
}

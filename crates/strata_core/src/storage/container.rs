//! # General Component Pool
//!
//! Heterogeneous records in one arena, indexed by component id.
//! Every removal checks the fragmentation threshold and, when the arena
//! compacts, rewrites the location of every affected handle.

use std::collections::HashMap;

use crate::config::ArenaConfig;
use crate::ecs::{ComponentId, ComponentState, Handle};
use crate::error::{StrataError, StrataResult};
use crate::memory::{Arena, ArenaStats, Relocations};

/// Arena plus handle registry.
#[derive(Clone, Debug)]
pub struct ComponentContainer {
    arena: Arena<ComponentId>,
    handles: HashMap<ComponentId, Handle>,
}

impl ComponentContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            arena: Arena::from_config(config),
            handles: HashMap::new(),
        }
    }

    /// Materializes a component.
    ///
    /// The handle is placed in the arena and marked as pooled.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::SizeMismatch`] if `bytes` does not match the
    /// handle's type size and [`StrataError::DuplicateRecord`] if the id is
    /// already stored.
    pub fn insert(&mut self, mut handle: Handle, bytes: &[u8]) -> StrataResult<&Handle> {
        if bytes.len() != handle.size() {
            return Err(StrataError::SizeMismatch {
                expected: handle.size(),
                actual: bytes.len(),
            });
        }

        let id = handle.id();
        let location = self.arena.insert(id, bytes)?;
        handle.place(location, ComponentState::Pooled);
        tracing::trace!(component = %id, kind = handle.tag().name(), "pooled");

        Ok(self.handles.entry(id).or_insert(handle))
    }

    /// Removes a component, returning its detached handle and bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ComponentNotFound`] if the id is not stored here.
    pub fn remove(&mut self, id: ComponentId) -> StrataResult<(Handle, Vec<u8>)> {
        let mut handle = self
            .handles
            .remove(&id)
            .ok_or(StrataError::ComponentNotFound(id))?;
        let bytes = self.arena.take(id)?;
        handle.detach();
        tracing::trace!(component = %id, kind = handle.tag().name(), "unpooled");

        if let Some(relocations) = self.arena.defragment_if_needed() {
            self.apply(&relocations);
        }
        Ok((handle, bytes))
    }

    /// Overwrites a component's bytes in place.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ComponentNotFound`] if the id is not stored here
    /// and [`StrataError::SizeMismatch`] on a payload of the wrong size.
    pub fn write(&mut self, id: ComponentId, bytes: &[u8]) -> StrataResult<()> {
        if !self.handles.contains_key(&id) {
            return Err(StrataError::ComponentNotFound(id));
        }
        self.arena.write(id, bytes)
    }

    /// Checks whether a component is stored here. O(1).
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.handles.contains_key(&id)
    }

    /// Returns a component's handle.
    #[inline]
    #[must_use]
    pub fn handle(&self, id: ComponentId) -> Option<&Handle> {
        self.handles.get(&id)
    }

    /// Resolves a component's bytes through its handle.
    #[must_use]
    pub fn bytes(&self, id: ComponentId) -> Option<&[u8]> {
        let location = self.handles.get(&id)?.location()?;
        self.arena.slice(location)
    }

    /// Iterates over every stored handle.
    pub fn handles(&self) -> impl Iterator<Item = &Handle> + '_ {
        self.handles.values()
    }

    /// Compacts unconditionally and patches every handle.
    pub fn defragment(&mut self) -> Relocations<ComponentId> {
        let relocations = self.arena.defragment();
        self.apply(&relocations);
        relocations
    }

    /// Returns the backing arena.
    #[inline]
    #[must_use]
    pub const fn arena(&self) -> &Arena<ComponentId> {
        &self.arena
    }

    /// Returns the number of stored components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Checks if the container is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Returns arena occupancy.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    fn apply(&mut self, relocations: &Relocations<ComponentId>) {
        for (id, location) in relocations {
            if let Some(handle) = self.handles.get_mut(id) {
                handle.relocate(*location);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Health, Position, TypeTag};

    fn pooled<T: crate::Component>(container: &mut ComponentContainer, value: T) -> ComponentId {
        let handle = Handle::new(TypeTag::of::<T>(), ComponentId::new());
        container
            .insert(handle, bytemuck::bytes_of(&value))
            .unwrap()
            .id()
    }

    fn read<T: crate::Component>(container: &ComponentContainer, id: ComponentId) -> T {
        bytemuck::pod_read_unaligned(container.bytes(id).unwrap())
    }

    #[test]
    fn test_insert_and_contains() {
        let mut container = ComponentContainer::new(&ArenaConfig::new(64, 0.1));
        let id = pooled(&mut container, Position::new(1.0, 2.0));

        assert!(container.contains(id));
        assert_eq!(container.handle(id).unwrap().state(), ComponentState::Pooled);
        assert_eq!(read::<Position>(&container, id), Position::new(1.0, 2.0));
    }

    #[test]
    fn test_insert_rejects_wrong_size() {
        let mut container = ComponentContainer::new(&ArenaConfig::default());
        let handle = Handle::new(TypeTag::of::<Position>(), ComponentId::new());
        assert!(matches!(
            container.insert(handle, &[0u8; 3]),
            Err(StrataError::SizeMismatch { expected: 8, actual: 3 })
        ));
    }

    #[test]
    fn test_remove_returns_bytes_and_detaches() {
        let mut container = ComponentContainer::new(&ArenaConfig::default());
        let id = pooled(&mut container, Health::full(30));

        let (handle, bytes) = container.remove(id).unwrap();
        assert!(!handle.is_materialized());
        assert_eq!(bytemuck::pod_read_unaligned::<Health>(&bytes), Health::full(30));
        assert!(!container.contains(id));
        assert!(matches!(
            container.remove(id),
            Err(StrataError::ComponentNotFound(_))
        ));
    }

    #[test]
    fn test_compaction_updates_handles() {
        // 20 records of 8 bytes in 160 bytes: two non-tail removals cross 10%.
        let mut container = ComponentContainer::new(&ArenaConfig::new(160, 0.1));
        let ids: Vec<ComponentId> = (0..20)
            .map(|i| pooled(&mut container, Position::new(i as f32, 0.0)))
            .collect();

        container.remove(ids[0]).unwrap();
        assert_eq!(container.stats().hole_bytes, 8);
        container.remove(ids[1]).unwrap();
        container.remove(ids[2]).unwrap();

        assert_eq!(container.stats().hole_bytes, 0);
        for (i, id) in ids.iter().enumerate().skip(3) {
            assert_eq!(read::<Position>(&container, *id), Position::new(i as f32, 0.0));
        }
        let first = container.handle(ids[3]).unwrap().location().unwrap();
        assert_eq!(first.offset, 0);
    }

    #[test]
    fn test_explicit_defragment_reports_all_live() {
        let mut container = ComponentContainer::new(&ArenaConfig::new(1024, 0.5));
        let a = pooled(&mut container, Position::new(1.0, 1.0));
        let b = pooled(&mut container, Position::new(2.0, 2.0));
        let _c = pooled(&mut container, Position::new(3.0, 3.0));
        container.remove(a).unwrap();

        let relocations = container.defragment();
        assert_eq!(relocations.len(), 2);
        assert_eq!(container.handle(b).unwrap().location(), Some(relocations[&b]));
        assert_eq!(read::<Position>(&container, b), Position::new(2.0, 2.0));
    }

    #[test]
    fn test_write_in_place() {
        let mut container = ComponentContainer::new(&ArenaConfig::default());
        let id = pooled(&mut container, Position::new(0.0, 0.0));
        container
            .write(id, bytemuck::bytes_of(&Position::new(5.0, 6.0)))
            .unwrap();
        assert_eq!(read::<Position>(&container, id), Position::new(5.0, 6.0));
    }
}

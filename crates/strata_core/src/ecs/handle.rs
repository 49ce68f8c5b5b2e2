//! # Component Handles
//!
//! A handle is the only way to reach a component's bytes. It stores a
//! buffer-relative [`Location`] that the owning container rewrites whenever
//! the bytes move, so callers resolve the location at the point of use and
//! never cache addresses.

use std::any::TypeId;

use crate::ecs::{Component, ComponentId, EntityId, GroupId, TypeTag};
use crate::memory::Location;

/// Where a component currently lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ComponentState {
    /// Not stored anywhere.
    #[default]
    Absent,
    /// Stored in the general pool.
    Pooled,
    /// Stored in a group's packed tuple store.
    Grouped(GroupId),
}

/// Stable, typed reference to one component instance.
#[derive(Clone, Debug)]
pub struct Handle {
    tag: TypeTag,
    id: ComponentId,
    location: Option<Location>,
    state: ComponentState,
    owners: Vec<EntityId>,
}

impl Handle {
    /// Creates an unmaterialized handle.
    #[must_use]
    pub fn new(tag: TypeTag, id: ComponentId) -> Self {
        Self {
            tag,
            id,
            location: None,
            state: ComponentState::Absent,
            owners: Vec::with_capacity(1),
        }
    }

    /// Returns the component type tag.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Returns the component's logical id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Returns the record size in bytes.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.tag.size()
    }

    /// Returns the current location, `None` until materialized.
    #[inline]
    #[must_use]
    pub const fn location(&self) -> Option<Location> {
        self.location
    }

    /// Returns which container holds the bytes.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ComponentState {
        self.state
    }

    /// Returns the entities that own this component.
    #[inline]
    #[must_use]
    pub fn owners(&self) -> &[EntityId] {
        &self.owners
    }

    /// Checks if the bytes are stored in an arena.
    #[inline]
    #[must_use]
    pub const fn is_materialized(&self) -> bool {
        self.location.is_some()
    }

    /// Checks the component type.
    #[inline]
    #[must_use]
    pub fn is<T: Component>(&self) -> bool {
        self.tag.id() == TypeId::of::<T>()
    }

    pub(crate) fn place(&mut self, location: Location, state: ComponentState) {
        debug_assert_eq!(location.len, self.size());
        self.location = Some(location);
        self.state = state;
    }

    pub(crate) fn relocate(&mut self, location: Location) {
        debug_assert!(self.location.is_some(), "relocating an unplaced handle");
        self.location = Some(location);
    }

    pub(crate) fn detach(&mut self) {
        self.location = None;
        self.state = ComponentState::Absent;
    }

    pub(crate) fn add_owner(&mut self, entity: EntityId) {
        if !self.owners.contains(&entity) {
            self.owners.push(entity);
        }
    }

    pub(crate) fn remove_owner(&mut self, entity: EntityId) {
        self.owners.retain(|owner| *owner != entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Position, Velocity};

    #[test]
    fn test_new_handle_is_absent() {
        let handle = Handle::new(TypeTag::of::<Position>(), ComponentId::new());
        assert!(!handle.is_materialized());
        assert_eq!(handle.state(), ComponentState::Absent);
        assert!(handle.is::<Position>());
        assert!(!handle.is::<Velocity>());
    }

    #[test]
    fn test_place_relocate_detach() {
        let mut handle = Handle::new(TypeTag::of::<Position>(), ComponentId::new());
        handle.place(Location::new(0, 8), ComponentState::Pooled);
        assert_eq!(handle.location(), Some(Location::new(0, 8)));

        handle.relocate(Location::new(16, 8));
        assert_eq!(handle.location(), Some(Location::new(16, 8)));
        assert_eq!(handle.state(), ComponentState::Pooled);

        handle.detach();
        assert!(handle.location().is_none());
        assert_eq!(handle.state(), ComponentState::Absent);
    }

    #[test]
    fn test_owner_list_has_no_duplicates() {
        let mut handle = Handle::new(TypeTag::of::<Position>(), ComponentId::new());
        let owner = EntityId::new();
        handle.add_owner(owner);
        handle.add_owner(owner);
        assert_eq!(handle.owners(), &[owner]);

        handle.remove_owner(owner);
        assert!(handle.owners().is_empty());
    }
}

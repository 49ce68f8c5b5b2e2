//! # Tuple Container
//!
//! Group storage. Each qualifying entity owns one packed row: the
//! concatenation of its member components' bytes in declaration order.
//!
//! ```text
//! row(e1)                 row(e2)
//! | Position | Velocity | | Position | Velocity | ...
//! ^ base     ^ base + 8
//! ```
//!
//! A member handle's location is `row base + slot offset`. Compaction moves
//! whole rows, so every member of a moved row is patched together.

use std::any::TypeId;
use std::collections::HashMap;

use crate::config::ArenaConfig;
use crate::ecs::{ComponentId, ComponentState, EntityId, GroupId, Handle, TypeTag};
use crate::error::{StrataError, StrataResult};
use crate::memory::{Arena, ArenaStats, Location, Relocations};

/// Slot offsets of a packed row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TupleLayout {
    tags: Vec<TypeTag>,
    offsets: Vec<usize>,
    row_size: usize,
}

impl TupleLayout {
    /// Lays out `tags` back to back without padding.
    #[must_use]
    pub fn new(tags: &[TypeTag]) -> Self {
        let mut offsets = Vec::with_capacity(tags.len());
        let mut row_size = 0;
        for tag in tags {
            offsets.push(row_size);
            row_size += tag.size();
        }
        Self {
            tags: tags.to_vec(),
            offsets,
            row_size,
        }
    }

    /// Returns the member type tags in declaration order.
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    /// Returns the byte size of one row.
    #[inline]
    #[must_use]
    pub const fn row_size(&self) -> usize {
        self.row_size
    }

    /// Returns the number of slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Checks if the layout has no slots.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Returns the slot index of a type.
    #[must_use]
    pub fn slot_of(&self, type_id: TypeId) -> Option<usize> {
        self.tags.iter().position(|tag| tag.id() == type_id)
    }

    /// Returns the location of a slot inside a row placed at `row`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    #[inline]
    #[must_use]
    pub fn slot_location(&self, row: Location, slot: usize) -> Location {
        Location::new(row.offset + self.offsets[slot], self.tags[slot].size())
    }
}

/// Packed multi-type row store.
#[derive(Clone, Debug)]
pub struct TupleContainer {
    group: GroupId,
    layout: TupleLayout,
    arena: Arena<EntityId>,
    /// Member handles per row, in slot order.
    rows: HashMap<EntityId, Vec<Handle>>,
    /// Component id -> owning row.
    index: HashMap<ComponentId, EntityId>,
}

impl TupleContainer {
    /// Creates an empty row store.
    #[must_use]
    pub fn new(group: GroupId, layout: TupleLayout, config: &ArenaConfig) -> Self {
        Self {
            group,
            layout,
            arena: Arena::from_config(config),
            rows: HashMap::new(),
            index: HashMap::new(),
        }
    }

    /// Returns the owning group id.
    #[inline]
    #[must_use]
    pub const fn group(&self) -> GroupId {
        self.group
    }

    /// Returns the row layout.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &TupleLayout {
        &self.layout
    }

    /// Writes one row for `entity` from all member components at once.
    ///
    /// `members` must be in slot order. Every handle is placed inside the new
    /// row and marked as grouped.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::SizeMismatch`] if the member count or any
    /// payload size disagrees with the layout, and
    /// [`StrataError::DuplicateRecord`] if the entity already has a row.
    pub fn insert(&mut self, entity: EntityId, members: Vec<(Handle, Vec<u8>)>) -> StrataResult<()> {
        if members.len() != self.layout.len() {
            return Err(StrataError::SizeMismatch {
                expected: self.layout.len(),
                actual: members.len(),
            });
        }

        let mut row = Vec::with_capacity(self.layout.row_size());
        for ((handle, bytes), tag) in members.iter().zip(self.layout.tags()) {
            debug_assert_eq!(handle.tag(), *tag, "member out of slot order");
            if bytes.len() != tag.size() {
                return Err(StrataError::SizeMismatch {
                    expected: tag.size(),
                    actual: bytes.len(),
                });
            }
            row.extend_from_slice(bytes);
        }

        let base = self.arena.insert(entity, &row)?;
        let mut handles = Vec::with_capacity(members.len());
        for (slot, (mut handle, _)) in members.into_iter().enumerate() {
            handle.place(
                self.layout.slot_location(base, slot),
                ComponentState::Grouped(self.group),
            );
            self.index.insert(handle.id(), entity);
            handles.push(handle);
        }
        self.rows.insert(entity, handles);
        Ok(())
    }

    /// Removes an entity's whole row.
    ///
    /// Returns every member's detached handle with its bytes, in slot order.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownRecord`] if the entity has no row.
    pub fn remove(&mut self, entity: EntityId) -> StrataResult<Vec<(Handle, Vec<u8>)>> {
        let handles = self.rows.remove(&entity).ok_or(StrataError::UnknownRecord)?;
        let row = self.arena.take(entity)?;

        let whole = Location::new(0, row.len());
        let mut members = Vec::with_capacity(handles.len());
        for (slot, mut handle) in handles.into_iter().enumerate() {
            self.index.remove(&handle.id());
            let bytes = row[self.layout.slot_location(whole, slot).range()].to_vec();
            handle.detach();
            members.push((handle, bytes));
        }

        if let Some(relocations) = self.arena.defragment_if_needed() {
            self.apply(&relocations);
        }
        Ok(members)
    }

    /// Overwrites one member's bytes in place.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ComponentNotFound`] if the component is not in
    /// any row and [`StrataError::SizeMismatch`] on a payload of the wrong size.
    pub fn write(&mut self, id: ComponentId, bytes: &[u8]) -> StrataResult<()> {
        let location = self
            .handle(id)
            .and_then(Handle::location)
            .ok_or(StrataError::ComponentNotFound(id))?;
        if location.len != bytes.len() {
            return Err(StrataError::SizeMismatch {
                expected: location.len,
                actual: bytes.len(),
            });
        }
        let target = self
            .arena
            .slice_mut(location)
            .ok_or(StrataError::ComponentNotFound(id))?;
        target.copy_from_slice(bytes);
        Ok(())
    }

    /// Returns a member handle.
    #[must_use]
    pub fn handle(&self, id: ComponentId) -> Option<&Handle> {
        let entity = self.index.get(&id)?;
        self.rows.get(entity)?.iter().find(|handle| handle.id() == id)
    }

    /// Returns every member handle of a row, in slot order.
    #[must_use]
    pub fn handles(&self, entity: EntityId) -> Option<&[Handle]> {
        self.rows.get(&entity).map(Vec::as_slice)
    }

    /// Resolves a member's bytes through its handle.
    #[must_use]
    pub fn bytes(&self, id: ComponentId) -> Option<&[u8]> {
        let location = self.handle(id)?.location()?;
        self.arena.slice(location)
    }

    /// Returns an entity's packed row.
    #[must_use]
    pub fn row(&self, entity: EntityId) -> Option<&[u8]> {
        self.arena.get(entity)
    }

    /// Returns the occupied buffer, holes included.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        self.arena.raw()
    }

    /// Iterates over entities with a row.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.rows.keys().copied()
    }

    /// Checks if an entity has a row.
    #[inline]
    #[must_use]
    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.rows.contains_key(&entity)
    }

    /// Checks if a component is stored in some row.
    #[inline]
    #[must_use]
    pub fn contains_component(&self, id: ComponentId) -> bool {
        self.index.contains_key(&id)
    }

    /// Returns the number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Checks if no row is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of stored member components.
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.index.len()
    }

    /// Compacts unconditionally and patches every member handle.
    pub fn defragment(&mut self) -> Relocations<EntityId> {
        let relocations = self.arena.defragment();
        self.apply(&relocations);
        relocations
    }

    /// Returns arena occupancy.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    fn apply(&mut self, relocations: &Relocations<EntityId>) {
        for (entity, base) in relocations {
            if let Some(handles) = self.rows.get_mut(entity) {
                for (slot, handle) in handles.iter_mut().enumerate() {
                    handle.relocate(self.layout.slot_location(*base, slot));
                }
            }
        }
    }
}

//! # Groups
//!
//! A group owns a packed store for entities that carry every type of its
//! signature. Entities enter the store only with a complete set of members,
//! so a group row is never partial.

use std::any::TypeId;

use crate::config::ArenaConfig;
use crate::ecs::{ComponentId, ComponentSet, Entity, EntityId, GroupId, Handle, TypeTag};
use crate::error::{StrataError, StrataResult};
use crate::memory::{ArenaStats, Relocations};
use crate::storage::{TupleContainer, TupleLayout};

/// Ordered, duplicate-free list of component types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupSignature {
    tags: Vec<TypeTag>,
}

impl GroupSignature {
    /// Validates a type list.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::EmptyGroup`] for an empty list and
    /// [`StrataError::DuplicateGroupType`] if a type appears twice.
    pub fn new(tags: Vec<TypeTag>) -> StrataResult<Self> {
        if tags.is_empty() {
            return Err(StrataError::EmptyGroup);
        }
        for (i, tag) in tags.iter().enumerate() {
            if tags[..i].contains(tag) {
                return Err(StrataError::DuplicateGroupType(tag.name()));
            }
        }
        Ok(Self { tags })
    }

    /// Builds the signature of a component tuple.
    ///
    /// # Errors
    ///
    /// Same as [`GroupSignature::new`].
    pub fn of<S: ComponentSet>() -> StrataResult<Self> {
        Self::new(S::type_tags())
    }

    /// Returns the member tags in declaration order.
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    /// Returns the number of member types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Always false: empty signatures are rejected on construction.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Checks if a type is a member.
    #[must_use]
    pub fn contains_type(&self, type_id: TypeId) -> bool {
        self.tags.iter().any(|tag| tag.id() == type_id)
    }

    /// Checks if an entity carries every member type.
    #[must_use]
    pub fn is_satisfied_by(&self, entity: &Entity) -> bool {
        self.tags.iter().all(|tag| entity.contains_type(tag.id()))
    }

    /// Returns the member names, for logs.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.tags.iter().map(TypeTag::name).collect()
    }
}

/// A declared group and its packed store.
#[derive(Clone, Debug)]
pub struct Group {
    id: GroupId,
    signature: GroupSignature,
    storage: TupleContainer,
}

impl Group {
    /// Creates an empty group with room for `initial_records` rows.
    pub(crate) fn new(signature: GroupSignature, initial_records: usize, threshold: f32) -> Self {
        let id = GroupId::new();
        let layout = TupleLayout::new(signature.tags());
        let config = ArenaConfig::for_records(initial_records, layout.row_size(), threshold);
        Self {
            id,
            storage: TupleContainer::new(id, layout, &config),
            signature,
        }
    }

    /// Returns the group id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    /// Returns the signature.
    #[inline]
    #[must_use]
    pub const fn signature(&self) -> &GroupSignature {
        &self.signature
    }

    /// Returns the packed store.
    #[inline]
    #[must_use]
    pub const fn storage(&self) -> &TupleContainer {
        &self.storage
    }

    /// Returns the packed buffer, holes included.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        self.storage.raw()
    }

    /// Returns one entity's packed row.
    #[must_use]
    pub fn row(&self, entity: EntityId) -> Option<&[u8]> {
        self.storage.row(entity)
    }

    /// Returns a member handle.
    #[must_use]
    pub fn handle(&self, id: ComponentId) -> Option<&Handle> {
        self.storage.handle(id)
    }

    /// Returns every member handle of one entity, in declaration order.
    #[must_use]
    pub fn handles(&self, entity: EntityId) -> Option<&[Handle]> {
        self.storage.handles(entity)
    }

    /// Iterates over member entities.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.storage.entities()
    }

    /// Checks if an entity is stored here.
    #[must_use]
    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.storage.contains_entity(entity)
    }

    /// Checks if a component is stored here.
    #[must_use]
    pub fn contains_component(&self, id: ComponentId) -> bool {
        self.storage.contains_component(id)
    }

    /// Returns the number of member entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Checks if no entity is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Returns store occupancy.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.storage.stats()
    }

    pub(crate) fn bytes(&self, id: ComponentId) -> Option<&[u8]> {
        self.storage.bytes(id)
    }

    pub(crate) fn write(&mut self, id: ComponentId, bytes: &[u8]) -> StrataResult<()> {
        self.storage.write(id, bytes)
    }

    /// Stores a complete member set for an entity.
    pub(crate) fn insert_new(
        &mut self,
        entity: EntityId,
        members: Vec<(Handle, Vec<u8>)>,
    ) -> StrataResult<()> {
        self.storage.insert(entity, members)
    }

    /// Takes an entity's whole row out of the store.
    pub(crate) fn take(&mut self, entity: EntityId) -> StrataResult<Vec<(Handle, Vec<u8>)>> {
        self.storage.remove(entity)
    }

    pub(crate) fn defragment(&mut self) -> Relocations<EntityId> {
        self.storage.defragment()
    }
}

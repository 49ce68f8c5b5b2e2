//! # Registry
//!
//! The single owner and mutator of all entities, handles and containers.
//!
//! Every (entity, component type) pair is in one of three states:
//!
//! ```text
//!           add (no group completed)
//! Absent ─────────────────────────────▶ Pooled
//!   │                                     │  add of the last missing member
//!   │ add completes a group               ▼  promotes the whole set
//!   └───────────────────────────────▶ Grouped(g)
//!
//! destroy: Pooled ─▶ Absent
//!          Grouped(g) ─▶ Absent, surviving members of the row ─▶ Pooled
//! ```
//!
//! The registry holds no locks. Exactly one caller may use it at a time;
//! share it across threads through [`SharedRegistry`](crate::SharedRegistry).
//!
//! Every precondition check has a fallible `try_*` form. The plain form
//! panics with the same message.

use std::any::TypeId;
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::config::RegistryConfig;
use crate::ecs::{
    Component, ComponentId, ComponentSet, ComponentState, Entity, EntityId, Group, GroupId,
    GroupSignature, Handle, TypeTag, View, ViewCursor,
};
use crate::error::{StrataError, StrataResult};
use crate::memory::ArenaStats;
use crate::storage::ComponentContainer;

/// Occupancy counters for a registry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RegistryStats {
    /// Live entities.
    pub entities: usize,
    /// Live components, pooled plus grouped.
    pub components: usize,
    /// Components stored in the general pool.
    pub pooled: usize,
    /// Components stored in group rows.
    pub grouped: usize,
    /// Declared groups.
    pub groups: usize,
    /// General pool arena.
    pub pool: ArenaStats,
}

/// Entity-component store.
///
/// # Example
///
/// ```rust
/// use strata_core::{Position, Registry, Velocity};
///
/// let mut registry = Registry::new();
/// registry.declare_group::<(Position, Velocity)>();
///
/// let e = registry.create_entity();
/// registry.add_component(e, Position::new(1.0, 2.0));
/// registry.add_component(e, Velocity::new(0.5, 0.0));
///
/// for entry in registry.view::<(Position, Velocity)>() {
///     let (position, velocity) = entry.values();
///     assert_eq!(position.x + velocity.x, 1.5);
/// }
/// ```
#[derive(Debug)]
pub struct Registry {
    config: RegistryConfig,
    entities: HashMap<EntityId, Entity>,
    pool: ComponentContainer,
    groups: HashMap<GroupId, Group>,
    /// Component type -> the one group that claims it.
    grouped_types: HashMap<TypeId, GroupId>,
}

impl Registry {
    /// Creates a registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(RegistryConfig::default())
    }

    /// Creates a registry from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn with_config(config: RegistryConfig) -> StrataResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RegistryConfig) -> Self {
        Self {
            pool: ComponentContainer::new(&config.pool),
            config,
            entities: HashMap::new(),
            groups: HashMap::new(),
            grouped_types: HashMap::new(),
        }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Creates an empty entity.
    pub fn create_entity(&mut self) -> EntityId {
        self.spawn(None)
    }

    /// Creates an empty entity with a name.
    pub fn create_named_entity(&mut self, name: impl Into<String>) -> EntityId {
        self.spawn(Some(name.into()))
    }

    fn spawn(&mut self, name: Option<String>) -> EntityId {
        let id = EntityId::new();
        self.entities.insert(id, Entity::new(id, name));
        trace!(entity = %id, "entity created");
        id
    }

    /// Destroys an entity and every component it owns.
    ///
    /// The entity is unlinked from its parent. Its children lose their
    /// parent link but keep their components.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownEntity`] if the entity does not exist.
    pub fn try_destroy_entity(&mut self, entity: EntityId) -> StrataResult<()> {
        let tags: Vec<TypeTag> = self
            .entity_ref(entity)?
            .components()
            .map(|(tag, _)| tag)
            .collect();
        for tag in tags {
            self.detach_component(entity, tag)?;
        }

        let Some(record) = self.entities.remove(&entity) else {
            return Err(StrataError::UnknownEntity(entity));
        };
        if let Some(parent) = record.parent().and_then(|id| self.entities.get_mut(&id)) {
            parent.remove_child(entity);
        }
        for child in record.children() {
            if let Some(child) = self.entities.get_mut(&child) {
                child.set_parent(None);
            }
        }
        trace!(entity = %entity, "entity destroyed");
        Ok(())
    }

    /// Destroys an entity and every component it owns.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist.
    pub fn destroy_entity(&mut self, entity: EntityId) {
        self.try_destroy_entity(entity)
            .unwrap_or_else(|err| panic!("{err}"));
    }

    /// Returns an entity.
    #[inline]
    #[must_use]
    pub fn entity(&self, entity: EntityId) -> Option<&Entity> {
        self.entities.get(&entity)
    }

    /// Checks if an entity exists.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Iterates over every entity in map order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns the number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn entity_ref(&self, entity: EntityId) -> StrataResult<&Entity> {
        self.entities
            .get(&entity)
            .ok_or(StrataError::UnknownEntity(entity))
    }

    pub(crate) fn entity_map(&self) -> &HashMap<EntityId, Entity> {
        &self.entities
    }

    // ------------------------------------------------------------------
    // Hierarchy
    // ------------------------------------------------------------------

    /// Links `child` under `parent`, moving it away from any previous parent.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::SelfParent`] if both ids are equal and
    /// [`StrataError::UnknownEntity`] if either does not exist.
    pub fn try_add_child(&mut self, parent: EntityId, child: EntityId) -> StrataResult<()> {
        if parent == child {
            return Err(StrataError::SelfParent(child));
        }
        self.entity_ref(parent)?;
        let previous = self
            .entities
            .get_mut(&child)
            .ok_or(StrataError::UnknownEntity(child))?
            .set_parent(Some(parent));

        if let Some(previous) = previous.and_then(|id| self.entities.get_mut(&id)) {
            previous.remove_child(child);
        }
        if let Some(parent) = self.entities.get_mut(&parent) {
            parent.add_child(child);
        }
        Ok(())
    }

    /// Links `child` under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if the ids are equal or either entity does not exist.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) {
        self.try_add_child(parent, child)
            .unwrap_or_else(|err| panic!("{err}"));
    }

    /// Removes the edge between `parent` and `child`.
    ///
    /// Returns whether the edge existed. The child itself is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownEntity`] if `parent` does not exist.
    pub fn try_remove_child(&mut self, parent: EntityId, child: EntityId) -> StrataResult<bool> {
        let removed = self
            .entities
            .get_mut(&parent)
            .ok_or(StrataError::UnknownEntity(parent))?
            .remove_child(child);
        if removed {
            if let Some(child) = self.entities.get_mut(&child) {
                child.set_parent(None);
            }
        }
        Ok(removed)
    }

    /// Removes the edge between `parent` and `child`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not exist.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        self.try_remove_child(parent, child)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Iterates over the children of an entity. Empty for unknown ids.
    pub fn children(&self, entity: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .get(&entity)
            .into_iter()
            .flat_map(Entity::children)
    }

    /// Returns the parent of an entity.
    #[must_use]
    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.entities.get(&entity).and_then(Entity::parent)
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Attaches a component to an entity.
    ///
    /// If this addition completes a declared group's signature, every member
    /// of that signature is promoted into the group's store together with
    /// the new component. Otherwise the component lands in the general pool.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownEntity`] if the entity does not exist and
    /// [`StrataError::DuplicateComponent`] if it already has a `T`.
    pub fn try_add_component<T: Component>(
        &mut self,
        entity: EntityId,
        value: T,
    ) -> StrataResult<ComponentId> {
        let tag = TypeTag::of::<T>();
        let record = self
            .entities
            .get_mut(&entity)
            .ok_or(StrataError::UnknownEntity(entity))?;
        if record.contains_type(tag.id()) {
            return Err(StrataError::DuplicateComponent {
                entity,
                component: T::NAME,
            });
        }

        let mut handle = Handle::new(tag, ComponentId::new());
        let id = handle.id();
        record.added_component(&mut handle);

        let record: &Entity = record;
        let completed = self.grouped_types.get(&tag.id()).copied().filter(|group| {
            self.groups
                .get(group)
                .is_some_and(|group| group.signature().is_satisfied_by(record))
        });

        let bytes = bytemuck::bytes_of(&value);
        let stored = match completed {
            Some(group) => self.promote(entity, group, Some((handle, bytes.to_vec()))),
            None => self.pool.insert(handle, bytes).map(drop),
        };
        if let Err(err) = stored {
            if let Some(record) = self.entities.get_mut(&entity) {
                record.forget_component(tag.id());
            }
            return Err(err);
        }
        Ok(id)
    }

    /// Attaches a component to an entity.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist or already has a `T`.
    pub fn add_component<T: Component>(&mut self, entity: EntityId, value: T) -> ComponentId {
        self.try_add_component(entity, value)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Detaches a component and hands its value back.
    ///
    /// A grouped component demotes its row: the surviving members return to
    /// the general pool.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownEntity`], [`StrataError::MissingComponent`]
    /// or [`StrataError::ComponentNotFound`] if no container holds it.
    pub fn try_remove_component<T: Component>(&mut self, entity: EntityId) -> StrataResult<T> {
        let (_, bytes) = self.detach_component(entity, TypeTag::of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(&bytes))
    }

    /// Detaches a component and hands its value back.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist or has no `T`.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> T {
        self.try_remove_component(entity)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Detaches and drops a component.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::try_remove_component`].
    pub fn try_destroy_component<T: Component>(&mut self, entity: EntityId) -> StrataResult<()> {
        self.detach_component(entity, TypeTag::of::<T>()).map(drop)
    }

    /// Detaches and drops a component.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist or has no `T`.
    pub fn destroy_component<T: Component>(&mut self, entity: EntityId) {
        self.try_destroy_component::<T>(entity)
            .unwrap_or_else(|err| panic!("{err}"));
    }

    /// Detaches and drops a component named by its id.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownEntity`] if the entity does not exist and
    /// [`StrataError::ComponentNotFound`] if it does not own `component`.
    pub fn try_destroy_component_by_id(
        &mut self,
        entity: EntityId,
        component: ComponentId,
    ) -> StrataResult<()> {
        let tag = self
            .entity_ref(entity)?
            .type_tag_of(component)
            .ok_or(StrataError::ComponentNotFound(component))?;
        self.detach_component(entity, tag).map(drop)
    }

    /// Detaches and drops a component named by its id.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist or does not own `component`.
    pub fn destroy_component_by_id(&mut self, entity: EntityId, component: ComponentId) {
        self.try_destroy_component_by_id(entity, component)
            .unwrap_or_else(|err| panic!("{err}"));
    }

    /// Checks if an entity owns a `T`. False for unknown entities.
    #[inline]
    #[must_use]
    pub fn contains<T: Component>(&self, entity: EntityId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(Entity::contains::<T>)
    }

    /// Checks if an entity owns every type of a set. False for unknown entities.
    #[must_use]
    pub fn contains_all<S: ComponentSet>(&self, entity: EntityId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|record| record.contains_all(&S::type_ids()))
    }

    /// Resolves the handle of an entity's `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownEntity`], [`StrataError::MissingComponent`]
    /// or [`StrataError::ComponentNotFound`].
    pub fn try_handle<T: Component>(&self, entity: EntityId) -> StrataResult<&Handle> {
        let id = self.component_id_of::<T>(entity)?;
        self.locate(TypeId::of::<T>(), id)
            .map(|(handle, _)| handle)
            .ok_or(StrataError::ComponentNotFound(id))
    }

    /// Resolves the handle of an entity's `T`.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist or has no `T`.
    #[must_use]
    pub fn handle<T: Component>(&self, entity: EntityId) -> &Handle {
        self.try_handle::<T>(entity)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Looks up any live handle by component id.
    #[must_use]
    pub fn handle_by_id(&self, id: ComponentId) -> Option<&Handle> {
        self.pool
            .handle(id)
            .or_else(|| self.groups.values().find_map(|group| group.handle(id)))
    }

    /// Resolves every handle of a set.
    ///
    /// # Errors
    ///
    /// Fails with the first missing component.
    pub fn try_handles<S: ComponentSet>(&self, entity: EntityId) -> StrataResult<S::Handles<'_>> {
        S::fetch_handles(self, entity)
    }

    /// Resolves every handle of a set.
    ///
    /// # Panics
    ///
    /// Panics if any member is missing.
    #[must_use]
    pub fn handles<S: ComponentSet>(&self, entity: EntityId) -> S::Handles<'_> {
        self.try_handles::<S>(entity)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Reads an entity's `T` through its current handle.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownEntity`], [`StrataError::MissingComponent`]
    /// or [`StrataError::ComponentNotFound`].
    pub fn try_component<T: Component>(&self, entity: EntityId) -> StrataResult<T> {
        let id = self.component_id_of::<T>(entity)?;
        self.locate(TypeId::of::<T>(), id)
            .map(|(_, bytes)| bytemuck::pod_read_unaligned(bytes))
            .ok_or(StrataError::ComponentNotFound(id))
    }

    /// Reads an entity's `T` through its current handle.
    ///
    /// Check [`Registry::contains`] first unless absence is a bug.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist or has no `T`.
    #[must_use]
    pub fn component<T: Component>(&self, entity: EntityId) -> T {
        self.try_component::<T>(entity)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Reads every value of a set.
    ///
    /// # Errors
    ///
    /// Fails with the first missing component.
    pub fn try_components<S: ComponentSet>(&self, entity: EntityId) -> StrataResult<S::Values> {
        S::fetch(self, entity)
    }

    /// Reads every value of a set.
    ///
    /// # Panics
    ///
    /// Panics if any member is missing.
    #[must_use]
    pub fn components<S: ComponentSet>(&self, entity: EntityId) -> S::Values {
        self.try_components::<S>(entity)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Overwrites an existing `T` in place, wherever it is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownEntity`] or
    /// [`StrataError::MissingComponent`]. Use [`Registry::try_add_component`]
    /// to attach a new component.
    pub fn try_set_component<T: Component>(&mut self, entity: EntityId, value: T) -> StrataResult<()> {
        let id = self.component_id_of::<T>(entity)?;
        let bytes = bytemuck::bytes_of(&value);
        match self.owning_group(TypeId::of::<T>(), id) {
            Some(group) => self
                .groups
                .get_mut(&group)
                .ok_or(StrataError::UnknownGroup(group))?
                .write(id, bytes),
            None => self.pool.write(id, bytes),
        }
    }

    /// Overwrites an existing `T` in place.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist or has no `T`.
    pub fn set_component<T: Component>(&mut self, entity: EntityId, value: T) {
        self.try_set_component(entity, value)
            .unwrap_or_else(|err| panic!("{err}"));
    }

    /// Read-modify-writes an entity's `T` and returns the new value.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::try_set_component`].
    pub fn try_update_component<T: Component>(
        &mut self,
        entity: EntityId,
        update: impl FnOnce(&mut T),
    ) -> StrataResult<T> {
        let mut value = self.try_component::<T>(entity)?;
        update(&mut value);
        self.try_set_component(entity, value)?;
        Ok(value)
    }

    /// Read-modify-writes an entity's `T`.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist or has no `T`.
    pub fn update_component<T: Component>(&mut self, entity: EntityId, update: impl FnOnce(&mut T)) -> T {
        self.try_update_component(entity, update)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Reports where an entity's `T` currently lives.
    #[must_use]
    pub fn component_state<T: Component>(&self, entity: EntityId) -> ComponentState {
        self.try_handle::<T>(entity)
            .map_or(ComponentState::Absent, Handle::state)
    }

    fn component_id_of<T: Component>(&self, entity: EntityId) -> StrataResult<ComponentId> {
        self.entity_ref(entity)?
            .component_id::<T>()
            .ok_or(StrataError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    /// Group that currently stores `id`, if any.
    fn owning_group(&self, type_id: TypeId, id: ComponentId) -> Option<GroupId> {
        self.grouped_types.get(&type_id).copied().filter(|group| {
            self.groups
                .get(group)
                .is_some_and(|group| group.contains_component(id))
        })
    }

    /// Handle and bytes of a component, from whichever container holds it.
    fn locate(&self, type_id: TypeId, id: ComponentId) -> Option<(&Handle, &[u8])> {
        match self.owning_group(type_id, id).and_then(|group| self.groups.get(&group)) {
            Some(group) => Some((group.handle(id)?, group.bytes(id)?)),
            None => Some((self.pool.handle(id)?, self.pool.bytes(id)?)),
        }
    }

    /// Removes a component from its container and from its entity.
    fn detach_component(&mut self, entity: EntityId, tag: TypeTag) -> StrataResult<(Handle, Vec<u8>)> {
        let id = self
            .entity_ref(entity)?
            .component_id_of(tag.id())
            .ok_or(StrataError::MissingComponent {
                entity,
                component: tag.name(),
            })?;

        let (mut handle, bytes) = match self.owning_group(tag.id(), id) {
            Some(group) => self.demote(entity, group, id)?,
            None if self.pool.contains(id) => self.pool.remove(id)?,
            None => return Err(StrataError::ComponentNotFound(id)),
        };

        if let Some(record) = self.entities.get_mut(&entity) {
            record.removed_component(&mut handle);
        }
        trace!(entity = %entity, component = %id, kind = tag.name(), "component detached");
        Ok((handle, bytes))
    }

    /// Moves an entity's complete member set into a group's store.
    ///
    /// `incoming` is a component that is not stored anywhere yet; every
    /// other member is taken out of the general pool.
    fn promote(
        &mut self,
        entity: EntityId,
        group: GroupId,
        mut incoming: Option<(Handle, Vec<u8>)>,
    ) -> StrataResult<()> {
        let tags = self
            .groups
            .get(&group)
            .ok_or(StrataError::UnknownGroup(group))?
            .signature()
            .tags()
            .to_vec();
        let record = self.entity_ref(entity)?;
        let ids = tags
            .iter()
            .map(|tag| {
                record
                    .component_id_of(tag.id())
                    .ok_or(StrataError::MissingComponent {
                        entity,
                        component: tag.name(),
                    })
            })
            .collect::<StrataResult<Vec<ComponentId>>>()?;

        // Pooled members taken so far go back if a later one is missing.
        let incoming_id = incoming.as_ref().map(|(handle, _)| handle.id());
        let mut members: Vec<(Handle, Vec<u8>)> = Vec::with_capacity(ids.len());
        for id in ids {
            let member = match incoming.take() {
                Some(pending) if pending.0.id() == id => pending,
                other => {
                    incoming = other;
                    match self.pool.remove(id) {
                        Ok(member) => member,
                        Err(err) => {
                            for (handle, bytes) in members {
                                if Some(handle.id()) != incoming_id {
                                    self.pool.insert(handle, &bytes)?;
                                }
                            }
                            return Err(err);
                        }
                    }
                }
            };
            members.push(member);
        }

        self.groups
            .get_mut(&group)
            .ok_or(StrataError::UnknownGroup(group))?
            .insert_new(entity, members)?;
        debug!(entity = %entity, group = %group, "entity promoted");
        Ok(())
    }

    /// Takes an entity's row out of a group, returning `removed` and
    /// putting every other member back into the general pool.
    fn demote(
        &mut self,
        entity: EntityId,
        group: GroupId,
        removed: ComponentId,
    ) -> StrataResult<(Handle, Vec<u8>)> {
        let members = self
            .groups
            .get_mut(&group)
            .ok_or(StrataError::UnknownGroup(group))?
            .take(entity)?;

        let mut detached = None;
        for (handle, bytes) in members {
            if handle.id() == removed {
                detached = Some((handle, bytes));
            } else {
                self.pool.insert(handle, &bytes)?;
            }
        }
        debug!(entity = %entity, group = %group, "entity demoted");
        detached.ok_or(StrataError::ComponentNotFound(removed))
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Declares a group over a component tuple.
    ///
    /// Entities that already carry the whole signature are migrated from the
    /// general pool into the new store.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::EmptyGroup`], [`StrataError::DuplicateGroupType`]
    /// or [`StrataError::TypeAlreadyGrouped`].
    pub fn try_declare_group<S: ComponentSet>(&mut self) -> StrataResult<GroupId> {
        self.try_declare_group_with(S::type_tags())
    }

    /// Declares a group over a component tuple.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate type or a type claimed by another group.
    pub fn declare_group<S: ComponentSet>(&mut self) -> GroupId {
        self.try_declare_group::<S>()
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Declares a group from runtime type tags.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::try_declare_group`].
    pub fn try_declare_group_with(&mut self, tags: Vec<TypeTag>) -> StrataResult<GroupId> {
        let signature = GroupSignature::new(tags)?;
        for tag in signature.tags() {
            if let Some(&group) = self.grouped_types.get(&tag.id()) {
                return Err(StrataError::TypeAlreadyGrouped {
                    component: tag.name(),
                    group,
                });
            }
        }

        let qualifying: Vec<EntityId> = self
            .entities
            .values()
            .filter(|record| signature.is_satisfied_by(record))
            .map(Entity::id)
            .collect();
        let names = signature.names();

        let group = Group::new(
            signature,
            self.config.group_initial_records,
            self.config.group_fragmentation_threshold,
        );
        let id = group.id();
        for tag in group.signature().tags() {
            self.grouped_types.insert(tag.id(), id);
        }
        self.groups.insert(id, group);

        for entity in &qualifying {
            self.promote(*entity, id, None)?;
        }
        debug!(group = %id, types = ?names, migrated = qualifying.len(), "group declared");
        Ok(id)
    }

    /// Returns a declared group.
    #[inline]
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Returns the group that claims `T`.
    #[must_use]
    pub fn group_of<T: Component>(&self) -> Option<&Group> {
        self.grouped_types
            .get(&TypeId::of::<T>())
            .and_then(|id| self.groups.get(id))
    }

    /// Iterates over every declared group.
    pub fn groups(&self) -> impl Iterator<Item = &Group> + '_ {
        self.groups.values()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Lazy iterator over entities carrying every type of `S`.
    #[must_use]
    pub fn view<S: ComponentSet>(&self) -> View<'_, S> {
        View::new(self)
    }

    /// Lazy iterator over entities carrying every type of `S` that also
    /// pass `predicate`.
    #[must_use]
    pub fn view_filtered<'r, S, F>(&'r self, predicate: F) -> View<'r, S>
    where
        S: ComponentSet,
        F: Fn(&Entity) -> bool + 'r,
    {
        View::new(self).filter_by(predicate)
    }

    /// Restartable cursor that tolerates mutation between steps.
    #[must_use]
    pub fn cursor<S: ComponentSet>(&self) -> ViewCursor<S> {
        ViewCursor::new(self)
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Compacts the general pool and every group store.
    pub fn defragment(&mut self) {
        self.pool.defragment();
        for group in self.groups.values_mut() {
            group.defragment();
        }
    }

    /// Returns the general pool.
    #[inline]
    #[must_use]
    pub const fn pool(&self) -> &ComponentContainer {
        &self.pool
    }

    /// Returns occupancy counters.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let grouped: usize = self
            .groups
            .values()
            .map(|group| group.storage().component_count())
            .sum();
        RegistryStats {
            entities: self.entities.len(),
            components: self.pool.len() + grouped,
            pooled: self.pool.len(),
            grouped,
            groups: self.groups.len(),
            pool: self.pool.stats(),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

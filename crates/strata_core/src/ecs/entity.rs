//! # Entity Management
//!
//! An entity owns no bytes. It maps each component type it carries to the
//! logical id of that component, and records parent/child edges of a
//! lightweight scene graph. Edges are naming only: unlinking never frees
//! the child.

use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};

use crate::ecs::{Component, ComponentId, EntityId, Handle, TypeTag};

/// Component bookkeeping and hierarchy links of one entity.
///
/// Created and destroyed only through the [`Registry`](crate::Registry).
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    name: Option<String>,
    /// Component type -> component id. At most one per type.
    component_ids: HashMap<TypeId, ComponentId>,
    /// Component id -> type tag, the reverse of `component_ids`.
    component_types: HashMap<ComponentId, TypeTag>,
    parent: Option<EntityId>,
    children: BTreeSet<EntityId>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            component_ids: HashMap::new(),
            component_types: HashMap::new(),
            parent: None,
            children: BTreeSet::new(),
        }
    }

    /// Returns the entity id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity name, if it was created with one.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Checks if the entity owns a component of type `T`. O(1).
    #[inline]
    #[must_use]
    pub fn contains<T: Component>(&self) -> bool {
        self.contains_type(TypeId::of::<T>())
    }

    /// Checks if the entity owns a component of the given type. O(1).
    #[inline]
    #[must_use]
    pub fn contains_type(&self, type_id: TypeId) -> bool {
        self.component_ids.contains_key(&type_id)
    }

    /// Checks if the entity owns every listed type.
    #[must_use]
    pub fn contains_all(&self, type_ids: &[TypeId]) -> bool {
        type_ids.iter().all(|type_id| self.contains_type(*type_id))
    }

    /// Returns the id of the entity's `T` component.
    #[inline]
    #[must_use]
    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.component_id_of(TypeId::of::<T>())
    }

    /// Returns the id of the entity's component of the given type.
    #[inline]
    #[must_use]
    pub fn component_id_of(&self, type_id: TypeId) -> Option<ComponentId> {
        self.component_ids.get(&type_id).copied()
    }

    /// Returns the type tag of one of the entity's components.
    #[inline]
    #[must_use]
    pub fn type_tag_of(&self, id: ComponentId) -> Option<TypeTag> {
        self.component_types.get(&id).copied()
    }

    /// Iterates over `(type tag, component id)` pairs.
    pub fn components(&self) -> impl Iterator<Item = (TypeTag, ComponentId)> + '_ {
        self.component_types.iter().map(|(id, tag)| (*tag, *id))
    }

    /// Returns the number of components owned.
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.component_ids.len()
    }

    /// Returns the parent entity.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Iterates over child entities in id order.
    pub fn children(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.children.iter().copied()
    }

    /// Checks if `child` is linked under this entity.
    #[inline]
    #[must_use]
    pub fn has_child(&self, child: EntityId) -> bool {
        self.children.contains(&child)
    }

    /// Records a newly attached component and claims ownership on its handle.
    ///
    /// # Panics
    ///
    /// Panics if the entity already owns a component of the handle's type.
    pub(crate) fn added_component(&mut self, handle: &mut Handle) {
        let tag = handle.tag();
        assert!(
            !self.contains_type(tag.id()),
            "entity {} already has a {} component",
            self.id,
            tag.name()
        );
        self.component_ids.insert(tag.id(), handle.id());
        self.component_types.insert(handle.id(), tag);
        handle.add_owner(self.id);
    }

    /// Forgets a detached component and releases ownership on its handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not name one of this entity's components.
    pub(crate) fn removed_component(&mut self, handle: &mut Handle) {
        let tag = handle.tag();
        assert_eq!(
            self.component_id_of(tag.id()),
            Some(handle.id()),
            "entity {} does not own component {}",
            self.id,
            handle.id()
        );
        self.component_ids.remove(&tag.id());
        self.component_types.remove(&handle.id());
        handle.remove_owner(self.id);
    }

    /// Drops a registration whose component never reached a container.
    pub(crate) fn forget_component(&mut self, type_id: TypeId) {
        if let Some(id) = self.component_ids.remove(&type_id) {
            self.component_types.remove(&id);
        }
    }

    pub(crate) fn add_child(&mut self, child: EntityId) -> bool {
        self.children.insert(child)
    }

    pub(crate) fn remove_child(&mut self, child: EntityId) -> bool {
        self.children.remove(&child)
    }

    pub(crate) fn set_parent(&mut self, parent: Option<EntityId>) -> Option<EntityId> {
        std::mem::replace(&mut self.parent, parent)
    }
}

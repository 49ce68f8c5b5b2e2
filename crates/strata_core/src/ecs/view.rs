//! # Views
//!
//! Lazy queries over entities that carry every type of a [`ComponentSet`].
//!
//! A [`View`] borrows the registry for its whole lifetime and walks the
//! entity map in its native order. Each yielded [`ViewEntry`] resolves
//! handles and values when asked, never ahead of time.
//!
//! A [`ViewCursor`] owns a snapshot of candidate ids instead of a borrow, so
//! the registry can be mutated between steps. Each step re-checks the
//! candidate against the registry as it is at that moment.

use std::any::TypeId;
use std::collections::hash_map;
use std::fmt;
use std::marker::PhantomData;

use crate::ecs::{Component, ComponentSet, Entity, EntityId, Registry};

type Predicate<'r> = Box<dyn Fn(&Entity) -> bool + 'r>;

/// Lazy, filtered iterator over matching entities.
pub struct View<'r, S: ComponentSet> {
    registry: &'r Registry,
    entities: hash_map::Values<'r, EntityId, Entity>,
    required: Vec<TypeId>,
    predicate: Option<Predicate<'r>>,
    _marker: PhantomData<fn() -> S>,
}

impl<'r, S: ComponentSet> View<'r, S> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            entities: registry.entity_map().values(),
            required: S::type_ids(),
            predicate: None,
            _marker: PhantomData,
        }
    }

    /// Adds a predicate. Chained predicates must all pass.
    #[must_use]
    pub fn filter_by<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Entity) -> bool + 'r,
    {
        self.predicate = Some(match self.predicate.take() {
            Some(previous) => {
                Box::new(move |entity: &Entity| previous(entity) && predicate(entity))
            }
            None => Box::new(predicate),
        });
        self
    }

    fn accepts(&self, entity: &Entity) -> bool {
        entity.contains_all(&self.required)
            && self
                .predicate
                .as_ref()
                .map_or(true, |predicate| predicate(entity))
    }
}

impl<'r, S: ComponentSet> Iterator for View<'r, S> {
    type Item = ViewEntry<'r, S>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entity = self.entities.next()?;
            if self.accepts(entity) {
                return Some(ViewEntry {
                    registry: self.registry,
                    entity,
                    _marker: PhantomData,
                });
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.entities.size_hint().1)
    }
}

impl<S: ComponentSet> fmt::Debug for View<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("required", &self.required)
            .field("filtered", &self.predicate.is_some())
            .finish_non_exhaustive()
    }
}

/// One matching entity yielded by a [`View`].
pub struct ViewEntry<'r, S: ComponentSet> {
    registry: &'r Registry,
    entity: &'r Entity,
    _marker: PhantomData<fn() -> S>,
}

impl<'r, S: ComponentSet> ViewEntry<'r, S> {
    /// Returns the entity.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> &'r Entity {
        self.entity
    }

    /// Returns the entity id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.entity.id()
    }

    /// Resolves the set's handles now.
    ///
    /// # Panics
    ///
    /// Never for entries yielded by a view: the registry stays borrowed, so
    /// the entity still carries every member.
    #[must_use]
    pub fn handles(&self) -> S::Handles<'r> {
        self.registry.handles::<S>(self.id())
    }

    /// Reads the set's values now.
    ///
    /// # Panics
    ///
    /// Same as [`ViewEntry::handles`].
    #[must_use]
    pub fn values(&self) -> S::Values {
        self.registry.components::<S>(self.id())
    }

    /// Reads any component of the entity, inside the set or not.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<T> {
        self.registry.try_component::<T>(self.id()).ok()
    }
}

impl<S: ComponentSet> fmt::Debug for ViewEntry<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewEntry").field("entity", &self.id()).finish()
    }
}

/// Restartable query that does not borrow the registry between steps.
///
/// Candidates are the entities matching when the cursor was created.
/// Entities destroyed, or that lose a member type, before their turn are
/// skipped.
pub struct ViewCursor<S> {
    /// Remaining candidates, last one next.
    pending: Vec<EntityId>,
    required: Vec<TypeId>,
    _marker: PhantomData<fn() -> S>,
}

impl<S: ComponentSet> ViewCursor<S> {
    pub(crate) fn new(registry: &Registry) -> Self {
        let required = S::type_ids();
        let mut pending: Vec<EntityId> = registry
            .entities()
            .filter(|entity| entity.contains_all(&required))
            .map(Entity::id)
            .collect();
        pending.reverse();
        Self {
            pending,
            required,
            _marker: PhantomData,
        }
    }

    /// Steps to the next candidate that still matches.
    pub fn advance(&mut self, registry: &Registry) -> Option<EntityId> {
        while let Some(id) = self.pending.pop() {
            if registry
                .entity(id)
                .is_some_and(|entity| entity.contains_all(&self.required))
            {
                return Some(id);
            }
        }
        None
    }

    /// Steps to the next match and reads its values.
    pub fn advance_with(&mut self, registry: &Registry) -> Option<(EntityId, S::Values)> {
        let id = self.advance(registry)?;
        S::fetch(registry, id).ok().map(|values| (id, values))
    }

    /// Returns how many candidates are left, matching or not.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl<S> fmt::Debug for ViewCursor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCursor")
            .field("remaining", &self.pending.len())
            .finish_non_exhaustive()
    }
}

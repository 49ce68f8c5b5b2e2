//! # Component System
//!
//! Components are plain data. They cross into arena bytes with
//! [`bytemuck::bytes_of`] and come back with
//! [`bytemuck::pod_read_unaligned`], so stored records need no alignment
//! padding.

use std::any::TypeId;
use std::hash::{Hash, Hasher};
use std::mem::size_of;

use bytemuck::{Pod, Zeroable};

use crate::ecs::{EntityId, Handle, Registry};
use crate::error::StrataResult;

/// Marker trait for storable components.
///
/// # Example
///
/// ```rust
/// use bytemuck::{Pod, Zeroable};
/// use strata_core::Component;
///
/// #[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Mass {
///     kg: f32,
/// }
///
/// impl Component for Mass {
///     const NAME: &'static str = "Mass";
/// }
/// ```
pub trait Component: Pod + Send + Sync + 'static {
    /// Human-readable type name, used in error messages and logs.
    const NAME: &'static str;
}

/// Runtime type tag of a component: identity, name and byte size.
///
/// Equality and hashing use the type identity only.
#[derive(Clone, Copy, Debug)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
    size: usize,
}

impl TypeTag {
    /// Returns the tag of a component type.
    #[inline]
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::NAME,
            size: size_of::<T>(),
        }
    }

    /// Returns the type identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the component name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the record size in bytes.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A fixed set of component types, written as a tuple: `(A,)`, `(A, B)`, ...
///
/// Used to declare groups, to query views and to fetch several components
/// of one entity at once.
pub trait ComponentSet: 'static {
    /// Tuple of component values.
    type Values;

    /// Tuple of handle references borrowed from the registry.
    type Handles<'r>;

    /// Type tags in declaration order.
    fn type_tags() -> Vec<TypeTag>;

    /// Type identities in declaration order.
    #[must_use]
    fn type_ids() -> Vec<TypeId> {
        Self::type_tags().iter().map(TypeTag::id).collect()
    }

    /// Reads every value of the set from one entity.
    ///
    /// # Errors
    ///
    /// Fails with the first missing component.
    fn fetch(registry: &Registry, entity: EntityId) -> StrataResult<Self::Values>;

    /// Resolves every handle of the set for one entity.
    ///
    /// # Errors
    ///
    /// Fails with the first missing component.
    fn fetch_handles(registry: &Registry, entity: EntityId) -> StrataResult<Self::Handles<'_>>;
}

/// Expands to `$sub` once per `$_t`, so a repetition can key on a type list.
macro_rules! replace_ty {
    ($_t:ident, $sub:ty) => {
        $sub
    };
}

macro_rules! impl_component_set {
    ($($ty:ident),+) => {
        impl<$($ty: Component),+> ComponentSet for ($($ty,)+) {
            type Values = ($($ty,)+);
            type Handles<'r> = ($(replace_ty!($ty, &'r Handle),)+);

            fn type_tags() -> Vec<TypeTag> {
                vec![$(TypeTag::of::<$ty>()),+]
            }

            fn fetch(registry: &Registry, entity: EntityId) -> StrataResult<Self::Values> {
                Ok(($(registry.try_component::<$ty>(entity)?,)+))
            }

            fn fetch_handles(
                registry: &Registry,
                entity: EntityId,
            ) -> StrataResult<Self::Handles<'_>> {
                Ok(($(registry.try_handle::<$ty>(entity)?,)+))
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);

/// 2D position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Component for Position {
    const NAME: &'static str = "Position";
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 2D velocity in units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Velocity {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
}

impl Component for Velocity {
    const NAME: &'static str = "Velocity";
}

impl Velocity {
    /// Creates a new velocity.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Hit points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Health {
    /// Remaining hit points.
    pub current: u32,
    /// Upper bound.
    pub max: u32,
}

impl Component for Health {
    const NAME: &'static str = "Health";
}

impl Health {
    /// Creates a full health pool.
    #[inline]
    #[must_use]
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Checks if no hit points remain.
    #[inline]
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_sizes() {
        assert_eq!(TypeTag::of::<Position>().size(), 8);
        assert_eq!(TypeTag::of::<Health>().size(), 8);
        assert_eq!(TypeTag::of::<Velocity>().name(), "Velocity");
    }

    #[test]
    fn test_type_tag_equality_by_type() {
        assert_eq!(TypeTag::of::<Position>(), TypeTag::of::<Position>());
        assert_ne!(TypeTag::of::<Position>(), TypeTag::of::<Velocity>());
    }

    #[test]
    fn test_component_set_order() {
        let ids = <(Velocity, Position)>::type_ids();
        assert_eq!(ids, vec![TypeId::of::<Velocity>(), TypeId::of::<Position>()]);
    }

    #[test]
    fn test_unaligned_round_trip() {
        let value = Position::new(1.5, -2.0);
        let mut buffer = vec![0u8; 1];
        buffer.extend_from_slice(bytemuck::bytes_of(&value));
        let back: Position = bytemuck::pod_read_unaligned(&buffer[1..]);
        assert_eq!(back, value);
    }
}

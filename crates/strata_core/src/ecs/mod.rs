//! # Entity Component System
//!
//! Entities, components, handles, groups, the registry and views.
//!
//! ## Layout
//!
//! - Component bytes live in arenas owned by containers, never by entities.
//! - Entities map component types to component ids.
//! - Handles map component ids to current byte locations.
//! - Groups pack complete member sets into one row per entity.

mod component;
mod entity;
mod group;
mod handle;
mod id;
mod registry;
mod view;

pub use component::{Component, ComponentSet, Health, Position, TypeTag, Velocity};
pub use entity::Entity;
pub use group::{Group, GroupSignature};
pub use handle::{ComponentState, Handle};
pub use id::{ComponentId, EntityId, GroupId};
pub use registry::{Registry, RegistryStats};
pub use view::{View, ViewCursor, ViewEntry};

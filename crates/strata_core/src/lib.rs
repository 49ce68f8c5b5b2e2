//! # STRATA Core
//!
//! In-memory entity-component storage:
//! - Component bytes live in growable, self-compacting arenas
//! - Handles stay valid while the bytes under them move
//! - Groups pack entities with a complete type signature into one row each
//!
//! ## Architecture Rules
//!
//! 1. **No cached addresses** - bytes are reached through a handle's current location
//! 2. **Complete rows only** - a group store never holds a partial member set
//! 3. **One owner** - the [`Registry`] is the only mutator and holds no locks
//!
//! ## Example
//!
//! ```rust
//! use strata_core::{ComponentState, Position, Registry, Velocity};
//!
//! let mut registry = Registry::new();
//! let group = registry.declare_group::<(Position, Velocity)>();
//!
//! let e = registry.create_entity();
//! registry.add_component(e, Position::new(1.0, 2.0));
//! assert_eq!(registry.component_state::<Position>(e), ComponentState::Pooled);
//!
//! registry.add_component(e, Velocity::new(0.0, 1.0));
//! assert_eq!(registry.component_state::<Position>(e), ComponentState::Grouped(group));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;
pub mod storage;
pub mod sync;

pub use config::{ArenaConfig, RegistryConfig};
pub use ecs::{
    Component, ComponentId, ComponentSet, ComponentState, Entity, EntityId, Group, GroupId,
    GroupSignature, Handle, Health, Position, Registry, RegistryStats, TypeTag, Velocity, View,
    ViewCursor, ViewEntry,
};
pub use error::{StrataError, StrataResult};
pub use memory::{Arena, ArenaStats, Growth, Location, Relocations};
pub use storage::{ComponentContainer, TupleContainer, TupleLayout, VectorContainer};
pub use sync::SharedRegistry;

//! # Memory Management
//!
//! The byte arena every container is built on.
//!
//! Records are addressed by buffer-relative [`Location`]s. Growth keeps every
//! location valid; compaction hands back a [`Relocations`] map that owners
//! apply to their handles in one pass.

mod arena;

pub use arena::{Arena, ArenaStats, Growth, Location, Relocations};

//! # Component Containers
//!
//! An arena plus the handles that point into it.
//!
//! - [`ComponentContainer`]: the general pool, heterogeneous records.
//! - [`VectorContainer`]: dense records of a single type.
//! - [`TupleContainer`]: packed multi-type rows backing a group.
//!
//! All three keep handles current across compaction. Nothing outside a
//! container ever sees an arena location that is out of date.

mod container;
mod tuple;
mod vector;

pub use container::ComponentContainer;
pub use tuple::{TupleContainer, TupleLayout};
pub use vector::VectorContainer;

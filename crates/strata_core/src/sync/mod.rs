//! # Shared Ownership
//!
//! The registry has no internal locking. Callers that need it on more than
//! one thread wrap the whole registry in a single mutex.

mod shared;

pub use shared::SharedRegistry;

//! # Storage Error Types
//!
//! Precondition violations surface here through the `try_*` operations.
//! Their panicking counterparts abort with the same message.

use thiserror::Error;

use crate::ecs::{ComponentId, EntityId, GroupId};

/// Errors that can occur in the storage engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrataError {
    /// The entity id is not known to the registry.
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),

    /// The entity does not own a component of the requested type.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        /// The entity that was queried.
        entity: EntityId,
        /// Name of the missing component type.
        component: &'static str,
    },

    /// The entity already owns a component of this type.
    #[error("entity {entity} already has a {component} component")]
    DuplicateComponent {
        /// The entity that was targeted.
        entity: EntityId,
        /// Name of the duplicated component type.
        component: &'static str,
    },

    /// Neither the general pool nor any group store holds the component.
    #[error("component {0} is not held by any container")]
    ComponentNotFound(ComponentId),

    /// A group signature lists the same type twice.
    #[error("group declares {0} more than once")]
    DuplicateGroupType(&'static str),

    /// A component type may participate in at most one group.
    #[error("{component} already belongs to group {group}")]
    TypeAlreadyGrouped {
        /// Name of the contested component type.
        component: &'static str,
        /// The group that already claimed it.
        group: GroupId,
    },

    /// No declared group has this id.
    #[error("group {0} is not declared")]
    UnknownGroup(GroupId),

    /// A group signature with no types.
    #[error("a group needs at least one component type")]
    EmptyGroup,

    /// An entity cannot be its own child.
    #[error("entity {0} cannot be its own child")]
    SelfParent(EntityId),

    /// The arena already holds a record under this id.
    #[error("record already present in arena")]
    DuplicateRecord,

    /// The arena holds no record under this id.
    #[error("record not present in arena")]
    UnknownRecord,

    /// Byte payload does not match the declared record size.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Size the record was declared with.
        expected: usize,
        /// Size of the payload that was supplied.
        actual: usize,
    },

    /// Invalid configuration value or document.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for storage operations.
pub type StrataResult<T> = Result<T, StrataError>;

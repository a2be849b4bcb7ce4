//! Error types for the `menagerie-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`].

use menagerie_types::{AgentKey, ResourceId};

/// Errors that can occur during resource and pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The pool provider has no free objects left.
    #[error("resource pool exhausted (capacity {capacity})")]
    PoolExhausted {
        /// Maximum number of live resources the pool can hand out.
        capacity: usize,
    },

    /// The resource is not in the active set (never spawned, consumed,
    /// or despawned).
    #[error("resource not found: {0}")]
    ResourceNotFound(ResourceId),

    /// The agent tried to consume a resource it does not own.
    #[error("agent {agent} does not own resource {resource}")]
    NotOwner {
        /// The resource.
        resource: ResourceId,
        /// The agent that attempted the operation.
        agent: AgentKey,
    },

    /// The agent has no consumption in progress.
    #[error("agent {0} is not consuming anything")]
    NoConsumption(AgentKey),
}

//! Error types for the menagerie-agents crate.

use menagerie_types::{AgentId, AgentKey};
use menagerie_world::WorldError;

/// Errors that can occur during agent operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// No agent with the given key is alive.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentKey),

    /// No agent currently answers to the given id.
    #[error("unknown agent id: {0}")]
    UnknownAgentId(AgentId),

    /// An evolution is already running for this agent.
    #[error("evolution already in progress for {0}")]
    EvolutionInProgress(AgentKey),

    /// No requirement exists for the level after `level`.
    #[error("no evolution defined beyond level {level}")]
    NoFurtherLevel {
        /// The agent's current level.
        level: u32,
    },

    /// The new id is already registered to another agent.
    #[error("agent id {id} is already in use")]
    DuplicateId {
        /// The conflicting id.
        id: AgentId,
    },

    /// A computed position was NaN or infinite.
    #[error("non-finite position for {agent}")]
    NonFinitePosition {
        /// The affected agent.
        agent: AgentKey,
    },

    /// A world (registry or pool) operation failed.
    #[error("world error: {0}")]
    World(#[from] WorldError),
}

//! Per-agent behavior for the Menagerie simulation.
//!
//! This crate holds everything that operates on a single agent: choosing
//! behavior states, seeking and consuming resources, keeping distance from
//! neighbors, vitals, and evolution progress. It sits between
//! `menagerie-world` (the shared bounds and resource registry) and
//! `menagerie-core` (which composes these pieces into a tick).
//!
//! # Modules
//!
//! - [`agent`] -- Agent records and the key/id-indexed [`AgentManager`]
//! - [`behavior`] -- Per-level transition rules and durations ([`BehaviorTable`])
//! - [`config`] -- Configurable parameters for each mechanic
//! - [`error`] -- Error types for agent operations ([`AgentError`])
//! - [`evolution`] -- Progress counters and requirement checks ([`EvolutionTracker`])
//! - [`seeking`] -- The seek/claim/consume cycle ([`ResourceSeekingController`])
//! - [`separation`] -- Neighbor repulsion ([`SeparationController`])
//! - [`state_machine`] -- Weighted state selection and durations ([`AgentStateMachine`])
//! - [`vitals`] -- Hunger, happiness, and health ([`AgentVitalsTracker`])

pub mod agent;
pub mod behavior;
pub mod config;
pub mod error;
pub mod evolution;
pub mod seeking;
pub mod separation;
pub mod state_machine;
pub mod vitals;

// Re-export primary types at crate root for convenience.
pub use agent::{Agent, AgentManager, SpawnParams};
pub use behavior::{
    BehaviorTable, DurationRange, LevelBehaviorConfig, TransitionContext, TransitionRule,
    default_duration,
};
pub use config::{
    EvolutionConfig, MovementConfig, RequirementConfig, SeekingConfig, SeparationConfig,
    VitalsConfig,
};
pub use error::AgentError;
pub use evolution::{
    CustomPredicate, EvolutionRequirement, EvolutionState, EvolutionTracker, ProgressCounters,
};
pub use seeking::{ResourceSeekingController, SeekAction, SeekState, wanted_kinds};
pub use separation::{SeparationController, compute_separation};
pub use state_machine::{
    AgentStateMachine, MAX_CLIP_SECS, MIN_CLIP_SECS, fallback_state, valid_clip, weighted_pick,
};
pub use vitals::{AgentVitalsTracker, VITAL_MAX, Vitals};

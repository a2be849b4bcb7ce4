//! Simulation clock, configuration, scheduling, and tick orchestration for
//! Menagerie.
//!
//! This crate composes the world (`menagerie-world`) and per-agent
//! mechanics (`menagerie-agents`) into a runnable simulation.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and simulated time ([`SimClock`])
//! - [`collaborators`] -- Presentation, persistence, and notification interfaces
//! - [`config`] -- YAML configuration ([`SimulationConfig`])
//! - [`controller`] -- Per-agent tick composition ([`AgentController`])
//! - [`runner`] -- Bounded runs and tick callbacks ([`run_for`])
//! - [`scheduler`] -- Deadline-ordered continuations ([`ContinuationQueue`])
//! - [`simulation`] -- World state and the tick cycle ([`Simulation`])

pub mod clock;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod runner;
pub mod scheduler;
pub mod simulation;

pub use clock::{ClockError, SimClock};
pub use collaborators::{ClipDurationSource, ClipTable, NotificationSink, NullSink, PersistenceHook};
pub use config::{ConfigError, LoggingConfig, SimulationConfig, SpawningConfig, WorldConfig};
pub use controller::{AgentController, AgentStep, TickContext};
pub use runner::{NoOpCallback, RunTotals, TickCallback, run_for};
pub use scheduler::{Continuation, ContinuationQueue, ContinuationToken};
pub use simulation::{Collaborators, Simulation, TickError, TickSummary};

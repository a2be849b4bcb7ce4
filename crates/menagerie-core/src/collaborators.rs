//! Interfaces to the presentation and persistence layers.
//!
//! The simulation never renders or saves anything itself. It asks a
//! [`ClipDurationSource`] how long each state's animation runs, tells a
//! [`PersistenceHook`] when an agent's id changes, and reports notable
//! moments to a [`NotificationSink`]. Pooled resource objects come from a
//! [`menagerie_world::ResourcePool`].
//!
//! [`ClipTable`] and [`NullSink`] are the in-process defaults.

use std::collections::BTreeMap;

use menagerie_types::{AgentId, BehaviorState, ResourceKind};

/// Source of presentation clip lengths.
pub trait ClipDurationSource {
    /// Length in seconds of the clip played for `state`, if known.
    fn clip_duration(&self, state: BehaviorState) -> Option<f32>;
}

/// Receives identity changes so saved data can follow the agent.
pub trait PersistenceHook {
    /// `old` has been replaced by `new`. Records keyed by `old` must be
    /// moved, not copied.
    fn on_evolved(&mut self, old: &AgentId, new: &AgentId);
}

/// Receives simulation events for sound, UI, or logging.
pub trait NotificationSink {
    /// A resource of `kind` was consumed.
    fn on_consumed(&mut self, kind: ResourceKind);

    /// An agent began evolving into `level`.
    fn on_evolution_triggered(&mut self, level: u32);

    /// An agent entered `state`.
    fn on_state_changed(&mut self, state: BehaviorState);
}

/// Clip lengths loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipTable {
    clips: BTreeMap<BehaviorState, f32>,
}

impl ClipTable {
    /// Create a table from a state to seconds map.
    pub const fn new(clips: BTreeMap<BehaviorState, f32>) -> Self {
        Self { clips }
    }
}

impl ClipDurationSource for ClipTable {
    fn clip_duration(&self, state: BehaviorState) -> Option<f32> {
        self.clips.get(&state).copied()
    }
}

/// A sink and hook that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn on_consumed(&mut self, _kind: ResourceKind) {}

    fn on_evolution_triggered(&mut self, _level: u32) {}

    fn on_state_changed(&mut self, _state: BehaviorState) {}
}

impl PersistenceHook for NullSink {
    fn on_evolved(&mut self, _old: &AgentId, _new: &AgentId) {}
}

//! Evolution progress tracking and requirement evaluation.
//!
//! Each agent accumulates [`ProgressCounters`] at its current level. The
//! [`EvolutionTracker`] checks them against the requirement for the next
//! level every `check_interval_secs`, and again shortly after each
//! interaction once the agent is in a safe state.
//!
//! The tracker decides *whether* an agent evolves. Carrying out the
//! evolution (notifications, id remap, vitals refresh) belongs to the
//! simulation; the tracker only provides the lock around it through
//! [`EvolutionTracker::begin_evolution`] and
//! [`EvolutionTracker::finish_evolution`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use menagerie_types::{AgentKey, BehaviorState};
use tracing::debug;

use crate::config::{EvolutionConfig, RequirementConfig};
use crate::error::AgentError;
use crate::vitals::Vitals;

/// Progress made at the current level.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressCounters {
    /// Seconds alive at this level.
    pub time_alive: f32,
    /// Resources consumed at this level.
    pub resources_consumed: u32,
    /// Interactions received at this level.
    pub interactions: u32,
}

/// An extra condition attached to a requirement in code.
#[derive(Clone)]
pub struct CustomPredicate(Arc<dyn Fn(&ProgressCounters, &Vitals) -> bool + Send + Sync>);

impl CustomPredicate {
    /// Wrap a predicate.
    pub fn new(predicate: impl Fn(&ProgressCounters, &Vitals) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Evaluate the predicate.
    pub fn check(&self, counters: &ProgressCounters, vitals: &Vitals) -> bool {
        (self.0)(counters, vitals)
    }
}

impl fmt::Debug for CustomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomPredicate(..)")
    }
}

/// Thresholds an agent must reach to advance to `target_level`.
#[derive(Debug, Clone)]
pub struct EvolutionRequirement {
    /// The level this requirement unlocks.
    pub target_level: u32,
    /// Minimum seconds alive at the current level.
    pub min_time_alive: f32,
    /// Minimum resources consumed at the current level.
    pub min_resources_consumed: u32,
    /// Minimum interactions received at the current level.
    pub min_interactions: u32,
    /// Minimum happiness.
    pub min_happiness: f32,
    /// Minimum hunger (satiety).
    pub min_hunger: f32,
    /// Optional extra condition.
    pub custom: Option<CustomPredicate>,
}

impl EvolutionRequirement {
    /// Whether every threshold is met. Zero thresholds always pass.
    pub fn is_met(&self, counters: &ProgressCounters, vitals: &Vitals) -> bool {
        counters.time_alive >= self.min_time_alive
            && counters.resources_consumed >= self.min_resources_consumed
            && counters.interactions >= self.min_interactions
            && vitals.happiness >= self.min_happiness
            && vitals.hunger >= self.min_hunger
            && self.custom.as_ref().is_none_or(|p| p.check(counters, vitals))
    }
}

impl From<&RequirementConfig> for EvolutionRequirement {
    fn from(config: &RequirementConfig) -> Self {
        Self {
            target_level: config.target_level,
            min_time_alive: config.min_time_alive,
            min_resources_consumed: config.min_resources_consumed,
            min_interactions: config.min_interactions,
            min_happiness: config.min_happiness,
            min_hunger: config.min_hunger,
            custom: None,
        }
    }
}

/// Per-agent evolution bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvolutionState {
    /// Progress at the current level.
    pub counters: ProgressCounters,
    /// Seconds since the last periodic check.
    pub since_check: f32,
    /// Set when a post-interaction re-check is due.
    pub recheck_armed: bool,
    /// Lock held while an evolution is being carried out.
    pub evolving: bool,
}

/// Evaluates evolution requirements on a fixed cadence.
#[derive(Debug, Clone)]
pub struct EvolutionTracker {
    requirements: BTreeMap<u32, EvolutionRequirement>,
    check_interval: f32,
    interaction_delay: f32,
}

impl Default for EvolutionTracker {
    fn default() -> Self {
        Self::from_config(&EvolutionConfig::default())
    }
}

impl EvolutionTracker {
    /// Build a tracker from config. Later entries for the same target level
    /// replace earlier ones.
    pub fn from_config(config: &EvolutionConfig) -> Self {
        let requirements = config
            .requirements
            .iter()
            .map(|r| (r.target_level, EvolutionRequirement::from(r)))
            .collect();
        Self {
            requirements,
            check_interval: config.check_interval_secs,
            interaction_delay: config.interaction_delay_secs,
        }
    }

    /// Add or replace a requirement.
    pub fn insert_requirement(&mut self, requirement: EvolutionRequirement) {
        self.requirements.insert(requirement.target_level, requirement);
    }

    /// Requirement for advancing past `level`, if any.
    pub fn requirement_after(&self, level: u32) -> Option<&EvolutionRequirement> {
        self.requirements.get(&level.checked_add(1)?)
    }

    /// Whether a level beyond `level` exists.
    pub fn has_next_level(&self, level: u32) -> bool {
        self.requirement_after(level).is_some()
    }

    /// Delay between an interaction and its evolution re-check.
    pub const fn interaction_delay(&self) -> f32 {
        self.interaction_delay
    }

    /// Accumulate `dt` seconds of life and run the periodic check when due.
    ///
    /// Does nothing while evolving or at the last level. Returns `true` when
    /// the periodic check ran and the requirement is met.
    pub fn update_tracking(&self, state: &mut EvolutionState, level: u32, vitals: &Vitals, dt: f32) -> bool {
        if state.evolving || !self.has_next_level(level) || !(dt.is_finite() && dt > 0.0) {
            return false;
        }
        state.counters.time_alive += dt;
        state.since_check += dt;
        if state.since_check < self.check_interval {
            return false;
        }
        state.since_check = 0.0;
        self.evaluate_requirements(state, level, vitals)
    }

    /// Record a consumption.
    pub const fn on_resource_consumed(state: &mut EvolutionState) {
        state.counters.resources_consumed = state.counters.resources_consumed.saturating_add(1);
    }

    /// Record an interaction. The caller schedules
    /// [`arm_recheck`](Self::arm_recheck) after
    /// [`interaction_delay`](Self::interaction_delay) seconds.
    pub const fn on_interaction(state: &mut EvolutionState) {
        state.counters.interactions = state.counters.interactions.saturating_add(1);
    }

    /// Mark a post-interaction re-check as due.
    pub const fn arm_recheck(state: &mut EvolutionState) {
        state.recheck_armed = true;
    }

    /// Run an armed re-check if the agent is in a safe state.
    ///
    /// The re-check stays armed until it can run. Returns `true` when it
    /// ran and the requirement is met.
    pub fn try_recheck(
        &self,
        state: &mut EvolutionState,
        level: u32,
        vitals: &Vitals,
        current: BehaviorState,
    ) -> bool {
        if !state.recheck_armed || !current.is_evolution_safe() {
            return false;
        }
        state.recheck_armed = false;
        self.evaluate_requirements(state, level, vitals)
    }

    /// Whether the agent meets the requirement for `level + 1`.
    ///
    /// Always `false` while evolving or when no further level exists.
    pub fn evaluate_requirements(&self, state: &EvolutionState, level: u32, vitals: &Vitals) -> bool {
        if state.evolving {
            return false;
        }
        self.requirement_after(level)
            .is_some_and(|req| req.is_met(&state.counters, vitals))
    }

    /// Take the evolution lock and return the level to evolve to.
    ///
    /// # Errors
    ///
    /// - [`AgentError::EvolutionInProgress`] if the lock is already held.
    /// - [`AgentError::NoFurtherLevel`] if no requirement exists for the
    ///   next level.
    pub fn begin_evolution(
        &self,
        agent: AgentKey,
        state: &mut EvolutionState,
        level: u32,
    ) -> Result<u32, AgentError> {
        if state.evolving {
            return Err(AgentError::EvolutionInProgress(agent));
        }
        let target = self
            .requirement_after(level)
            .map(|r| r.target_level)
            .ok_or(AgentError::NoFurtherLevel { level })?;
        state.evolving = true;
        debug!(%agent, from = level, to = target, "Evolution lock taken");
        Ok(target)
    }

    /// Release the evolution lock and reset progress for the new level.
    pub fn finish_evolution(state: &mut EvolutionState) {
        *state = EvolutionState::default();
    }
}

//! The simulation: shared world state and the tick cycle.
//!
//! Each call to [`Simulation::run_tick`] runs these phases in order:
//!
//! 1. **Clock** -- advance the tick counter and simulated time.
//! 2. **Continuations** -- run every continuation whose deadline has passed
//!    (finishing meals, arming evolution re-checks).
//! 3. **Resources** -- spawn a resource when the spawn timer elapses.
//! 4. **Agents** -- step every agent in spawn order through the
//!    [`AgentController`], carrying out any evolution that became due.
//!
//! A failure for one agent is logged and counted; the remaining agents
//! still run. Given the same config (and seed) and the same sequence of
//! external calls, a run is reproducible.

use std::sync::Arc;

use menagerie_agents::{
    Agent, AgentError, AgentManager, BehaviorTable, EvolutionTracker, ResourceSeekingController,
    SpawnParams, Vitals,
};
use menagerie_types::{AgentId, AgentKey, BehaviorState, ResourceId, ResourceKind, Vec2};
use menagerie_world::{InMemoryPool, ResourcePool, ResourceRegistry, SpatialBounds, WorldError};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::clock::{ClockError, SimClock};
use crate::collaborators::{ClipDurationSource, ClipTable, NotificationSink, NullSink, PersistenceHook};
use crate::config::{SimulationConfig, SpawningConfig};
use crate::controller::{AgentController, TickContext};
use crate::scheduler::{Continuation, ContinuationQueue};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Simulated seconds at the end of the tick.
    pub time: f64,
    /// Living agents at end of tick.
    pub agents: usize,
    /// Active resources at end of tick.
    pub resources: usize,
    /// Agents that entered a new state.
    pub state_changes: u32,
    /// Meals started this tick.
    pub meals_started: u32,
    /// Resources consumed this tick.
    pub consumptions: u32,
    /// Evolutions carried out this tick.
    pub evolutions: u32,
    /// Resources spawned this tick.
    pub resources_spawned: u32,
    /// Agents whose step failed.
    pub failures: u32,
}

/// The external collaborators a simulation talks to.
pub struct Collaborators {
    /// Pooled resource objects.
    pub pool: Box<dyn ResourcePool + Send>,
    /// Presentation clip lengths.
    pub clips: Box<dyn ClipDurationSource + Send>,
    /// Receives identity changes.
    pub persistence: Box<dyn PersistenceHook + Send>,
    /// Receives notable events.
    pub sink: Box<dyn NotificationSink + Send>,
}

impl Collaborators {
    /// In-process collaborators: a bounded in-memory pool, the configured
    /// clip table, and no-op persistence and notifications.
    pub fn in_memory(config: &SimulationConfig) -> Self {
        Self {
            pool: Box::new(InMemoryPool::new(config.spawning.pool_capacity)),
            clips: Box::new(ClipTable::new(config.clips.clone())),
            persistence: Box::new(NullSink),
            sink: Box::new(NullSink),
        }
    }
}

/// The complete simulation state.
pub struct Simulation {
    spawning: SpawningConfig,
    starting_vitals: Vitals,
    clock: SimClock,
    rng: SmallRng,
    bounds: SpatialBounds,
    registry: ResourceRegistry,
    agents: AgentManager,
    queue: ContinuationQueue,
    controller: AgentController,
    collaborators: Collaborators,
    resource_timer: f32,
    consumed_this_tick: u32,
}

impl Simulation {
    /// Build an empty simulation (no agents, no resources).
    pub fn new(config: &SimulationConfig, collaborators: Collaborators) -> Self {
        let table = Arc::new(BehaviorTable::new(config.behavior.clone()));
        info!(
            name = %config.world.name,
            seed = config.world.seed,
            width = config.world.area_width,
            height = config.world.area_height,
            "Simulation created"
        );
        Self {
            spawning: config.spawning.clone(),
            starting_vitals: Vitals::starting(&config.vitals),
            clock: SimClock::new(),
            rng: SmallRng::seed_from_u64(config.world.seed),
            bounds: SpatialBounds::new(config.bounds.clone(), config.world.area()),
            registry: ResourceRegistry::new(),
            agents: AgentManager::new(table),
            queue: ContinuationQueue::new(),
            controller: AgentController::from_config(config),
            collaborators,
            resource_timer: 0.0,
            consumed_this_tick: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The simulation clock.
    pub const fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Movement bounds for the current area.
    pub const fn bounds(&self) -> &SpatialBounds {
        &self.bounds
    }

    /// Active resources and claims.
    pub const fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Live agents.
    pub const fn agents(&self) -> &AgentManager {
        &self.agents
    }

    /// Look up an agent by key.
    pub fn agent(&self, key: AgentKey) -> Option<&Agent> {
        self.agents.get(key)
    }

    /// Look up an agent by its current public id.
    pub fn agent_by_id(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.by_id(id)
    }

    /// Pending continuations.
    pub const fn queue(&self) -> &ContinuationQueue {
        &self.queue
    }

    /// The per-agent controller.
    pub const fn controller(&self) -> &AgentController {
        &self.controller
    }

    /// The evolution tracker, mutably (to attach custom predicates).
    pub const fn evolution_mut(&mut self) -> &mut EvolutionTracker {
        self.controller.evolution_mut()
    }

    /// Mutable access to an agent, for tooling and tests.
    pub fn agent_mut(&mut self, key: AgentKey) -> Option<&mut Agent> {
        self.agents.get_mut(key)
    }

    // -----------------------------------------------------------------------
    // Agents
    // -----------------------------------------------------------------------

    /// Spawn an agent at `position`, or at a random ground position.
    pub fn spawn_agent(&mut self, position: Option<Vec2>) -> AgentKey {
        let extent = self.spawning.agent_extent();
        let position = position.unwrap_or_else(|| {
            self.bounds
                .random_target(BehaviorState::Walking, extent, &mut self.rng)
        });
        self.agents.spawn(
            SpawnParams {
                position,
                extent,
                level: 1,
                vitals: self.starting_vitals,
            },
            &mut self.rng,
        )
    }

    /// Spawn `spawning.initial_agents` agents at random ground positions.
    pub fn spawn_initial_agents(&mut self) -> Vec<AgentKey> {
        (0..self.spawning.initial_agents)
            .map(|_| self.spawn_agent(None))
            .collect()
    }

    /// Remove an agent. Its claims are released and its continuations
    /// cancelled.
    pub fn despawn_agent(&mut self, key: AgentKey) -> Option<Agent> {
        let mut agent = self.agents.remove(key)?;
        ResourceSeekingController::abandon(&mut agent.seek, key, &mut self.registry);
        let cancelled = self.queue.cancel_agent(key);
        debug!(%key, cancelled, "Agent continuations cancelled");
        Some(agent)
    }

    /// Register an interaction (e.g. a pet) with `key`.
    ///
    /// Raises happiness, counts toward evolution, and schedules an
    /// evolution re-check after the configured delay. The agent plays its
    /// interaction state unless it is eating or evolving.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if `key` is not alive.
    pub fn interact(&mut self, key: AgentKey) -> Result<(), AgentError> {
        let now = self.clock.now();
        let agent = self.agents.get_mut(key).ok_or(AgentError::AgentNotFound(key))?;
        self.controller.vitals().on_interaction(&mut agent.vitals);
        EvolutionTracker::on_interaction(&mut agent.evolution);

        if !agent.seek.is_consuming() && !agent.is_evolving() {
            let clip = self.collaborators.clips.clip_duration(BehaviorState::Playing);
            agent.machine.force(BehaviorState::Playing, now, clip, &mut self.rng);
            agent.move_target = None;
            self.collaborators.sink.on_state_changed(BehaviorState::Playing);
        }

        let delay = self.controller.evolution().interaction_delay();
        self.queue.schedule(
            now + f64::from(delay),
            Continuation::ReevaluateEvolution { agent: key },
        );
        debug!(%key, "Interaction registered");
        Ok(())
    }

    /// Register an interaction with the agent currently holding `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnknownAgentId`] if no agent holds `id`.
    pub fn interact_by_id(&mut self, id: &AgentId) -> Result<(), AgentError> {
        let key = self
            .agents
            .key_of(id)
            .ok_or_else(|| AgentError::UnknownAgentId(id.clone()))?;
        self.interact(key)
    }

    /// Carry out an evolution for `key` if a next level exists.
    ///
    /// Returns `Ok(false)` when there is no further level or an evolution
    /// is already in progress.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if `key` is not alive, or
    /// [`AgentError::DuplicateId`] if the new id collides (the lock is
    /// released and the level restored).
    pub fn trigger_evolution(&mut self, key: AgentKey) -> Result<bool, AgentError> {
        let now = self.clock.now();
        let agent = self.agents.get_mut(key).ok_or(AgentError::AgentNotFound(key))?;
        let previous_level = agent.level;
        let target = match self
            .controller
            .evolution()
            .begin_evolution(key, &mut agent.evolution, previous_level)
        {
            Ok(target) => target,
            Err(AgentError::EvolutionInProgress(_) | AgentError::NoFurtherLevel { .. }) => {
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        // Pre-effects.
        let clip = self.collaborators.clips.clip_duration(BehaviorState::Idle);
        agent.machine.force(BehaviorState::Idle, now, clip, &mut self.rng);
        agent.move_target = None;
        self.collaborators.sink.on_state_changed(BehaviorState::Idle);
        self.collaborators.sink.on_evolution_triggered(target);

        // Level increment and identity remap.
        agent.level = target;
        let new_id = agent.id.for_level(target);
        let old_id = match self.agents.rename(key, new_id.clone()) {
            Ok(old) => old,
            Err(err) => {
                if let Some(agent) = self.agents.get_mut(key) {
                    agent.level = previous_level;
                    agent.evolution.evolving = false;
                }
                return Err(err);
            }
        };
        self.collaborators.persistence.on_evolved(&old_id, &new_id);

        // Post-effects.
        if let Some(agent) = self.agents.get_mut(key) {
            agent.machine.set_level(target);
            self.controller.vitals().refresh_after_evolution(&mut agent.vitals);
            EvolutionTracker::finish_evolution(&mut agent.evolution);
        }
        info!(%key, old = %old_id, new = %new_id, level = target, "Agent evolved");
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    /// Spawn a resource of `kind` at `position` with the configured
    /// nutrition.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PoolExhausted`] when the pool is empty.
    pub fn spawn_resource(&mut self, kind: ResourceKind, position: Vec2) -> Result<ResourceId, WorldError> {
        let nutrition = match kind {
            ResourceKind::Food => self.spawning.food_nutrition,
            ResourceKind::Medicine => self.spawning.medicine_nutrition,
        };
        let id = self
            .registry
            .spawn(self.collaborators.pool.as_mut(), kind, position, nutrition)?;
        debug!(%id, ?kind, x = position.x, y = position.y, "Resource spawned");
        Ok(id)
    }

    /// Remove a resource without consuming it.
    ///
    /// An agent claiming it loses the claim and its movement target. An
    /// agent eating it loses its pending meal and returns to `Idle`.
    /// Vitals and counters are untouched. Returns `false` if the resource
    /// was not active.
    pub fn despawn_resource(&mut self, id: ResourceId) -> bool {
        let Some(removed) = self.registry.despawn(self.collaborators.pool.as_mut(), id) else {
            return false;
        };
        let now = self.clock.now();
        if let Some(owner) = removed.owner()
            && let Some(agent) = self.agents.get_mut(owner)
        {
            let was_eating = agent.seek.consuming == Some(id);
            if ResourceSeekingController::on_resource_removed(&mut agent.seek, id) {
                agent.move_target = None;
                if was_eating {
                    let clip = self.collaborators.clips.clip_duration(BehaviorState::Idle);
                    agent.machine.force(BehaviorState::Idle, now, clip, &mut self.rng);
                    self.collaborators.sink.on_state_changed(BehaviorState::Idle);
                }
                debug!(%owner, %id, was_eating, "Claimed resource despawned");
            }
        }
        self.queue.cancel_where(|c| {
            matches!(c, Continuation::FinishConsumption { resource, .. } if *resource == id)
        });
        true
    }

    fn spawn_random_resource(&mut self) -> Option<ResourceId> {
        if self.registry.len() >= self.spawning.max_active_resources {
            return None;
        }
        let chance = if self.spawning.medicine_chance.is_finite() {
            self.spawning.medicine_chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let kind = if self.rng.random_bool(chance) {
            ResourceKind::Medicine
        } else {
            ResourceKind::Food
        };
        let position = self
            .bounds
            .random_target(BehaviorState::Walking, Vec2::ZERO, &mut self.rng);
        match self.spawn_resource(kind, position) {
            Ok(id) => Some(id),
            Err(err) => {
                debug!(error = %err, "Resource spawn skipped");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Area
    // -----------------------------------------------------------------------

    /// Resize the area. Every agent is clamped into its new bounds.
    pub fn set_area_size(&mut self, area: Vec2) {
        self.bounds.set_area(area);
        let keys = self.agents.keys();
        for key in keys {
            if let Some(agent) = self.agents.get_mut(key) {
                agent.position = self.bounds.clamp_to_area(agent.position, agent.extent);
                agent.move_target = None;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Execute a single tick of `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Clock`] if `dt` is invalid or the tick counter
    /// overflows. Per-agent failures are logged and counted instead.
    pub fn run_tick(&mut self, dt: f32) -> Result<TickSummary, TickError> {
        let tick = self.clock.advance(dt)?;
        let now = self.clock.now();
        let mut summary = TickSummary {
            tick,
            ..TickSummary::default()
        };

        // Continuations.
        self.consumed_this_tick = 0;
        for continuation in self.queue.drain_due(now) {
            self.run_continuation(continuation, now);
        }
        summary.consumptions = self.consumed_this_tick;

        // Resources.
        if self.spawning.resource_interval_secs > 0.0 {
            self.resource_timer += dt;
            if self.resource_timer >= self.spawning.resource_interval_secs {
                self.resource_timer = 0.0;
                if self.spawn_random_resource().is_some() {
                    summary.resources_spawned = 1;
                }
            }
        }

        // Agents.
        let neighbors = self.agents.positions();
        for key in self.agents.keys() {
            let step = {
                let Some(agent) = self.agents.get_mut(key) else {
                    continue;
                };
                let mut ctx = TickContext {
                    now,
                    dt,
                    bounds: &self.bounds,
                    registry: &mut self.registry,
                    queue: &mut self.queue,
                    clips: self.collaborators.clips.as_ref(),
                    sink: self.collaborators.sink.as_mut(),
                    neighbors: &neighbors,
                    rng: &mut self.rng,
                };
                self.controller.step(agent, &mut ctx)
            };
            match step {
                Ok(step) => {
                    if step.entered.is_some() {
                        summary.state_changes = summary.state_changes.saturating_add(1);
                    }
                    if step.began_eating.is_some() {
                        summary.meals_started = summary.meals_started.saturating_add(1);
                    }
                    if step.evolution_due {
                        match self.trigger_evolution(key) {
                            Ok(true) => summary.evolutions = summary.evolutions.saturating_add(1),
                            Ok(false) => {}
                            Err(err) => {
                                warn!(%key, error = %err, "Evolution failed");
                                summary.failures = summary.failures.saturating_add(1);
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(%key, error = %err, "Agent step failed");
                    summary.failures = summary.failures.saturating_add(1);
                }
            }
        }

        summary.time = now;
        summary.agents = self.agents.len();
        summary.resources = self.registry.len();
        debug!(
            tick,
            agents = summary.agents,
            resources = summary.resources,
            state_changes = summary.state_changes,
            consumptions = summary.consumptions,
            evolutions = summary.evolutions,
            "Tick complete"
        );
        Ok(summary)
    }

    fn run_continuation(&mut self, continuation: Continuation, now: f64) {
        match continuation {
            Continuation::FinishConsumption { agent, resource } => {
                self.finish_consumption(agent, resource, now);
            }
            Continuation::ReevaluateEvolution { agent } => {
                if let Some(agent) = self.agents.get_mut(agent) {
                    EvolutionTracker::arm_recheck(&mut agent.evolution);
                }
            }
        }
    }

    fn finish_consumption(&mut self, key: AgentKey, resource: ResourceId, now: f64) {
        let Some(agent) = self.agents.get_mut(key) else {
            return;
        };
        if agent.seek.consuming != Some(resource) {
            debug!(%key, %resource, "Stale consumption continuation ignored");
            return;
        }
        let eaten = self.controller.seeking().finish_consumption(
            &mut agent.seek,
            key,
            &mut self.registry,
            self.collaborators.pool.as_mut(),
            now,
        );
        match eaten {
            Ok(eaten) => {
                self.controller
                    .vitals()
                    .apply_consumption(&mut agent.vitals, eaten.kind, eaten.nutrition);
                EvolutionTracker::on_resource_consumed(&mut agent.evolution);
                let clip = self.collaborators.clips.clip_duration(BehaviorState::Idle);
                agent.machine.force(BehaviorState::Idle, now, clip, &mut self.rng);
                self.collaborators.sink.on_consumed(eaten.kind);
                self.collaborators.sink.on_state_changed(BehaviorState::Idle);
                self.consumed_this_tick = self.consumed_this_tick.saturating_add(1);
                info!(%key, %resource, kind = ?eaten.kind, hunger = agent.vitals.hunger, "Resource consumed");
            }
            Err(err) => warn!(%key, %resource, error = %err, "Consumption failed"),
        }
    }
}

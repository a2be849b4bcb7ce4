//! Per-agent tick composition.
//!
//! [`AgentController`] runs one agent through one tick in a fixed order:
//!
//! 1. vitals decay
//! 2. evolution tracking and any armed post-interaction re-check
//! 3. resource seeking (claim, approach, or begin eating)
//! 4. state machine update (skipped while eating)
//! 5. movement target selection
//! 6. separation and movement integration, clamped to the flying bounds
//!
//! Carrying out an evolution needs the agent index and the persistence
//! hook, so the controller only reports that one is due and the
//! [`Simulation`](crate::simulation::Simulation) performs it.

use menagerie_agents::{
    Agent, AgentError, AgentVitalsTracker, EvolutionTracker, MovementConfig,
    ResourceSeekingController, SeekAction, SeparationController, TransitionContext, wanted_kinds,
};
use menagerie_types::{AgentKey, BehaviorState, ResourceId, Vec2};
use menagerie_world::{ResourceRegistry, SpatialBounds};
use rand::rngs::SmallRng;
use tracing::debug;

use crate::collaborators::{ClipDurationSource, NotificationSink};
use crate::config::SimulationConfig;
use crate::scheduler::{Continuation, ContinuationQueue};

/// Shared state an agent step reads and writes.
pub struct TickContext<'a> {
    /// Current simulation time.
    pub now: f64,
    /// Seconds covered by this tick.
    pub dt: f32,
    /// Movement bounds.
    pub bounds: &'a SpatialBounds,
    /// Active resources and claims.
    pub registry: &'a mut ResourceRegistry,
    /// Pending continuations.
    pub queue: &'a mut ContinuationQueue,
    /// Presentation clip lengths.
    pub clips: &'a dyn ClipDurationSource,
    /// Event sink.
    pub sink: &'a mut dyn NotificationSink,
    /// Key and position of every agent at the start of the tick.
    pub neighbors: &'a [(AgentKey, Vec2)],
    /// Simulation RNG.
    pub rng: &'a mut SmallRng,
}

/// What happened to one agent during its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgentStep {
    /// The state entered this step, if it changed.
    pub entered: Option<BehaviorState>,
    /// The resource the agent started eating.
    pub began_eating: Option<ResourceId>,
    /// The agent meets its next evolution requirement.
    pub evolution_due: bool,
}

/// Composes the per-agent mechanics.
#[derive(Debug, Clone, Default)]
pub struct AgentController {
    vitals: AgentVitalsTracker,
    seeking: ResourceSeekingController,
    separation: SeparationController,
    evolution: EvolutionTracker,
    movement: MovementConfig,
}

impl AgentController {
    /// Build a controller from the simulation config.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            vitals: AgentVitalsTracker::new(config.vitals.clone()),
            seeking: ResourceSeekingController::new(config.seeking.clone()),
            separation: SeparationController::new(config.separation.clone()),
            evolution: EvolutionTracker::from_config(&config.evolution),
            movement: config.movement.clone(),
        }
    }

    /// Vitals mechanics.
    pub const fn vitals(&self) -> &AgentVitalsTracker {
        &self.vitals
    }

    /// Seek/claim/consume mechanics.
    pub const fn seeking(&self) -> &ResourceSeekingController {
        &self.seeking
    }

    /// Evolution requirements.
    pub const fn evolution(&self) -> &EvolutionTracker {
        &self.evolution
    }

    /// Evolution requirements, mutably (to attach custom predicates).
    pub const fn evolution_mut(&mut self) -> &mut EvolutionTracker {
        &mut self.evolution
    }

    /// Speed for a state, in units per second.
    pub const fn speed_for(&self, state: BehaviorState) -> f32 {
        match state {
            BehaviorState::Walking => self.movement.walk_speed,
            BehaviorState::Running => self.movement.run_speed,
            BehaviorState::Flying => self.movement.fly_speed,
            _ => 0.0,
        }
    }

    /// Run one tick for `agent`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NonFinitePosition`] if movement produced an
    /// unusable position. The agent's position is left unchanged.
    pub fn step(&self, agent: &mut Agent, ctx: &mut TickContext<'_>) -> Result<AgentStep, AgentError> {
        let mut step = AgentStep::default();

        // 1. Vitals.
        self.vitals.decay(&mut agent.vitals, ctx.dt);

        // 2. Evolution.
        let periodic = self
            .evolution
            .update_tracking(&mut agent.evolution, agent.level, &agent.vitals, ctx.dt);
        let current = agent.state();
        let recheck = self
            .evolution
            .try_recheck(&mut agent.evolution, agent.level, &agent.vitals, current);
        if periodic || recheck {
            step.evolution_due = true;
            return Ok(step);
        }

        // 3. Seeking.
        let sick = self.vitals.is_sick(&agent.vitals);
        let kinds = wanted_kinds(&agent.vitals, sick, self.seeking.config());
        let had_claim = agent.seek.claimed.is_some();
        let mut approaching = false;
        if ResourceSeekingController::is_eligible(&agent.seek, ctx.now) {
            match self.seeking.step(
                &mut agent.seek,
                agent.key,
                agent.position,
                &kinds,
                ctx.registry,
                ctx.now,
            ) {
                SeekAction::Consume(resource) => {
                    self.begin_eating(agent, resource, ctx);
                    step.entered = Some(BehaviorState::Eating);
                    step.began_eating = Some(resource);
                    return Ok(step);
                }
                SeekAction::Approach { position, .. } => {
                    agent.move_target = Some(position);
                    approaching = true;
                    if !agent.state().is_locomotion() {
                        let clip = ctx.clips.clip_duration(BehaviorState::Walking);
                        agent.machine.force(BehaviorState::Walking, ctx.now, clip, ctx.rng);
                        ctx.sink.on_state_changed(BehaviorState::Walking);
                        step.entered = Some(BehaviorState::Walking);
                    }
                }
                SeekAction::None => {
                    if had_claim {
                        agent.move_target = None;
                    }
                }
            }
        }

        // 4. State machine.
        if !agent.seek.is_consuming() {
            let context = TransitionContext {
                hunger: agent.vitals.hunger,
                happiness: agent.vitals.happiness,
                resource_nearby: self.seeking.resource_nearby(ctx.registry, agent.position, &kinds),
                airborne: ctx.bounds.is_airborne(agent.position, agent.extent),
            };
            let clips = ctx.clips;
            if let Some(next) =
                agent
                    .machine
                    .update(ctx.now, &context, |s| clips.clip_duration(s), ctx.rng)
            {
                ctx.sink.on_state_changed(next);
                step.entered = Some(next);

                // 5. Movement target.
                if !approaching {
                    agent.move_target = next
                        .is_locomotion()
                        .then(|| ctx.bounds.random_target(next, agent.extent, ctx.rng));
                }
            }
        }

        // 6. Separation and integration.
        self.integrate(agent, approaching, ctx)?;
        Ok(step)
    }

    fn begin_eating(&self, agent: &mut Agent, resource: ResourceId, ctx: &mut TickContext<'_>) {
        ResourceSeekingController::begin_consumption(&mut agent.seek, resource);
        let clip = ctx.clips.clip_duration(BehaviorState::Eating);
        let duration = agent.machine.force(BehaviorState::Eating, ctx.now, clip, ctx.rng);
        agent.move_target = None;
        ctx.queue.schedule(
            ctx.now + f64::from(duration),
            Continuation::FinishConsumption {
                agent: agent.key,
                resource,
            },
        );
        ctx.sink.on_state_changed(BehaviorState::Eating);
        debug!(agent = %agent.key, %resource, duration, "Eating started");
    }

    fn integrate(&self, agent: &mut Agent, approaching: bool, ctx: &TickContext<'_>) -> Result<(), AgentError> {
        if agent.seek.is_consuming() {
            return Ok(());
        }
        let offset = self.separation.offset(agent.key, agent.position, ctx.neighbors);
        let (target, speed) = match agent.move_target {
            Some(target) if approaching => (target, self.movement.approach_speed),
            Some(target) => (target, self.speed_for(agent.state())),
            None => (agent.position, self.movement.walk_speed),
        };
        if !(speed.is_finite() && speed > 0.0) {
            return Ok(());
        }

        let moved = agent
            .position
            .move_toward(target + offset, speed * ctx.dt.max(0.0));
        let clamped = ctx.bounds.clamp_to_area(moved, agent.extent);
        if !clamped.is_finite() {
            return Err(AgentError::NonFinitePosition { agent: agent.key });
        }
        agent.position = clamped;

        if !approaching
            && agent
                .move_target
                .is_some_and(|t| t.distance(clamped) <= self.movement.arrive_distance)
        {
            agent.move_target = None;
        }
        Ok(())
    }
}

//! The seek, claim, and consume cycle for one agent.
//!
//! Each eligible tick the controller drops whatever the agent had claimed,
//! scans wanted resources in ascending distance order, and claims the first
//! one that is free. When the claimed resource is within eat distance the
//! caller starts a consumption; finishing it goes back through
//! [`ResourceSeekingController::finish_consumption`].

use menagerie_types::{AgentKey, ResourceId, ResourceKind, Vec2};
use menagerie_world::{ClaimOutcome, ConsumableResource, ResourcePool, ResourceRegistry, WorldError};
use tracing::debug;

use crate::config::SeekingConfig;
use crate::vitals::Vitals;

/// Per-agent seeking state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeekState {
    /// Resource currently claimed by the agent.
    pub claimed: Option<ResourceId>,
    /// Resource being eaten, set between begin and finish of a consumption.
    pub consuming: Option<ResourceId>,
    /// Simulation time before which the agent does not seek.
    pub cooldown_until: f64,
}

impl SeekState {
    /// Whether a consumption is in progress.
    pub const fn is_consuming(&self) -> bool {
        self.consuming.is_some()
    }
}

/// What the agent should do after a seek step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekAction {
    /// Nothing wanted, nothing available, or not eligible this tick.
    None,
    /// Move toward the claimed resource at this position.
    Approach {
        /// The claimed resource.
        resource: ResourceId,
        /// Its position.
        position: Vec2,
    },
    /// The claimed resource is within reach; start eating it.
    Consume(ResourceId),
}

/// Resource kinds the agent currently wants, in priority order.
pub fn wanted_kinds(vitals: &Vitals, sick: bool, config: &SeekingConfig) -> Vec<ResourceKind> {
    let mut kinds = Vec::with_capacity(2);
    if sick {
        kinds.push(ResourceKind::Medicine);
    }
    if vitals.hunger < config.seek_hunger_below {
        kinds.push(ResourceKind::Food);
    }
    kinds
}

/// Drives claiming and consumption against the shared registry.
#[derive(Debug, Clone, Default)]
pub struct ResourceSeekingController {
    config: SeekingConfig,
}

impl ResourceSeekingController {
    /// Create a controller.
    pub const fn new(config: SeekingConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub const fn config(&self) -> &SeekingConfig {
        &self.config
    }

    /// Whether the agent may seek at `now`.
    pub fn is_eligible(state: &SeekState, now: f64) -> bool {
        !state.is_consuming() && now >= state.cooldown_until
    }

    /// Whether any wanted resource lies within detection range.
    pub fn resource_nearby(
        &self,
        registry: &ResourceRegistry,
        position: Vec2,
        kinds: &[ResourceKind],
    ) -> bool {
        !kinds.is_empty()
            && !registry
                .candidates_within(position, self.config.detection_radius, kinds)
                .is_empty()
    }

    /// Run one seek step for `agent`.
    pub fn step(
        &self,
        state: &mut SeekState,
        agent: AgentKey,
        position: Vec2,
        kinds: &[ResourceKind],
        registry: &mut ResourceRegistry,
        now: f64,
    ) -> SeekAction {
        if !Self::is_eligible(state, now) {
            return SeekAction::None;
        }

        if let Some(previous) = state.claimed.take() {
            registry.release(previous, agent);
        }
        if kinds.is_empty() {
            return SeekAction::None;
        }

        let candidates = registry.candidates_within(position, self.config.detection_radius, kinds);
        for (id, distance) in candidates {
            match registry.try_claim(id, agent) {
                ClaimOutcome::Claimed => {
                    state.claimed = Some(id);
                    if distance <= self.config.eat_distance {
                        return SeekAction::Consume(id);
                    }
                    let target = registry.get(id).map_or(position, |r| r.position);
                    return SeekAction::Approach {
                        resource: id,
                        position: target,
                    };
                }
                ClaimOutcome::AlreadyOwned(_) | ClaimOutcome::NotFound => {}
            }
        }
        SeekAction::None
    }

    /// Mark the start of a consumption of `id`.
    pub fn begin_consumption(state: &mut SeekState, id: ResourceId) {
        state.claimed = Some(id);
        state.consuming = Some(id);
    }

    /// Complete a consumption started with
    /// [`begin_consumption`](Self::begin_consumption).
    ///
    /// Removes the resource, returns it to the pool, clears the claim, and
    /// stamps the cooldown. The seek state is cleared even on error.
    pub fn finish_consumption(
        &self,
        state: &mut SeekState,
        agent: AgentKey,
        registry: &mut ResourceRegistry,
        pool: &mut dyn ResourcePool,
        now: f64,
    ) -> Result<ConsumableResource, WorldError> {
        let id = state.consuming.take().ok_or(WorldError::NoConsumption(agent))?;
        state.claimed = None;
        let eaten = registry.consume(pool, id, agent)?;
        state.cooldown_until = now + f64::from(self.config.cooldown_secs);
        debug!(%agent, %id, until = state.cooldown_until, "Consumption finished");
        Ok(eaten)
    }

    /// Forget `id` after it left the world without being consumed.
    ///
    /// Returns `true` if the agent was claiming or eating it.
    pub fn on_resource_removed(state: &mut SeekState, id: ResourceId) -> bool {
        let mut touched = false;
        if state.claimed == Some(id) {
            state.claimed = None;
            touched = true;
        }
        if state.consuming == Some(id) {
            state.consuming = None;
            touched = true;
        }
        touched
    }

    /// Release everything the agent holds (used on despawn).
    pub fn abandon(state: &mut SeekState, agent: AgentKey, registry: &mut ResourceRegistry) {
        registry.release_all(agent);
        state.claimed = None;
        state.consuming = None;
    }
}

#[cfg(test)]
mod tests {
    use menagerie_types::ResourceKind;
    use menagerie_world::InMemoryPool;

    use super::*;

    const A: AgentKey = AgentKey(1);
    const B: AgentKey = AgentKey(2);

    fn world() -> (ResourceRegistry, InMemoryPool) {
        (ResourceRegistry::new(), InMemoryPool::default())
    }

    fn spawn(reg: &mut ResourceRegistry, pool: &mut InMemoryPool, x: f32) -> ResourceId {
        reg.spawn(pool, ResourceKind::Food, Vec2::new(x, 0.0), 20.0)
            .unwrap_or(ResourceId(0))
    }

    const FOOD: &[ResourceKind] = &[ResourceKind::Food];

    #[test]
    fn wanted_kinds_follow_vitals() {
        let config = SeekingConfig::default();
        let mut vitals = Vitals::new(100.0, 50.0, 100.0);
        assert!(wanted_kinds(&vitals, false, &config).is_empty());
        vitals.hunger = 40.0;
        assert_eq!(wanted_kinds(&vitals, false, &config), vec![ResourceKind::Food]);
        assert_eq!(
            wanted_kinds(&vitals, true, &config),
            vec![ResourceKind::Medicine, ResourceKind::Food]
        );
    }

    #[test]
    fn nearest_free_resource_is_claimed() {
        let (mut reg, mut pool) = world();
        let near = spawn(&mut reg, &mut pool, 50.0);
        let far = spawn(&mut reg, &mut pool, 100.0);
        let seeker = ResourceSeekingController::default();

        let mut a = SeekState::default();
        let action = seeker.step(&mut a, A, Vec2::ZERO, FOOD, &mut reg, 0.0);
        assert_eq!(
            action,
            SeekAction::Approach {
                resource: near,
                position: Vec2::new(50.0, 0.0)
            }
        );

        // B skips A's claim without disturbing it.
        let mut b = SeekState::default();
        let action = seeker.step(&mut b, B, Vec2::ZERO, FOOD, &mut reg, 0.0);
        assert!(matches!(action, SeekAction::Approach { resource, .. } if resource == far));
        assert_eq!(reg.owner_of(near), Some(A));
        assert_eq!(reg.owner_of(far), Some(B));
    }

    #[test]
    fn reseek_releases_previous_claim() {
        let (mut reg, mut pool) = world();
        let first = spawn(&mut reg, &mut pool, 200.0);
        let seeker = ResourceSeekingController::default();
        let mut a = SeekState::default();
        let _ = seeker.step(&mut a, A, Vec2::ZERO, FOOD, &mut reg, 0.0);
        assert_eq!(a.claimed, Some(first));

        // A closer resource appears; the old claim is dropped.
        let closer = spawn(&mut reg, &mut pool, 30.0);
        let _ = seeker.step(&mut a, A, Vec2::ZERO, FOOD, &mut reg, 0.1);
        assert_eq!(a.claimed, Some(closer));
        assert_eq!(reg.owner_of(first), None);
    }

    #[test]
    fn in_reach_resource_is_consumed_once() {
        let (mut reg, mut pool) = world();
        let id = spawn(&mut reg, &mut pool, 5.0);
        let seeker = ResourceSeekingController::default();
        let mut a = SeekState::default();

        assert_eq!(
            seeker.step(&mut a, A, Vec2::ZERO, FOOD, &mut reg, 0.0),
            SeekAction::Consume(id)
        );
        ResourceSeekingController::begin_consumption(&mut a, id);
        assert!(!ResourceSeekingController::is_eligible(&a, 0.5));
        assert_eq!(
            seeker.step(&mut a, A, Vec2::ZERO, FOOD, &mut reg, 0.5),
            SeekAction::None
        );

        let eaten = seeker.finish_consumption(&mut a, A, &mut reg, &mut pool, 2.0);
        assert!((eaten.map(|r| r.nutrition).unwrap_or_default() - 20.0).abs() < f32::EPSILON);
        assert!(a.claimed.is_none() && !a.is_consuming());
        assert!((a.cooldown_until - 5.0).abs() < 1e-9);

        // A second finish has nothing left to consume.
        assert_eq!(
            seeker.finish_consumption(&mut a, A, &mut reg, &mut pool, 2.0),
            Err(WorldError::NoConsumption(A))
        );
        assert!(!ResourceSeekingController::is_eligible(&a, 4.0));
        assert!(ResourceSeekingController::is_eligible(&a, 5.0));
    }

    #[test]
    fn removed_resource_clears_state() {
        let (mut reg, mut pool) = world();
        let id = spawn(&mut reg, &mut pool, 5.0);
        let seeker = ResourceSeekingController::default();
        let mut a = SeekState::default();
        let _ = seeker.step(&mut a, A, Vec2::ZERO, FOOD, &mut reg, 0.0);
        ResourceSeekingController::begin_consumption(&mut a, id);

        let _ = reg.despawn(&mut pool, id);
        assert!(ResourceSeekingController::on_resource_removed(&mut a, id));
        assert_eq!(a, SeekState::default());
        assert!(!ResourceSeekingController::on_resource_removed(&mut a, id));
    }

    #[test]
    fn nothing_in_range_yields_none() {
        let (mut reg, mut pool) = world();
        let _ = spawn(&mut reg, &mut pool, 5_000.0);
        let seeker = ResourceSeekingController::default();
        let mut a = SeekState::default();
        assert_eq!(
            seeker.step(&mut a, A, Vec2::ZERO, FOOD, &mut reg, 0.0),
            SeekAction::None
        );
        assert!(!seeker.resource_nearby(&reg, Vec2::ZERO, FOOD));
    }
}

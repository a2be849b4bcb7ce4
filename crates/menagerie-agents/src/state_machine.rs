//! Per-agent behavior state machine.
//!
//! The machine holds the current [`BehaviorState`] and the time at which it
//! expires. On expiry it selects the next state from the agent's level
//! config ([`BehaviorTable`]) by weighted draw, or from a fixed fallback
//! table when no rule applies.

use std::sync::Arc;

use menagerie_types::BehaviorState;
use rand::Rng;
use tracing::debug;

use crate::behavior::{BehaviorTable, LevelBehaviorConfig, TransitionContext, TransitionRule};

/// Shortest presentation clip accepted as a state duration, in seconds.
pub const MIN_CLIP_SECS: f32 = 0.5;

/// Longest presentation clip accepted as a state duration, in seconds.
pub const MAX_CLIP_SECS: f32 = 10.0;

/// Return `clip` if it is usable as a state duration.
pub fn valid_clip(clip: Option<f32>) -> Option<f32> {
    clip.filter(|c| (MIN_CLIP_SECS..=MAX_CLIP_SECS).contains(c))
}

/// Pick a rule by weight.
///
/// Draws uniformly in `[0, total)` and returns the first rule whose
/// cumulative weight reaches the draw. Returns `None` for an empty slice.
pub fn weighted_pick(rules: &[&TransitionRule], rng: &mut impl Rng) -> Option<BehaviorState> {
    let total: f32 = rules.iter().map(|r| r.weight).sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    let draw = rng.random_range(0.0..total);
    let mut cumulative = 0.0_f32;
    for rule in rules {
        cumulative += rule.weight;
        if cumulative >= draw {
            return Some(rule.to);
        }
    }
    // Rounding can leave the sum a hair below the draw.
    rules.last().map(|r| r.to)
}

/// Fixed transition used when no configured rule applies.
pub fn fallback_state(current: BehaviorState, airborne: bool, rng: &mut impl Rng) -> BehaviorState {
    use BehaviorState::{Eating, Flying, Idle, Jumping, Playing, Running, Sleeping, Walking};

    match (current, airborne) {
        (Idle, true) => {
            if rng.random_ratio(1, 3) {
                Flying
            } else {
                Idle
            }
        }
        (Idle, false) => {
            if rng.random_bool(0.5) {
                Walking
            } else {
                Idle
            }
        }
        (Walking | Running, true) => Flying,
        (Walking, false) => {
            if rng.random_bool(0.5) {
                Idle
            } else {
                Walking
            }
        }
        (Running, false) => Walking,
        (Flying, true) => {
            if rng.random_bool(0.5) {
                Flying
            } else {
                Idle
            }
        }
        (Flying, false) | (Jumping | Sleeping | Playing | Eating, _) => Idle,
    }
}

/// Behavior state of one agent.
#[derive(Debug, Clone)]
pub struct AgentStateMachine {
    table: Arc<BehaviorTable>,
    level: u32,
    cached: Option<(u32, Arc<LevelBehaviorConfig>)>,
    state: BehaviorState,
    /// Simulation time (seconds) at which the current state expires.
    expires_at: f64,
}

impl AgentStateMachine {
    /// A machine at `level`, in `Idle`, due for re-selection immediately.
    pub const fn new(table: Arc<BehaviorTable>, level: u32) -> Self {
        Self {
            table,
            level,
            cached: None,
            state: BehaviorState::Idle,
            expires_at: 0.0,
        }
    }

    /// Current state.
    pub const fn state(&self) -> BehaviorState {
        self.state
    }

    /// Level whose config drives selection.
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Time at which the current state expires.
    pub const fn expires_at(&self) -> f64 {
        self.expires_at
    }

    /// Change the level. The cached level config is dropped only if the
    /// level actually changed.
    pub fn set_level(&mut self, level: u32) {
        if level != self.level {
            self.level = level;
            self.cached = None;
        }
    }

    /// Config for the current level, resolved through a single-entry cache.
    pub fn level_config(&mut self) -> Arc<LevelBehaviorConfig> {
        if let Some((level, config)) = &self.cached
            && *level == self.level
        {
            return Arc::clone(config);
        }
        let config = self.table.for_level(self.level);
        self.cached = Some((self.level, Arc::clone(&config)));
        config
    }

    /// Whether the level config is currently cached.
    pub const fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Choose the state that follows `current`.
    ///
    /// Eating always resolves to Idle or Walking with equal probability.
    /// Otherwise eligible rules are drawn by weight, and the fallback
    /// table is used when none are eligible.
    pub fn select_next_state(
        &mut self,
        current: BehaviorState,
        context: &TransitionContext,
        rng: &mut impl Rng,
    ) -> BehaviorState {
        if current == BehaviorState::Eating {
            return if rng.random_bool(0.5) {
                BehaviorState::Idle
            } else {
                BehaviorState::Walking
            };
        }
        let config = self.level_config();
        let eligible: Vec<&TransitionRule> = config.eligible_rules(current, context).collect();
        weighted_pick(&eligible, rng)
            .unwrap_or_else(|| fallback_state(current, context.airborne, rng))
    }

    /// Seconds to hold `state`.
    ///
    /// Non-locomotion states use the clip duration when it is usable and a
    /// random draw from the level's range otherwise. Locomotion states
    /// always draw, then round up to a whole number of clip cycles.
    pub fn state_duration(
        &mut self,
        state: BehaviorState,
        clip: Option<f32>,
        rng: &mut impl Rng,
    ) -> f32 {
        let clip = valid_clip(clip);
        let range = self.level_config().duration_range(state);
        if state.is_locomotion() {
            let drawn = range.sample(rng);
            clip.map_or(drawn, |cycle| (drawn / cycle).ceil().max(1.0) * cycle)
        } else {
            clip.unwrap_or_else(|| range.sample(rng))
        }
    }

    /// Advance the machine to `now`.
    ///
    /// When the current state has expired, selects and enters the next
    /// state and returns it. Returns `None` while the state still holds.
    pub fn update(
        &mut self,
        now: f64,
        context: &TransitionContext,
        clip_for: impl Fn(BehaviorState) -> Option<f32>,
        rng: &mut impl Rng,
    ) -> Option<BehaviorState> {
        if now < self.expires_at {
            return None;
        }
        let previous = self.state;
        let next = self.select_next_state(previous, context, rng);
        let duration = self.state_duration(next, clip_for(next), rng);
        self.state = next;
        self.expires_at = now + f64::from(duration);
        debug!(from = %previous, to = %next, duration, "State selected");
        Some(next)
    }

    /// Enter `state` immediately, holding it for its normal duration.
    ///
    /// Returns the chosen duration.
    pub fn force(
        &mut self,
        state: BehaviorState,
        now: f64,
        clip: Option<f32>,
        rng: &mut impl Rng,
    ) -> f32 {
        let duration = self.state_duration(state, clip, rng);
        self.state = state;
        self.expires_at = now + f64::from(duration);
        duration
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::behavior::{DurationRange, LevelBehaviorConfig};

    fn grounded(hunger: f32) -> TransitionContext {
        TransitionContext {
            hunger,
            happiness: 50.0,
            resource_nearby: false,
            airborne: false,
        }
    }

    fn machine_with(rules: Vec<TransitionRule>) -> AgentStateMachine {
        let config = LevelBehaviorConfig {
            rules,
            durations: BTreeMap::new(),
        };
        let table = BehaviorTable::new(BTreeMap::from([(1, config)]));
        AgentStateMachine::new(Arc::new(table), 1)
    }

    #[test]
    #[allow(clippy::arithmetic_side_effects)]
    fn weighted_selection_follows_weights() {
        let mut machine = machine_with(vec![
            TransitionRule::new(BehaviorState::Idle, BehaviorState::Walking, 3.0),
            TransitionRule::new(BehaviorState::Idle, BehaviorState::Jumping, 1.0),
        ]);
        let mut rng = SmallRng::seed_from_u64(42);
        let ctx = grounded(50.0);

        let draws = 100_000_u32;
        let mut walking = 0_u32;
        let mut jumping = 0_u32;
        for _ in 0..draws {
            match machine.select_next_state(BehaviorState::Idle, &ctx, &mut rng) {
                BehaviorState::Walking => walking += 1,
                BehaviorState::Jumping => jumping += 1,
                _ => {}
            }
        }
        assert_eq!(walking + jumping, draws);
        let share = f64::from(walking) / f64::from(draws);
        assert!((share - 0.75).abs() < 0.01, "walking share {share}");
    }

    #[test]
    fn gated_out_rules_fall_back() {
        let mut gated = TransitionRule::new(BehaviorState::Walking, BehaviorState::Running, 1.0);
        gated.min_hunger = 90.0;
        let mut machine = machine_with(vec![gated]);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..200 {
            let next = machine.select_next_state(BehaviorState::Walking, &grounded(10.0), &mut rng);
            assert!(matches!(next, BehaviorState::Idle | BehaviorState::Walking));
        }
    }

    #[test]
    fn eating_bypasses_rules() {
        let mut machine = machine_with(vec![TransitionRule::new(
            BehaviorState::Eating,
            BehaviorState::Sleeping,
            10.0,
        )]);
        let mut rng = SmallRng::seed_from_u64(9);
        let mut seen_idle = false;
        let mut seen_walking = false;
        for _ in 0..200 {
            let next = machine.select_next_state(BehaviorState::Eating, &grounded(50.0), &mut rng);
            assert!(matches!(next, BehaviorState::Idle | BehaviorState::Walking), "{next}");
            seen_idle |= next == BehaviorState::Idle;
            seen_walking |= next == BehaviorState::Walking;
        }
        assert!(seen_idle && seen_walking);
    }

    #[test]
    fn fallback_table_respects_airborne_flag() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..200 {
            assert_eq!(
                fallback_state(BehaviorState::Walking, true, &mut rng),
                BehaviorState::Flying
            );
            assert_eq!(
                fallback_state(BehaviorState::Running, false, &mut rng),
                BehaviorState::Walking
            );
            assert_eq!(
                fallback_state(BehaviorState::Flying, false, &mut rng),
                BehaviorState::Idle
            );
            assert_eq!(
                fallback_state(BehaviorState::Sleeping, true, &mut rng),
                BehaviorState::Idle
            );
            let idle_air = fallback_state(BehaviorState::Idle, true, &mut rng);
            assert!(matches!(idle_air, BehaviorState::Idle | BehaviorState::Flying));
            let idle_ground = fallback_state(BehaviorState::Idle, false, &mut rng);
            assert!(matches!(idle_ground, BehaviorState::Idle | BehaviorState::Walking));
        }
    }

    #[test]
    fn clip_duration_used_only_in_range() {
        let mut machine = machine_with(Vec::new());
        let mut rng = SmallRng::seed_from_u64(1);

        let exact = machine.state_duration(BehaviorState::Jumping, Some(1.25), &mut rng);
        assert!((exact - 1.25).abs() < f32::EPSILON);

        let too_short = machine.state_duration(BehaviorState::Jumping, Some(0.1), &mut rng);
        assert!((0.8..=1.5).contains(&too_short));

        let too_long = machine.state_duration(BehaviorState::Sleeping, Some(30.0), &mut rng);
        assert!((5.0..=10.0).contains(&too_long));
    }

    #[test]
    fn locomotion_rounds_up_to_clip_cycles() {
        let mut machine = machine_with(Vec::new());
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..100 {
            let d = machine.state_duration(BehaviorState::Walking, Some(0.8), &mut rng);
            let cycles = d / 0.8;
            assert!((cycles - cycles.round()).abs() < 1e-3, "{d} is not whole cycles");
            assert!((3.0..=6.8).contains(&d));
        }
        let unclipped = machine.state_duration(BehaviorState::Flying, None, &mut rng);
        assert!((3.0..=6.0).contains(&unclipped));
    }

    #[test]
    fn configured_duration_overrides_default() {
        let config = LevelBehaviorConfig {
            rules: Vec::new(),
            durations: BTreeMap::from([(BehaviorState::Idle, DurationRange::new(0.5, 0.5))]),
        };
        let table = BehaviorTable::new(BTreeMap::from([(1, config)]));
        let mut machine = AgentStateMachine::new(Arc::new(table), 1);
        let mut rng = SmallRng::seed_from_u64(4);
        let d = machine.state_duration(BehaviorState::Idle, None, &mut rng);
        assert!((d - 0.5).abs() < f32::EPSILON);

        // Level 2 has no entry and degrades to the built-in range.
        machine.set_level(2);
        let d = machine.state_duration(BehaviorState::Idle, None, &mut rng);
        assert!((2.0..=5.0).contains(&d));
    }

    #[test]
    fn cache_invalidated_only_on_level_change() {
        let mut machine = machine_with(Vec::new());
        assert!(!machine.is_cached());
        let _ = machine.level_config();
        assert!(machine.is_cached());
        machine.set_level(1);
        assert!(machine.is_cached());
        machine.set_level(2);
        assert!(!machine.is_cached());
        assert_eq!(machine.level(), 2);
    }

    #[test]
    fn update_holds_until_expiry() {
        let mut machine = machine_with(vec![TransitionRule::new(
            BehaviorState::Idle,
            BehaviorState::Sleeping,
            1.0,
        )]);
        let mut rng = SmallRng::seed_from_u64(8);
        let ctx = grounded(50.0);

        let entered = machine.update(0.0, &ctx, |_| Some(6.0), &mut rng);
        assert_eq!(entered, Some(BehaviorState::Sleeping));
        assert!((machine.expires_at() - 6.0).abs() < 1e-9);

        assert_eq!(machine.update(5.9, &ctx, |_| Some(6.0), &mut rng), None);
        assert!(machine.update(6.0, &ctx, |_| Some(6.0), &mut rng).is_some());
    }

    #[test]
    fn force_switches_immediately() {
        let mut machine = machine_with(Vec::new());
        let mut rng = SmallRng::seed_from_u64(6);
        let held = machine.force(BehaviorState::Eating, 10.0, Some(2.5), &mut rng);
        assert_eq!(machine.state(), BehaviorState::Eating);
        assert!((held - 2.5).abs() < f32::EPSILON);
        assert!((machine.expires_at() - 12.5).abs() < 1e-9);
    }
}

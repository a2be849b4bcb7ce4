//! Per-level behavior configuration: transition rules and state durations.
//!
//! A [`BehaviorTable`] maps each evolution level to a
//! [`LevelBehaviorConfig`]. Levels without an entry fall back to
//! [`LevelBehaviorConfig::default`], which has no rules (so the state
//! machine uses its built-in fallback transitions) and the built-in
//! duration ranges.

use std::collections::BTreeMap;
use std::sync::Arc;

use menagerie_types::BehaviorState;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inputs that gate transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransitionContext {
    /// Current hunger (satiety).
    pub hunger: f32,
    /// Current happiness.
    pub happiness: f32,
    /// Whether a wanted resource is within detection range.
    pub resource_nearby: bool,
    /// Whether the agent is above the ground band.
    pub airborne: bool,
}

/// A weighted edge in the behavior graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRule {
    /// State the rule applies to.
    pub from: BehaviorState,
    /// State the rule leads to.
    pub to: BehaviorState,
    /// Relative selection weight. Rules with `weight <= 0` are dropped.
    pub weight: f32,
    /// Rule applies only when hunger is at least this value.
    #[serde(default)]
    pub min_hunger: f32,
    /// Rule applies only when happiness is at least this value.
    #[serde(default)]
    pub min_happiness: f32,
    /// Rule applies only when a wanted resource is nearby.
    #[serde(default)]
    pub requires_nearby_resource: bool,
}

impl TransitionRule {
    /// An ungated rule.
    pub const fn new(from: BehaviorState, to: BehaviorState, weight: f32) -> Self {
        Self {
            from,
            to,
            weight,
            min_hunger: 0.0,
            min_happiness: 0.0,
            requires_nearby_resource: false,
        }
    }

    /// Whether the rule's gates pass in `context`.
    pub fn is_satisfied(&self, context: &TransitionContext) -> bool {
        context.hunger >= self.min_hunger
            && context.happiness >= self.min_happiness
            && (!self.requires_nearby_resource || context.resource_nearby)
    }

    fn has_usable_weight(&self) -> bool {
        self.weight.is_finite() && self.weight > 0.0
    }
}

/// An inclusive range of seconds to hold a state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    /// Shortest duration.
    pub min: f32,
    /// Longest duration.
    pub max: f32,
}

impl DurationRange {
    /// Create a range.
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draw a duration uniformly from the range.
    ///
    /// An empty or inverted range yields `min` (or zero if `min` is not a
    /// usable number).
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        let min = if self.min.is_finite() { self.min.max(0.0) } else { 0.0 };
        if self.max.is_finite() && self.max > min {
            rng.random_range(min..=self.max)
        } else {
            min
        }
    }
}

/// Built-in duration range for `state`.
pub const fn default_duration(state: BehaviorState) -> DurationRange {
    match state {
        BehaviorState::Idle => DurationRange::new(2.0, 5.0),
        BehaviorState::Walking | BehaviorState::Flying => DurationRange::new(3.0, 6.0),
        BehaviorState::Running => DurationRange::new(2.0, 4.0),
        BehaviorState::Jumping => DurationRange::new(0.8, 1.5),
        BehaviorState::Sleeping => DurationRange::new(5.0, 10.0),
        BehaviorState::Playing | BehaviorState::Eating => DurationRange::new(2.0, 3.0),
    }
}

/// Transition rules and durations for one evolution level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelBehaviorConfig {
    /// Weighted transitions, in selection order.
    pub rules: Vec<TransitionRule>,
    /// Duration overrides. States not listed use [`default_duration`].
    pub durations: BTreeMap<BehaviorState, DurationRange>,
}

impl LevelBehaviorConfig {
    /// Duration range for `state`, falling back to the built-in range.
    pub fn duration_range(&self, state: BehaviorState) -> DurationRange {
        self.durations
            .get(&state)
            .copied()
            .unwrap_or_else(|| default_duration(state))
    }

    /// Rules leaving `from` whose gates pass in `context`, in list order.
    pub fn eligible_rules<'a>(
        &'a self,
        from: BehaviorState,
        context: &'a TransitionContext,
    ) -> impl Iterator<Item = &'a TransitionRule> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.from == from && rule.is_satisfied(context))
    }
}

/// Level-indexed behavior configuration shared by every state machine.
#[derive(Debug, Clone, Default)]
pub struct BehaviorTable {
    levels: BTreeMap<u32, Arc<LevelBehaviorConfig>>,
    fallback: Arc<LevelBehaviorConfig>,
}

impl BehaviorTable {
    /// Build a table, discarding rules with non-positive or non-finite
    /// weight.
    pub fn new(levels: BTreeMap<u32, LevelBehaviorConfig>) -> Self {
        let levels = levels
            .into_iter()
            .map(|(level, mut config)| {
                config.rules.retain(TransitionRule::has_usable_weight);
                (level, Arc::new(config))
            })
            .collect();
        Self {
            levels,
            fallback: Arc::new(LevelBehaviorConfig::default()),
        }
    }

    /// Config for `level`, or the built-in defaults if none is configured.
    pub fn for_level(&self, level: u32) -> Arc<LevelBehaviorConfig> {
        self.levels
            .get(&level)
            .map_or_else(|| Arc::clone(&self.fallback), Arc::clone)
    }

    /// Whether `level` has an explicit entry.
    pub fn has_level(&self, level: u32) -> bool {
        self.levels.contains_key(&level)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn gates_filter_rules() {
        let mut gated = TransitionRule::new(BehaviorState::Idle, BehaviorState::Playing, 1.0);
        gated.min_happiness = 50.0;
        gated.requires_nearby_resource = true;

        let mut ctx = TransitionContext {
            hunger: 80.0,
            happiness: 60.0,
            resource_nearby: false,
            airborne: false,
        };
        assert!(!gated.is_satisfied(&ctx));
        ctx.resource_nearby = true;
        assert!(gated.is_satisfied(&ctx));
        ctx.happiness = 10.0;
        assert!(!gated.is_satisfied(&ctx));
    }

    #[test]
    fn non_positive_weights_are_dropped() {
        let config = LevelBehaviorConfig {
            rules: vec![
                TransitionRule::new(BehaviorState::Idle, BehaviorState::Walking, 2.0),
                TransitionRule::new(BehaviorState::Idle, BehaviorState::Running, 0.0),
                TransitionRule::new(BehaviorState::Idle, BehaviorState::Sleeping, -1.0),
                TransitionRule::new(BehaviorState::Idle, BehaviorState::Jumping, f32::NAN),
            ],
            durations: BTreeMap::new(),
        };
        let table = BehaviorTable::new(BTreeMap::from([(1, config)]));
        let level = table.for_level(1);
        assert_eq!(level.rules.len(), 1);
        assert_eq!(level.rules.first().map(|r| r.to), Some(BehaviorState::Walking));
    }

    #[test]
    fn missing_level_uses_defaults() {
        let table = BehaviorTable::new(BTreeMap::new());
        assert!(!table.has_level(4));
        let level = table.for_level(4);
        assert!(level.rules.is_empty());
        assert_eq!(
            level.duration_range(BehaviorState::Sleeping),
            DurationRange::new(5.0, 10.0)
        );
    }

    #[test]
    fn duration_sample_stays_in_range() {
        let mut rng = SmallRng::seed_from_u64(11);
        let range = DurationRange::new(0.8, 1.5);
        for _ in 0..1000 {
            let d = range.sample(&mut rng);
            assert!((0.8..=1.5).contains(&d));
        }
        let inverted = DurationRange::new(3.0, 1.0);
        assert!((inverted.sample(&mut rng) - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn level_config_parses_from_yaml() {
        let yaml = "\
rules:
  - from: idle
    to: walking
    weight: 3.0
  - from: idle
    to: sleeping
    weight: 1.0
    min_hunger: 40.0
durations:
  idle: { min: 1.0, max: 2.0 }
";
        let parsed: Result<LevelBehaviorConfig, _> = serde_yml::from_str(yaml);
        assert!(parsed.is_ok());
        let config = parsed.unwrap_or_default();
        assert_eq!(config.rules.len(), 2);
        assert_eq!(
            config.duration_range(BehaviorState::Idle),
            DurationRange::new(1.0, 2.0)
        );
        assert_eq!(
            config.duration_range(BehaviorState::Walking),
            DurationRange::new(3.0, 6.0)
        );
    }
}

//! Hunger, happiness, and health mechanics.
//!
//! Vitals decay continuously with simulated time and are restored by
//! consuming resources and by interactions. Every value is clamped to
//! `0..=VITAL_MAX` after each change. Sickness is not stored: it is derived
//! from health on demand.

use menagerie_types::ResourceKind;
use serde::{Deserialize, Serialize};

use crate::config::VitalsConfig;

/// Upper bound of every vital.
pub const VITAL_MAX: f32 = 100.0;

fn clamp_vital(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, VITAL_MAX)
    }
}

/// The three bounded scalars that describe an agent's wellbeing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Satiety. Higher is better fed.
    pub hunger: f32,
    /// Mood.
    pub happiness: f32,
    /// Health. Low health makes the agent sick.
    pub health: f32,
}

impl Vitals {
    /// Create vitals, clamping each value into range.
    pub fn new(hunger: f32, happiness: f32, health: f32) -> Self {
        Self {
            hunger: clamp_vital(hunger),
            happiness: clamp_vital(happiness),
            health: clamp_vital(health),
        }
    }

    /// Starting vitals for a new agent.
    pub fn starting(config: &VitalsConfig) -> Self {
        Self::new(
            config.starting_hunger,
            config.starting_happiness,
            config.starting_health,
        )
    }

    fn clamp(&mut self) {
        self.hunger = clamp_vital(self.hunger);
        self.happiness = clamp_vital(self.happiness);
        self.health = clamp_vital(self.health);
    }
}

/// Applies [`VitalsConfig`] rates to [`Vitals`].
#[derive(Debug, Clone, Default)]
pub struct AgentVitalsTracker {
    config: VitalsConfig,
}

impl AgentVitalsTracker {
    /// Create a tracker.
    pub const fn new(config: VitalsConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub const fn config(&self) -> &VitalsConfig {
        &self.config
    }

    /// Whether health is below the sick threshold.
    pub fn is_sick(&self, vitals: &Vitals) -> bool {
        vitals.health < self.config.sick_health_threshold
    }

    /// Whether hunger is below the hungry threshold.
    pub fn is_hungry(&self, vitals: &Vitals) -> bool {
        vitals.hunger < self.config.hungry_threshold
    }

    /// Apply `dt` seconds of decay and recovery.
    ///
    /// Order: hunger, happiness (doubled while hungry), starvation damage,
    /// then natural healing. Non-positive or non-finite `dt` is ignored.
    pub fn decay(&self, vitals: &mut Vitals, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        let c = &self.config;

        vitals.hunger -= c.hunger_decay * dt;
        vitals.clamp();

        let mood_rate = if self.is_hungry(vitals) {
            c.happiness_decay * 2.0
        } else {
            c.happiness_decay
        };
        vitals.happiness -= mood_rate * dt;

        if vitals.hunger <= 0.0 {
            vitals.health -= c.starvation_damage * dt;
        } else if vitals.hunger >= c.heal_hunger_threshold {
            vitals.health += c.natural_heal_rate * dt;
        }
        vitals.clamp();
    }

    /// Apply the effect of consuming a resource.
    ///
    /// Food restores hunger and a fraction of happiness; medicine restores
    /// health.
    pub fn apply_consumption(&self, vitals: &mut Vitals, kind: ResourceKind, nutrition: f32) {
        let amount = if nutrition.is_finite() { nutrition.max(0.0) } else { 0.0 };
        match kind {
            ResourceKind::Food => {
                vitals.hunger += amount;
                vitals.happiness += amount * self.config.food_happiness_ratio;
            }
            ResourceKind::Medicine => {
                vitals.health += amount;
            }
        }
        vitals.clamp();
    }

    /// Apply the effect of being interacted with.
    pub fn on_interaction(&self, vitals: &mut Vitals) {
        vitals.happiness += self.config.interaction_happiness;
        vitals.clamp();
    }

    /// Restore vitals after an evolution: full health and at least the
    /// starting happiness.
    pub fn refresh_after_evolution(&self, vitals: &mut Vitals) {
        vitals.health = VITAL_MAX;
        vitals.happiness = vitals.happiness.max(self.config.starting_happiness);
        vitals.clamp();
    }
}

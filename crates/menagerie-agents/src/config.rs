//! Configuration and defaults for per-agent mechanics.
//!
//! Each struct maps to one section of `menagerie-config.yaml`. Every field
//! has a default, so a partial (or empty) section is always valid.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vitals
// ---------------------------------------------------------------------------

/// Decay and recovery rates for hunger, happiness, and health.
///
/// Rates are per second of simulated time. Every vital lives in `0..=100`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    /// Satiety lost per second (default: 0.5).
    pub hunger_decay: f32,

    /// Happiness lost per second (default: 0.2). Doubled while hungry.
    pub happiness_decay: f32,

    /// Hunger below which the agent counts as hungry (default: 30).
    pub hungry_threshold: f32,

    /// Health lost per second while hunger is zero (default: 1).
    pub starvation_damage: f32,

    /// Health regained per second while well fed (default: 0.5).
    pub natural_heal_rate: f32,

    /// Hunger at or above which health regenerates (default: 50).
    pub heal_hunger_threshold: f32,

    /// Health below which the agent is sick (default: 30).
    pub sick_health_threshold: f32,

    /// Happiness gained per interaction (default: 10).
    pub interaction_happiness: f32,

    /// Fraction of food nutrition also added to happiness (default: 0.25).
    pub food_happiness_ratio: f32,

    /// Starting hunger for new agents (default: 80).
    pub starting_hunger: f32,

    /// Starting happiness for new agents (default: 70).
    pub starting_happiness: f32,

    /// Starting health for new agents (default: 100).
    pub starting_health: f32,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            hunger_decay: 0.5,
            happiness_decay: 0.2,
            hungry_threshold: 30.0,
            starvation_damage: 1.0,
            natural_heal_rate: 0.5,
            heal_hunger_threshold: 50.0,
            sick_health_threshold: 30.0,
            interaction_happiness: 10.0,
            food_happiness_ratio: 0.25,
            starting_hunger: 80.0,
            starting_happiness: 70.0,
            starting_health: 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Seeking
// ---------------------------------------------------------------------------

/// Parameters of the resource seek/claim/consume cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeekingConfig {
    /// Radius within which resources are detected (default: 300).
    pub detection_radius: f32,

    /// Distance at which a claimed resource can be eaten (default: 24).
    pub eat_distance: f32,

    /// Seconds after a consumption before seeking again (default: 3).
    pub cooldown_secs: f32,

    /// Food is wanted while hunger is below this value (default: 95).
    pub seek_hunger_below: f32,
}

impl Default for SeekingConfig {
    fn default() -> Self {
        Self {
            detection_radius: 300.0,
            eat_distance: 24.0,
            cooldown_secs: 3.0,
            seek_hunger_below: 95.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Separation
// ---------------------------------------------------------------------------

/// Neighbor repulsion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationConfig {
    /// Whether separation is applied at all (default: true).
    pub enabled: bool,

    /// Neighbors closer than this push each other apart (default: 48).
    pub radius: f32,

    /// Offset applied at zero distance (default: 40).
    pub force: f32,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 48.0,
            force: 40.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Per-state movement speeds in units per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Walking speed (default: 60).
    pub walk_speed: f32,

    /// Running speed (default: 120).
    pub run_speed: f32,

    /// Flying speed (default: 90).
    pub fly_speed: f32,

    /// Speed used when approaching a claimed resource (default: 60).
    pub approach_speed: f32,

    /// Distance at which a movement target counts as reached (default: 1).
    pub arrive_distance: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 60.0,
            run_speed: 120.0,
            fly_speed: 90.0,
            approach_speed: 60.0,
            arrive_distance: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Evolution
// ---------------------------------------------------------------------------

/// Thresholds for reaching one evolution level, as written in config.
///
/// Zero thresholds are trivially satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementConfig {
    /// The level this requirement unlocks.
    pub target_level: u32,

    /// Seconds alive at the current level.
    pub min_time_alive: f32,

    /// Resources consumed at the current level.
    pub min_resources_consumed: u32,

    /// Interactions received at the current level.
    pub min_interactions: u32,

    /// Minimum happiness.
    pub min_happiness: f32,

    /// Minimum hunger (satiety).
    pub min_hunger: f32,
}

impl Default for RequirementConfig {
    fn default() -> Self {
        Self {
            target_level: 2,
            min_time_alive: 0.0,
            min_resources_consumed: 0,
            min_interactions: 0,
            min_happiness: 0.0,
            min_hunger: 0.0,
        }
    }
}

/// Evolution cadence and per-level requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Seconds between periodic requirement checks (default: 5).
    pub check_interval_secs: f32,

    /// Delay before re-checking after an interaction (default: 2).
    pub interaction_delay_secs: f32,

    /// Requirements, one per reachable level (default: levels 2 and 3).
    pub requirements: Vec<RequirementConfig>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 5.0,
            interaction_delay_secs: 2.0,
            requirements: vec![
                RequirementConfig {
                    target_level: 2,
                    min_time_alive: 60.0,
                    min_resources_consumed: 3,
                    min_interactions: 2,
                    min_happiness: 40.0,
                    min_hunger: 0.0,
                },
                RequirementConfig {
                    target_level: 3,
                    min_time_alive: 180.0,
                    min_resources_consumed: 8,
                    min_interactions: 5,
                    min_happiness: 60.0,
                    min_hunger: 50.0,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let vitals = VitalsConfig::default();
        assert!(vitals.sick_health_threshold < vitals.starting_health);
        assert!(vitals.hungry_threshold < vitals.heal_hunger_threshold);

        let seeking = SeekingConfig::default();
        assert!(seeking.eat_distance < seeking.detection_radius);

        let evolution = EvolutionConfig::default();
        let levels: Vec<u32> = evolution.requirements.iter().map(|r| r.target_level).collect();
        assert_eq!(levels, vec![2, 3]);
    }

    #[test]
    fn partial_section_fills_defaults() {
        let yaml = "detection_radius: 120.0\n";
        let parsed: Result<SeekingConfig, _> = serde_yml::from_str(yaml);
        let seeking = parsed.unwrap_or_default();
        assert!((seeking.detection_radius - 120.0).abs() < f32::EPSILON);
        assert!((seeking.cooldown_secs - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn requirement_list_parses() {
        let yaml = "requirements:\n  - target_level: 2\n    min_time_alive: 10.0\n";
        let parsed: Result<EvolutionConfig, _> = serde_yml::from_str(yaml);
        assert!(parsed.is_ok());
        let evolution = parsed.unwrap_or_default();
        assert_eq!(evolution.requirements.len(), 1);
        assert_eq!(evolution.requirements.first().map(|r| r.min_interactions), Some(0));
        assert!((evolution.check_interval_secs - 5.0).abs() < f32::EPSILON);
    }
}

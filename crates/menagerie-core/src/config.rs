//! Configuration loading and typed config structures for the Menagerie
//! simulation.
//!
//! The canonical configuration lives in `menagerie-config.yaml` at the
//! project root. Every section is optional; missing sections and fields
//! take the defaults documented on each field.

use std::collections::BTreeMap;
use std::path::Path;

use menagerie_agents::{
    EvolutionConfig, LevelBehaviorConfig, MovementConfig, SeekingConfig, SeparationConfig,
    VitalsConfig,
};
use menagerie_types::{BehaviorState, Vec2};
use menagerie_world::BoundsConfig;
use serde::Deserialize;
use tracing::warn;

/// Environment variable that overrides `world.seed`.
pub const SEED_ENV_VAR: &str = "MENAGERIE_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `menagerie-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Seed, pacing, and area size.
    #[serde(default)]
    pub world: WorldConfig,

    /// Ground and flying bounds computation.
    #[serde(default)]
    pub bounds: BoundsConfig,

    /// Hunger, happiness, and health rates.
    #[serde(default)]
    pub vitals: VitalsConfig,

    /// Resource detection, reach, and cooldown.
    #[serde(default)]
    pub seeking: SeekingConfig,

    /// Neighbor repulsion.
    #[serde(default)]
    pub separation: SeparationConfig,

    /// Per-state movement speeds.
    #[serde(default)]
    pub movement: MovementConfig,

    /// Evolution cadence and requirements.
    #[serde(default)]
    pub evolution: EvolutionConfig,

    /// Transition rules and durations keyed by evolution level.
    #[serde(default)]
    pub behavior: BTreeMap<u32, LevelBehaviorConfig>,

    /// Presentation clip lengths in seconds, keyed by state.
    #[serde(default)]
    pub clips: BTreeMap<BehaviorState, f32>,

    /// Initial population and resource spawning.
    #[serde(default)]
    pub spawning: SpawningConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `MENAGERIE_SEED`, when set to a valid integer, overrides
    /// `world.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.world.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // Blank documents mean "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick in the engine binary.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Area width in pixels.
    #[serde(default = "default_area_width")]
    pub area_width: f32,

    /// Area height in pixels.
    #[serde(default = "default_area_height")]
    pub area_height: f32,

    /// Stop after this many ticks. Zero runs until interrupted.
    #[serde(default)]
    pub max_ticks: u64,
}

impl WorldConfig {
    /// Area size as a vector.
    pub const fn area(&self) -> Vec2 {
        Vec2::new(self.area_width, self.area_height)
    }

    /// Seconds of simulated time per tick.
    #[allow(clippy::cast_precision_loss)]
    pub fn tick_secs(&self) -> f32 {
        self.tick_interval_ms as f32 / 1000.0
    }

    /// Apply `MENAGERIE_SEED` if it is set and parses.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(SEED_ENV_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => self.seed = seed,
                Err(err) => warn!(value = %raw, error = %err, "Ignoring invalid {SEED_ENV_VAR}"),
            }
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            area_width: default_area_width(),
            area_height: default_area_height(),
            max_ticks: 0,
        }
    }
}

/// Initial population and periodic resource spawning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpawningConfig {
    /// Agents spawned at start (default: 6).
    pub initial_agents: u32,

    /// Agent body width (default: 64).
    pub agent_width: f32,

    /// Agent body height (default: 64).
    pub agent_height: f32,

    /// Seconds between resource spawns; zero disables (default: 4).
    pub resource_interval_secs: f32,

    /// No spawns while this many resources are active (default: 8).
    pub max_active_resources: usize,

    /// Objects available in the resource pool (default: 64).
    pub pool_capacity: usize,

    /// Chance that a spawned resource is medicine (default: 0.15).
    pub medicine_chance: f64,

    /// Nutrition of food (default: 25).
    pub food_nutrition: f32,

    /// Nutrition of medicine (default: 40).
    pub medicine_nutrition: f32,
}

impl SpawningConfig {
    /// Agent body size as a vector.
    pub const fn agent_extent(&self) -> Vec2 {
        Vec2::new(self.agent_width, self.agent_height)
    }
}

impl Default for SpawningConfig {
    fn default() -> Self {
        Self {
            initial_agents: 6,
            agent_width: 64.0,
            agent_height: 64.0,
            resource_interval_secs: 4.0,
            max_active_resources: 8,
            pool_capacity: 64,
            medicine_chance: 0.15,
            food_nutrition: 25.0,
            medicine_nutrition: 40.0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Menagerie".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    100
}

const fn default_area_width() -> f32 {
    1920.0
}

const fn default_area_height() -> f32 {
    1080.0
}

fn default_log_level() -> String {
    "info".to_owned()
}

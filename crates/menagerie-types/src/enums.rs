//! Enumeration types for the Menagerie simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Behavior states
// ---------------------------------------------------------------------------

/// The activity an agent is currently performing.
///
/// Each state is held for a duration chosen by the state machine (usually
/// the length of the matching presentation clip) before the next state is
/// selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorState {
    /// Standing still.
    Idle,
    /// Slow horizontal movement along the ground band.
    Walking,
    /// Fast horizontal movement along the ground band.
    Running,
    /// A short hop in place.
    Jumping,
    /// Movement anywhere inside the flying bounds.
    Flying,
    /// Resting in place.
    Sleeping,
    /// The special interaction animation played after being petted.
    Playing,
    /// Consuming a claimed resource. Entered and left only by the
    /// consumption sequence.
    Eating,
}

impl BehaviorState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Idle,
        Self::Walking,
        Self::Running,
        Self::Jumping,
        Self::Flying,
        Self::Sleeping,
        Self::Playing,
        Self::Eating,
    ];

    /// Whether the state moves the agent toward a target.
    ///
    /// Locomotion durations are rounded to whole presentation cycles.
    pub const fn is_locomotion(self) -> bool {
        matches!(self, Self::Walking | Self::Running | Self::Flying)
    }

    /// Whether an evolution re-check may run while in this state.
    pub const fn is_evolution_safe(self) -> bool {
        matches!(self, Self::Idle | Self::Walking)
    }

    /// Whether the state selects targets from the flying bounds.
    pub const fn uses_flying_bounds(self) -> bool {
        matches!(self, Self::Flying)
    }
}

impl core::fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Walking => "walking",
            Self::Running => "running",
            Self::Jumping => "jumping",
            Self::Flying => "flying",
            Self::Sleeping => "sleeping",
            Self::Playing => "playing",
            Self::Eating => "eating",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// The kind of a consumable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Restores hunger (satiety).
    Food,
    /// Restores health and cures sickness.
    Medicine,
}

/// Lifecycle of a pooled consumable resource.
///
/// `Pooled -> Active -> Claimed -> Consumed -> Pooled`. A claim may be
/// released (`Claimed -> Active`) and an active or claimed resource may be
/// despawned straight back to `Pooled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceLifecycle {
    /// Held by the pool provider, not in the world.
    Pooled,
    /// In the world and unowned.
    Active,
    /// In the world and owned by exactly one agent.
    Claimed,
    /// Eaten; removed from the active set and awaiting return to the pool.
    Consumed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locomotion_states() {
        let locomotion: Vec<_> = BehaviorState::ALL
            .into_iter()
            .filter(|s| s.is_locomotion())
            .collect();
        assert_eq!(
            locomotion,
            vec![BehaviorState::Walking, BehaviorState::Running, BehaviorState::Flying]
        );
    }

    #[test]
    fn only_idle_and_walking_are_evolution_safe() {
        for state in BehaviorState::ALL {
            let expected = matches!(state, BehaviorState::Idle | BehaviorState::Walking);
            assert_eq!(state.is_evolution_safe(), expected, "{state}");
        }
    }

    #[test]
    fn states_serialize_snake_case() {
        let json = serde_json::to_string(&BehaviorState::Flying).ok();
        assert_eq!(json.as_deref(), Some("\"flying\""));
        let kind: Result<ResourceKind, _> = serde_json::from_str("\"medicine\"");
        assert_eq!(kind.ok(), Some(ResourceKind::Medicine));
    }
}

//! Neighbor repulsion.
//!
//! Agents closer than the separation radius push each other apart. The
//! offset is added to the movement target before integration, so it
//! steers rather than teleports.

use menagerie_types::{AgentKey, Vec2};

use crate::config::SeparationConfig;

/// Separation offset for the agent `me` at `position`.
///
/// Each neighbor within `radius` (other than `me`) contributes a unit vector
/// pointing away from it, scaled by `(radius - d) / radius * force`. The
/// contributions are averaged. Coincident neighbors push along the x axis,
/// the lower key to the left.
#[allow(clippy::cast_precision_loss)]
pub fn compute_separation(
    me: AgentKey,
    position: Vec2,
    neighbors: &[(AgentKey, Vec2)],
    radius: f32,
    force: f32,
) -> Vec2 {
    if !(radius.is_finite() && radius > 0.0) {
        return Vec2::ZERO;
    }
    let mut sum = Vec2::ZERO;
    let mut count = 0_u32;
    for &(key, other) in neighbors {
        if key == me {
            continue;
        }
        let away = position - other;
        let distance = away.length();
        if !distance.is_finite() || distance >= radius {
            continue;
        }
        let direction = away.normalized().unwrap_or(if me < key {
            Vec2::new(-1.0, 0.0)
        } else {
            Vec2::new(1.0, 0.0)
        });
        sum += direction * ((radius - distance) / radius * force);
        count = count.saturating_add(1);
    }
    if count == 0 {
        Vec2::ZERO
    } else {
        sum * (1.0 / count as f32)
    }
}

/// Applies [`SeparationConfig`] to [`compute_separation`].
#[derive(Debug, Clone, Default)]
pub struct SeparationController {
    config: SeparationConfig,
}

impl SeparationController {
    /// Create a controller.
    pub const fn new(config: SeparationConfig) -> Self {
        Self { config }
    }

    /// Separation offset for `me`, or zero when disabled.
    pub fn offset(&self, me: AgentKey, position: Vec2, neighbors: &[(AgentKey, Vec2)]) -> Vec2 {
        if !self.config.enabled {
            return Vec2::ZERO;
        }
        compute_separation(me, position, neighbors, self.config.radius, self.config.force)
    }
}

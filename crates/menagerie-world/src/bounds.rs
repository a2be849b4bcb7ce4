//! Movement-target bounds for agents inside the simulation area.
//!
//! Two rectangles are derived from the current area size and an agent's
//! extent:
//!
//! - **Ground bounds** -- the lower `ground_ratio` of the area height, with
//!   `padding` removed from the top and bottom of the band.
//! - **Flying bounds** -- the full area height, inset by half the agent
//!   height plus `padding`.
//!
//! Both span the full width minus half the agent width and `edge_padding`.
//!
//! # Degenerate geometry
//!
//! Tiny, zero, negative, or non-finite areas must still yield a usable,
//! non-inverted rectangle. The fallback chain runs in order:
//!
//! 1. Vertical invalid: a [`MIN_WINDOW_HEIGHT`] window around the vertical
//!    center, reclamped to the area; if still invalid, a
//!    [`TINY_WINDOW`] symmetric window.
//! 2. Horizontal still invalid: keep full-width movement with a
//!    [`NEAR_ZERO_HEIGHT`] vertical window when the area is wider than
//!    [`MIN_HORIZONTAL_WIDTH`]; otherwise a small square scaled to the
//!    smaller area dimension.

use menagerie_types::{AreaBounds, BehaviorState, Rect, Vec2};
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

/// Height of the recentered window used when the vertical band collapses.
pub const MIN_WINDOW_HEIGHT: f32 = 2.0;

/// Half-size of the last-resort symmetric window.
pub const TINY_WINDOW: f32 = 0.5;

/// Half-height of the vertical window used to keep horizontal movement.
pub const NEAR_ZERO_HEIGHT: f32 = 0.01;

/// Minimum area width for which horizontal movement is preserved.
pub const MIN_HORIZONTAL_WIDTH: f32 = 4.0;

/// Fraction of the smaller area dimension used for the fallback square.
const FALLBACK_SQUARE_SCALE: f32 = 0.25;

/// Maximum horizontal jitter for targets in a too-small area.
pub const SMALL_AREA_JITTER: f32 = 2.0;

/// Tunables for bounds computation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    /// Fraction of the area height occupied by the ground band (default: 0.4).
    pub ground_ratio: f32,

    /// Vertical padding removed from each edge of a band (default: 10).
    pub padding: f32,

    /// Horizontal padding added to half the agent width (default: 2).
    pub edge_padding: f32,

    /// Areas narrower or shorter than this are "too small" (default: 50).
    pub min_movement_area: f32,

    /// Height above the ground band's upper edge at which an agent counts
    /// as airborne (default: 0).
    pub airborne_threshold: f32,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            ground_ratio: 0.4,
            padding: 10.0,
            edge_padding: 2.0,
            min_movement_area: 50.0,
            airborne_threshold: 0.0,
        }
    }
}

/// Replace negative or non-finite components with zero.
fn sanitize(size: Vec2) -> Vec2 {
    let fix = |v: f32| if v.is_finite() && v > 0.0 { v } else { 0.0 };
    Vec2::new(fix(size.x), fix(size.y))
}

/// Horizontal span shared by both regions, before any fallback.
fn raw_horizontal(area: Vec2, extent: Vec2, config: &BoundsConfig) -> (f32, f32) {
    let inset = extent.x * 0.5 + config.edge_padding;
    let half_w = area.x * 0.5;
    (-half_w + inset, half_w - inset)
}

/// Ground band before the fallback chain is applied. May be inverted.
fn raw_ground(area: Vec2, extent: Vec2, config: &BoundsConfig) -> Rect {
    let (min_x, max_x) = raw_horizontal(area, extent, config);
    let bottom = -area.y * 0.5;
    let ratio = config.ground_ratio.clamp(0.0, 1.0);
    Rect::new(
        Vec2::new(min_x, bottom + config.padding),
        Vec2::new(max_x, bottom + area.y * ratio - config.padding),
    )
}

/// Flying region before the fallback chain is applied. May be inverted.
fn raw_flying(area: Vec2, extent: Vec2, config: &BoundsConfig) -> Rect {
    let (min_x, max_x) = raw_horizontal(area, extent, config);
    let inset = extent.y * 0.5 + config.padding;
    let half_h = area.y * 0.5;
    Rect::new(Vec2::new(min_x, -half_h + inset), Vec2::new(max_x, half_h - inset))
}

/// Whether `hi` is strictly above `lo`. False for NaN corners.
fn spans(lo: f32, hi: f32) -> bool {
    hi > lo
}

/// Apply the degenerate-geometry fallback chain to `rect`.
fn repair(mut rect: Rect, area: Vec2) -> Rect {
    let center = Vec2::ZERO;
    let half_w = area.x * 0.5;
    let half_h = area.y * 0.5;

    if !spans(rect.min.y, rect.max.y) {
        rect.min.y = (center.y - MIN_WINDOW_HEIGHT * 0.5).max(-half_h);
        rect.max.y = (center.y + MIN_WINDOW_HEIGHT * 0.5).min(half_h);
        if !spans(rect.min.y, rect.max.y) {
            rect.min.y = center.y - TINY_WINDOW;
            rect.max.y = center.y + TINY_WINDOW;
        }
    }

    if !spans(rect.min.x, rect.max.x) {
        if area.x > MIN_HORIZONTAL_WIDTH {
            rect = Rect::new(
                Vec2::new(-half_w, center.y - NEAR_ZERO_HEIGHT),
                Vec2::new(half_w, center.y + NEAR_ZERO_HEIGHT),
            );
        } else {
            let half = (area.x.min(area.y) * FALLBACK_SQUARE_SCALE).max(TINY_WINDOW);
            rect = Rect::centered(center, half, half);
        }
    }

    rect
}

/// Compute the ground movement bounds for `extent` inside `area`.
///
/// Always returns a rectangle with `min <= max` on both axes.
pub fn compute_ground_bounds(area: Vec2, extent: Vec2, config: &BoundsConfig) -> Rect {
    let area = sanitize(area);
    let extent = sanitize(extent);
    repair(raw_ground(area, extent, config), area)
}

/// Compute the flying movement bounds for `extent` inside `area`.
///
/// Always returns a rectangle with `min <= max` on both axes.
pub fn compute_flying_bounds(area: Vec2, extent: Vec2, config: &BoundsConfig) -> Rect {
    let area = sanitize(area);
    let extent = sanitize(extent);
    repair(raw_flying(area, extent, config), area)
}

/// Whether the area is too small for normal target selection.
///
/// True when either dimension is smaller than the agent plus padding, when
/// the unrepaired ground band has no positive width or height, or when
/// either dimension is below `min_movement_area`.
pub fn is_movement_area_too_small(area: Vec2, extent: Vec2, config: &BoundsConfig) -> bool {
    let area = sanitize(area);
    let extent = sanitize(extent);
    if area.x < extent.x + config.padding || area.y < extent.y + config.padding {
        return true;
    }
    let ground = raw_ground(area, extent, config);
    if !spans(0.0, ground.width()) || !spans(0.0, ground.height()) {
        return true;
    }
    area.x < config.min_movement_area || area.y < config.min_movement_area
}

/// Bounds computation for the current simulation area.
///
/// Holds the area size and recomputes rectangles on every query, so a
/// resize takes effect immediately for all agents.
#[derive(Debug, Clone)]
pub struct SpatialBounds {
    config: BoundsConfig,
    area: Vec2,
}

impl SpatialBounds {
    /// Create bounds for an area of `area` size.
    pub fn new(config: BoundsConfig, area: Vec2) -> Self {
        Self {
            config,
            area: sanitize(area),
        }
    }

    /// Return the bounds configuration.
    pub const fn config(&self) -> &BoundsConfig {
        &self.config
    }

    /// Return the current (sanitized) area size.
    pub const fn area(&self) -> Vec2 {
        self.area
    }

    /// Resize the area. Negative or non-finite sizes are treated as zero.
    pub fn set_area(&mut self, area: Vec2) {
        self.area = sanitize(area);
        debug!(width = self.area.x, height = self.area.y, "Area resized");
    }

    /// Ground bounds for an agent of `extent`.
    pub fn ground(&self, extent: Vec2) -> Rect {
        compute_ground_bounds(self.area, extent, &self.config)
    }

    /// Flying bounds for an agent of `extent`.
    pub fn flying(&self, extent: Vec2) -> Rect {
        compute_flying_bounds(self.area, extent, &self.config)
    }

    /// Both regions for an agent of `extent`.
    pub fn bounds(&self, extent: Vec2) -> AreaBounds {
        AreaBounds {
            ground: self.ground(extent),
            flying: self.flying(extent),
        }
    }

    /// Whether the current area is too small for an agent of `extent`.
    pub fn is_too_small(&self, extent: Vec2) -> bool {
        is_movement_area_too_small(self.area, extent, &self.config)
    }

    /// Whether `position` is above the ground band (plus the configured
    /// airborne threshold).
    pub fn is_airborne(&self, position: Vec2, extent: Vec2) -> bool {
        position.y > self.ground(extent).max.y + self.config.airborne_threshold
    }

    /// Clamp `position` into the widest region available to the agent.
    pub fn clamp_to_area(&self, position: Vec2, extent: Vec2) -> Vec2 {
        self.flying(extent).clamp_point(position)
    }

    /// Pick a random movement target for an agent entering `state`.
    ///
    /// X is uniform within the applicable bounds (flying bounds for
    /// [`BehaviorState::Flying`], ground bounds otherwise); Y is the bounds'
    /// vertical center. In a too-small area the target is the ground center
    /// jittered by at most [`SMALL_AREA_JITTER`].
    pub fn random_target(&self, state: BehaviorState, extent: Vec2, rng: &mut impl Rng) -> Vec2 {
        if self.is_too_small(extent) {
            let ground = self.ground(extent);
            let center = ground.center();
            let jitter = SMALL_AREA_JITTER.min(ground.width() * 0.5).max(0.0);
            let x = center.x + rng.random_range(-jitter..=jitter);
            return ground.clamp_point(Vec2::new(x, center.y));
        }

        let rect = if state.uses_flying_bounds() {
            self.flying(extent)
        } else {
            self.ground(extent)
        };
        let x = rng.random_range(rect.min.x..=rect.max.x);
        Vec2::new(x, rect.center().y)
    }
}

//! Spatial bounds, resource registry, and resource pooling for the
//! Menagerie simulation.
//!
//! This crate models the shared world the agents live in: the movement
//! regions derived from the area size, and the set of consumable resources
//! agents compete for.
//!
//! # Modules
//!
//! - [`bounds`] -- Ground/flying movement bounds with a degenerate-geometry
//!   fallback chain, too-small detection, and random target selection.
//! - [`error`] -- Error types for registry and pool operations.
//! - [`pool`] -- The pooled-object provider trait and a bounded in-memory
//!   implementation.
//! - [`registry`] -- Active resources and optimistic single-owner claims.

pub mod bounds;
pub mod error;
pub mod pool;
pub mod registry;

// Re-export primary types at crate root.
pub use bounds::{
    BoundsConfig, SpatialBounds, compute_flying_bounds, compute_ground_bounds,
    is_movement_area_too_small,
};
pub use error::WorldError;
pub use pool::{DEFAULT_POOL_CAPACITY, InMemoryPool, ResourcePool};
pub use registry::{ClaimOutcome, ConsumableResource, ResourceRegistry};

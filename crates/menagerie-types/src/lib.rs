//! Shared type definitions for the Menagerie pet simulation.
//!
//! This crate is the single source of truth for the identifiers, enums, and
//! geometry shared across the Menagerie workspace. It holds data only; all
//! behavior lives in `menagerie-world`, `menagerie-agents`, and
//! `menagerie-core`.
//!
//! # Modules
//!
//! - [`ids`] -- Agent identity (string ids that change on evolution),
//!   stable agent keys, and pooled resource handles
//! - [`enums`] -- Behavior states, resource kinds, and resource lifecycle
//! - [`geometry`] -- 2D vectors, rectangles, and the ground/flying area bounds

pub mod enums;
pub mod geometry;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{BehaviorState, ResourceKind, ResourceLifecycle};
pub use geometry::{AreaBounds, Rect, Vec2};
pub use ids::{AgentId, AgentKey, ResourceId};

//! Pooled-object provider for consumable resources.
//!
//! The core never allocates resources itself: it asks a [`ResourcePool`]
//! for a handle on spawn and hands the handle back on consumption or
//! despawn. [`InMemoryPool`] is a bounded provider used by the engine and
//! tests; a presentation layer can supply its own implementation backed by
//! real pooled scene objects.

use std::collections::BTreeMap;

use menagerie_types::{ResourceId, ResourceKind, Vec2};
use tracing::debug;

use crate::error::WorldError;

/// Default number of objects held by an [`InMemoryPool`].
pub const DEFAULT_POOL_CAPACITY: usize = 64;

/// A provider of pooled resource objects.
pub trait ResourcePool {
    /// Take an object out of the pool and place it at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PoolExhausted`] when no object is free.
    fn spawn(&mut self, kind: ResourceKind, position: Vec2) -> Result<ResourceId, WorldError>;

    /// Return an object to the pool.
    ///
    /// Returns `false` if the handle was not live (already returned or
    /// never issued).
    fn despawn(&mut self, id: ResourceId) -> bool;
}

/// A bounded in-memory pool.
///
/// Handles are issued from a monotonically increasing counter and never
/// reused; only the *capacity* is recycled.
#[derive(Debug, Clone)]
pub struct InMemoryPool {
    capacity: usize,
    live: BTreeMap<ResourceId, ResourceKind>,
    next_id: u64,
}

impl InMemoryPool {
    /// Create a pool holding `capacity` objects.
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            live: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Number of objects currently out in the world.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of objects still sitting in the pool.
    pub fn pooled_count(&self) -> usize {
        self.capacity.saturating_sub(self.live.len())
    }

    /// Whether `id` is currently out in the world.
    pub fn is_live(&self, id: ResourceId) -> bool {
        self.live.contains_key(&id)
    }
}

impl Default for InMemoryPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl ResourcePool for InMemoryPool {
    fn spawn(&mut self, kind: ResourceKind, position: Vec2) -> Result<ResourceId, WorldError> {
        if self.live.len() >= self.capacity {
            return Err(WorldError::PoolExhausted {
                capacity: self.capacity,
            });
        }
        let id = ResourceId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.live.insert(id, kind);
        debug!(%id, ?kind, x = position.x, y = position.y, "Pool object spawned");
        Ok(id)
    }

    fn despawn(&mut self, id: ResourceId) -> bool {
        self.live.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_until_exhausted() {
        let mut pool = InMemoryPool::new(2);
        assert!(pool.spawn(ResourceKind::Food, Vec2::ZERO).is_ok());
        assert!(pool.spawn(ResourceKind::Medicine, Vec2::ZERO).is_ok());
        assert_eq!(
            pool.spawn(ResourceKind::Food, Vec2::ZERO),
            Err(WorldError::PoolExhausted { capacity: 2 })
        );
        assert_eq!(pool.pooled_count(), 0);
    }

    #[test]
    fn despawn_frees_capacity_but_not_ids() {
        let mut pool = InMemoryPool::new(1);
        let first = pool.spawn(ResourceKind::Food, Vec2::ZERO).unwrap_or(ResourceId(0));
        assert!(pool.despawn(first));
        assert!(!pool.despawn(first));
        let second = pool.spawn(ResourceKind::Food, Vec2::ZERO).unwrap_or(ResourceId(0));
        assert_ne!(first, second);
        assert!(pool.is_live(second));
        assert_eq!(pool.live_count(), 1);
    }
}

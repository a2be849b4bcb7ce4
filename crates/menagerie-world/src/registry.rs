//! Active consumable resources and their single-owner claims.
//!
//! The registry is the only state shared between agents. Every claim,
//! release, and removal goes through it, and all of them resolve
//! immediately within the calling tick.
//!
//! # Claim protocol
//!
//! [`ResourceRegistry::try_claim`] is optimistic: it first *attempts* to
//! take ownership of an unowned resource and then *verifies* that the
//! owner is the caller. With the cooperative scheduler the verify step
//! always agrees with the attempt, but the protocol stays correct if claim
//! attempts are ever made from a parallel scheduler that interleaves
//! attempts before verification.
//!
//! Owners are recorded by [`AgentKey`], never by a reference to the agent,
//! so a resource's lifetime is independent of its claimant's.

use std::collections::BTreeMap;

use menagerie_types::{AgentKey, ResourceId, ResourceKind, ResourceLifecycle, Vec2};
use tracing::debug;

use crate::error::WorldError;
use crate::pool::ResourcePool;

/// A consumable resource in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumableResource {
    /// Handle issued by the pool provider.
    pub id: ResourceId,
    /// World position.
    pub position: Vec2,
    /// Food or medicine.
    pub kind: ResourceKind,
    /// Amount restored when consumed.
    pub nutrition: f32,
    owner: Option<AgentKey>,
    lifecycle: ResourceLifecycle,
}

impl ConsumableResource {
    /// The agent currently holding a claim, if any.
    pub const fn owner(&self) -> Option<AgentKey> {
        self.owner
    }

    /// Current lifecycle stage.
    pub const fn lifecycle(&self) -> ResourceLifecycle {
        self.lifecycle
    }
}

/// Result of a claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller now owns the resource (or already did).
    Claimed,
    /// Another agent owns the resource. Nothing was changed.
    AlreadyOwned(AgentKey),
    /// The resource is not in the active set.
    NotFound,
}

/// Tracks active resources and their claims.
///
/// Iteration order is ascending [`ResourceId`], which makes candidate
/// ordering deterministic when distances tie.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    active: BTreeMap<ResourceId, ConsumableResource>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            active: BTreeMap::new(),
        }
    }

    /// Spawn a resource from `pool` and add it to the active set.
    ///
    /// # Errors
    ///
    /// Propagates the pool's error (typically
    /// [`WorldError::PoolExhausted`]).
    pub fn spawn(
        &mut self,
        pool: &mut dyn ResourcePool,
        kind: ResourceKind,
        position: Vec2,
        nutrition: f32,
    ) -> Result<ResourceId, WorldError> {
        let id = pool.spawn(kind, position)?;
        self.active.insert(
            id,
            ConsumableResource {
                id,
                position,
                kind,
                nutrition,
                owner: None,
                lifecycle: ResourceLifecycle::Active,
            },
        );
        Ok(id)
    }

    /// Attempt to claim `id` for `agent`.
    ///
    /// Succeeds iff the resource is unowned or already owned by `agent`.
    /// A resource owned by someone else is left untouched.
    pub fn try_claim(&mut self, id: ResourceId, agent: AgentKey) -> ClaimOutcome {
        let Some(resource) = self.active.get_mut(&id) else {
            return ClaimOutcome::NotFound;
        };

        // Attempt.
        if resource.owner.is_none() {
            resource.owner = Some(agent);
            resource.lifecycle = ResourceLifecycle::Claimed;
        }

        // Verify.
        match resource.owner {
            Some(owner) if owner == agent => {
                debug!(%id, %agent, "Resource claimed");
                ClaimOutcome::Claimed
            }
            Some(owner) => ClaimOutcome::AlreadyOwned(owner),
            None => ClaimOutcome::NotFound,
        }
    }

    /// Release `agent`'s claim on `id`.
    ///
    /// Returns `false` if the resource is gone or owned by someone else.
    pub fn release(&mut self, id: ResourceId, agent: AgentKey) -> bool {
        match self.active.get_mut(&id) {
            Some(resource) if resource.owner == Some(agent) => {
                resource.owner = None;
                resource.lifecycle = ResourceLifecycle::Active;
                debug!(%id, %agent, "Resource claim released");
                true
            }
            _ => false,
        }
    }

    /// Release every claim held by `agent`. Returns how many were released.
    pub fn release_all(&mut self, agent: AgentKey) -> usize {
        let mut released: usize = 0;
        for resource in self.active.values_mut() {
            if resource.owner == Some(agent) {
                resource.owner = None;
                resource.lifecycle = ResourceLifecycle::Active;
                released = released.saturating_add(1);
            }
        }
        released
    }

    /// Active resources of a kind in `kinds` within `radius` of `position`,
    /// in strictly ascending distance order (ties by ascending id).
    pub fn candidates_within(
        &self,
        position: Vec2,
        radius: f32,
        kinds: &[ResourceKind],
    ) -> Vec<(ResourceId, f32)> {
        let mut found: Vec<(ResourceId, f32)> = self
            .active
            .values()
            .filter(|r| kinds.contains(&r.kind))
            .map(|r| (r.id, r.position.distance(position)))
            .filter(|&(_, dist)| dist <= radius)
            .collect();
        // Stable sort keeps id order for equal distances.
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found
    }

    /// Consume `id` on behalf of its owner `agent`.
    ///
    /// Removes the resource from the active set, returns its object to the
    /// pool, and hands back the consumed record. A resource can be consumed
    /// at most once: a second call reports [`WorldError::ResourceNotFound`].
    ///
    /// # Errors
    ///
    /// - [`WorldError::ResourceNotFound`] if the resource is not active.
    /// - [`WorldError::NotOwner`] if `agent` does not hold the claim.
    pub fn consume(
        &mut self,
        pool: &mut dyn ResourcePool,
        id: ResourceId,
        agent: AgentKey,
    ) -> Result<ConsumableResource, WorldError> {
        let owner = self
            .active
            .get(&id)
            .ok_or(WorldError::ResourceNotFound(id))?
            .owner;
        if owner != Some(agent) {
            return Err(WorldError::NotOwner { resource: id, agent });
        }

        let mut resource = self
            .active
            .remove(&id)
            .ok_or(WorldError::ResourceNotFound(id))?;
        resource.lifecycle = ResourceLifecycle::Consumed;
        pool.despawn(id);
        debug!(%id, %agent, kind = ?resource.kind, "Resource consumed");
        Ok(resource)
    }

    /// Remove `id` from the world without consuming it and return its
    /// object to the pool.
    ///
    /// The returned record still names the previous owner so the caller
    /// can clear that agent's claim. Returns `None` if not active.
    pub fn despawn(
        &mut self,
        pool: &mut dyn ResourcePool,
        id: ResourceId,
    ) -> Option<ConsumableResource> {
        let mut resource = self.active.remove(&id)?;
        resource.lifecycle = ResourceLifecycle::Pooled;
        pool.despawn(id);
        debug!(%id, owner = ?resource.owner, "Resource despawned");
        Some(resource)
    }

    /// Look up an active resource.
    pub fn get(&self, id: ResourceId) -> Option<&ConsumableResource> {
        self.active.get(&id)
    }

    /// Owner of an active resource.
    pub fn owner_of(&self, id: ResourceId) -> Option<AgentKey> {
        self.active.get(&id).and_then(ConsumableResource::owner)
    }

    /// Resources currently claimed by `agent`.
    pub fn claimed_by(&self, agent: AgentKey) -> Vec<ResourceId> {
        self.active
            .values()
            .filter(|r| r.owner == Some(agent))
            .map(|r| r.id)
            .collect()
    }

    /// Iterate active resources in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ConsumableResource> {
        self.active.values()
    }

    /// Number of active resources.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no resources are active.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

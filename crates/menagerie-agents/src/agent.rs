//! Agent records and the agent manager.
//!
//! The [`AgentManager`] owns every live [`Agent`], issues stable
//! [`AgentKey`]s, and keeps the index from public [`AgentId`] to key. Agent
//! ids change on evolution; [`AgentManager::rename`] moves the index entry
//! so the old id stops resolving and the new one never duplicates.

use std::collections::BTreeMap;
use std::sync::Arc;

use menagerie_types::{AgentId, AgentKey, BehaviorState, Vec2};
use rand::Rng;
use tracing::info;

use crate::behavior::BehaviorTable;
use crate::error::AgentError;
use crate::evolution::EvolutionState;
use crate::seeking::SeekState;
use crate::state_machine::AgentStateMachine;
use crate::vitals::Vitals;

/// A single simulated pet.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Stable handle, unchanged by evolution.
    pub key: AgentKey,
    /// Public id. Replaced on every evolution.
    pub id: AgentId,
    /// Current position.
    pub position: Vec2,
    /// Width and height of the agent's body.
    pub extent: Vec2,
    /// Evolution level, starting at 1.
    pub level: u32,
    /// Hunger, happiness, and health.
    pub vitals: Vitals,
    /// Behavior state machine.
    pub machine: AgentStateMachine,
    /// Claim, consumption, and cooldown state.
    pub seek: SeekState,
    /// Evolution progress and lock.
    pub evolution: EvolutionState,
    /// Where the agent is currently heading, if anywhere.
    pub move_target: Option<Vec2>,
}

impl Agent {
    /// Current behavior state.
    pub const fn state(&self) -> BehaviorState {
        self.machine.state()
    }

    /// Whether an evolution is being carried out.
    pub const fn is_evolving(&self) -> bool {
        self.evolution.evolving
    }
}

/// Parameters for spawning an agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnParams {
    /// Initial position.
    pub position: Vec2,
    /// Body size.
    pub extent: Vec2,
    /// Starting level (at least 1).
    pub level: u32,
    /// Starting vitals.
    pub vitals: Vitals,
}

/// Owns and indexes the live agents.
///
/// Agents iterate in spawn order (ascending key).
#[derive(Debug)]
pub struct AgentManager {
    agents: BTreeMap<AgentKey, Agent>,
    by_id: BTreeMap<AgentId, AgentKey>,
    table: Arc<BehaviorTable>,
    next_key: u64,
}

impl AgentManager {
    /// Create an empty manager whose agents share `table`.
    pub const fn new(table: Arc<BehaviorTable>) -> Self {
        Self {
            agents: BTreeMap::new(),
            by_id: BTreeMap::new(),
            table,
            next_key: 1,
        }
    }

    /// Spawn an agent with a fresh id drawn from `rng`.
    pub fn spawn(&mut self, params: SpawnParams, rng: &mut impl Rng) -> AgentKey {
        let level = params.level.max(1);
        let mut id = AgentId::generate(rng, level);
        while self.by_id.contains_key(&id) {
            id = AgentId::generate(rng, level);
        }

        let key = AgentKey(self.next_key);
        self.next_key = self.next_key.saturating_add(1);

        let agent = Agent {
            key,
            id: id.clone(),
            position: params.position,
            extent: params.extent,
            level,
            vitals: params.vitals,
            machine: AgentStateMachine::new(Arc::clone(&self.table), level),
            seek: SeekState::default(),
            evolution: EvolutionState::default(),
            move_target: None,
        };
        info!(%key, %id, level, "Agent spawned");
        self.by_id.insert(id, key);
        self.agents.insert(key, agent);
        key
    }

    /// Remove an agent, dropping its id from the index.
    pub fn remove(&mut self, key: AgentKey) -> Option<Agent> {
        let agent = self.agents.remove(&key)?;
        self.by_id.remove(&agent.id);
        info!(%key, id = %agent.id, "Agent removed");
        Some(agent)
    }

    /// Replace the public id of `key`, returning the old id.
    ///
    /// # Errors
    ///
    /// - [`AgentError::AgentNotFound`] if `key` is not alive.
    /// - [`AgentError::DuplicateId`] if `new_id` belongs to another agent.
    pub fn rename(&mut self, key: AgentKey, new_id: AgentId) -> Result<AgentId, AgentError> {
        if let Some(&holder) = self.by_id.get(&new_id)
            && holder != key
        {
            return Err(AgentError::DuplicateId { id: new_id });
        }
        let agent = self.agents.get_mut(&key).ok_or(AgentError::AgentNotFound(key))?;
        let old = std::mem::replace(&mut agent.id, new_id.clone());
        self.by_id.remove(&old);
        self.by_id.insert(new_id, key);
        Ok(old)
    }

    /// Look up an agent by key.
    pub fn get(&self, key: AgentKey) -> Option<&Agent> {
        self.agents.get(&key)
    }

    /// Look up an agent by key, mutably.
    pub fn get_mut(&mut self, key: AgentKey) -> Option<&mut Agent> {
        self.agents.get_mut(&key)
    }

    /// Resolve a public id to a key.
    pub fn key_of(&self, id: &AgentId) -> Option<AgentKey> {
        self.by_id.get(id).copied()
    }

    /// Look up an agent by public id.
    pub fn by_id(&self, id: &AgentId) -> Option<&Agent> {
        self.key_of(id).and_then(|key| self.agents.get(&key))
    }

    /// Keys of all agents in spawn order.
    pub fn keys(&self) -> Vec<AgentKey> {
        self.agents.keys().copied().collect()
    }

    /// Key and position of every agent, for neighbor queries.
    pub fn positions(&self) -> Vec<(AgentKey, Vec2)> {
        self.agents.values().map(|a| (a.key, a.position)).collect()
    }

    /// Iterate agents in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Number of live agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agents are alive.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Number of entries in the id index. Always equal to [`len`](Self::len).
    pub fn indexed_ids(&self) -> usize {
        self.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn params() -> SpawnParams {
        SpawnParams {
            position: Vec2::ZERO,
            extent: Vec2::new(64.0, 64.0),
            level: 1,
            vitals: Vitals::new(80.0, 70.0, 100.0),
        }
    }

    fn manager() -> AgentManager {
        AgentManager::new(Arc::new(BehaviorTable::default()))
    }

    #[test]
    fn spawn_issues_sequential_keys_and_indexed_ids() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut agents = manager();
        let a = agents.spawn(params(), &mut rng);
        let b = agents.spawn(params(), &mut rng);
        assert_eq!((a, b), (AgentKey(1), AgentKey(2)));
        assert_eq!(agents.keys(), vec![a, b]);

        let id = agents.get(a).map(|x| x.id.clone());
        assert!(id.as_ref().is_some_and(|id| id.level() == Some(1)));
        assert_eq!(id.and_then(|id| agents.key_of(&id)), Some(a));
    }

    #[test]
    fn seeded_ids_are_reproducible() {
        let mut first = manager();
        let mut second = manager();
        let a = first.spawn(params(), &mut SmallRng::seed_from_u64(7));
        let b = second.spawn(params(), &mut SmallRng::seed_from_u64(7));
        assert_eq!(
            first.get(a).map(|x| x.id.clone()),
            second.get(b).map(|x| x.id.clone())
        );
    }

    #[test]
    fn rename_retires_old_id() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut agents = manager();
        let key = agents.spawn(params(), &mut rng);
        let old = agents.get(key).map(|a| a.id.clone()).unwrap_or_else(|| AgentId::nil(1));
        let new = old.for_level(2);

        let returned = agents.rename(key, new.clone());
        assert_eq!(returned.ok(), Some(old.clone()));
        assert_eq!(agents.key_of(&old), None);
        assert_eq!(agents.key_of(&new), Some(key));
        assert_eq!(agents.indexed_ids(), agents.len());
    }

    #[test]
    fn rename_rejects_foreign_id() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut agents = manager();
        let a = agents.spawn(params(), &mut rng);
        let b = agents.spawn(params(), &mut rng);
        let b_id = agents.get(b).map(|x| x.id.clone()).unwrap_or_else(|| AgentId::nil(1));
        assert!(matches!(
            agents.rename(a, b_id),
            Err(AgentError::DuplicateId { .. })
        ));
        assert!(matches!(
            agents.rename(AgentKey(99), AgentId::nil(5)),
            Err(AgentError::AgentNotFound(_))
        ));
    }

    #[test]
    fn remove_drops_index_entry() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut agents = manager();
        let key = agents.spawn(params(), &mut rng);
        let removed = agents.remove(key);
        assert!(removed.is_some());
        assert!(agents.is_empty());
        assert_eq!(agents.indexed_ids(), 0);
        assert!(agents.remove(key).is_none());
    }
}

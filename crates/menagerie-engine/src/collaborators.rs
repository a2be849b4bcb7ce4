//! Engine-side implementations of the simulation's collaborator traits.
//!
//! [`TracingSink`] turns notifications into log lines. [`SaveIndex`] is an
//! in-memory stand-in for save data keyed by agent id; it follows agents
//! through evolution by moving their entries to the new id.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use menagerie_core::{NotificationSink, PersistenceHook};
use menagerie_types::{AgentId, BehaviorState, ResourceKind};
use tracing::{debug, info, warn};

/// Notification sink that logs every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn on_consumed(&mut self, kind: ResourceKind) {
        info!(?kind, "Resource consumed");
    }

    fn on_evolution_triggered(&mut self, level: u32) {
        info!(level, "Evolution triggered");
    }

    fn on_state_changed(&mut self, state: BehaviorState) {
        debug!(%state, "State changed");
    }
}

/// Saved data for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveEntry {
    /// Level recorded at the last save.
    pub level: u32,
    /// Evolutions seen since the entry was created.
    pub evolutions: u32,
}

/// Shared, id-keyed save records.
///
/// Clones share the same map, so the engine can keep a handle after
/// boxing one clone into the simulation's collaborators.
#[derive(Debug, Clone, Default)]
pub struct SaveIndex {
    entries: Arc<Mutex<BTreeMap<AgentId, SaveEntry>>>,
}

impl SaveIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entry for `id` at its current level.
    pub fn register(&self, id: &AgentId) {
        let entry = SaveEntry {
            level: id.level().unwrap_or(1),
            evolutions: 0,
        };
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(id.clone(), entry);
            }
            Err(_) => warn!(%id, "Save index lock poisoned; entry not registered"),
        }
    }

    /// The entry stored under `id`, if any.
    pub fn get(&self, id: &AgentId) -> Option<SaveEntry> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(id).copied())
    }

    /// Number of stored entries.
    pub fn entry_count(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }
}

impl PersistenceHook for SaveIndex {
    fn on_evolved(&mut self, old: &AgentId, new: &AgentId) {
        let Ok(mut entries) = self.entries.lock() else {
            warn!(%old, %new, "Save index lock poisoned; rename dropped");
            return;
        };
        let mut entry = entries.remove(old).unwrap_or_else(|| {
            warn!(%old, "No save entry for evolving agent; starting a new one");
            SaveEntry::default()
        });
        entry.level = new.level().unwrap_or(entry.level);
        entry.evolutions = entry.evolutions.saturating_add(1);
        entries.insert(new.clone(), entry);
        debug!(%old, %new, level = entry.level, "Save entry moved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evolution_moves_the_entry() {
        let index = SaveIndex::new();
        let old = AgentId::from_parts("abc", 1);
        let new = old.for_level(2);
        index.register(&old);

        let mut hook = index.clone();
        hook.on_evolved(&old, &new);

        assert_eq!(index.entry_count(), 1);
        assert_eq!(index.get(&old), None);
        assert_eq!(
            index.get(&new),
            Some(SaveEntry {
                level: 2,
                evolutions: 1
            })
        );
    }

    #[test]
    fn unknown_old_id_starts_fresh() {
        let mut index = SaveIndex::new();
        let old = AgentId::from_parts("xyz", 2);
        let new = old.for_level(3);
        index.on_evolved(&old, &new);
        assert_eq!(index.get(&new).map(|e| e.level), Some(3));
        assert_eq!(index.entry_count(), 1);
    }

    #[test]
    fn tracing_sink_accepts_events() {
        let mut sink = TracingSink;
        sink.on_consumed(ResourceKind::Food);
        sink.on_evolution_triggered(2);
        sink.on_state_changed(BehaviorState::Idle);
    }
}

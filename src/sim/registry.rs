//! Entity registry with deferred removal
//!
//! Entities are stored in registration order. Removal is always deferred:
//! callers mark ids during the tick and the owner flushes a snapshot of the
//! pending set afterwards, so nothing disappears mid-iteration.

use std::collections::BTreeSet;

use glam::Vec2;

use super::entity::{Category, Entity, EntityId, EntityKind};

#[derive(Debug, Default)]
pub struct EntityRegistry {
    /// Live entities in registration order
    entities: Vec<Entity>,
    /// Ids queued for removal (set, so marking twice is harmless)
    pending: BTreeSet<EntityId>,
    next_id: u32,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            pending: BTreeSet::new(),
            next_id: 1,
        }
    }

    /// Append a new entity to the live set
    ///
    /// Radius and bounds preconditions are checked by the caller (`World`).
    pub fn spawn(&mut self, pos: Vec2, vel: Vec2, radius: f32, wraps: bool, kind: EntityKind) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.push(Entity {
            id,
            pos,
            vel,
            radius,
            wraps,
            kind,
        });
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate live entities in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Live entities of one category
    pub fn of_category(&self, category: Category) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.category() == category)
    }

    pub fn count(&self, category: Category) -> usize {
        self.of_category(category).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Snapshot of live ids for one update pass
    ///
    /// Entities spawned while the snapshot is walked are not part of it.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id).collect()
    }

    /// Queue an entity for removal; false if it was already queued or is gone
    pub fn mark_for_removal(&mut self, id: EntityId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.pending.insert(id)
    }

    pub fn is_pending(&self, id: EntityId) -> bool {
        self.pending.contains(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Take the pending set, leaving it empty
    pub fn take_pending(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    /// Detach an entity from the live set
    ///
    /// Returns `None` if it was already removed, which callers treat as a no-op.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(index))
    }

    /// Drop every entity and pending removal (no hooks run)
    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_preserves_registration_order() {
        let mut reg = EntityRegistry::new();
        let a = reg.spawn(Vec2::ZERO, Vec2::ZERO, 1.0, false, EntityKind::Generic);
        let b = reg.spawn(Vec2::ONE, Vec2::ZERO, 1.0, false, EntityKind::Generic);
        assert_eq!(reg.ids(), vec![a, b]);
        assert!(a < b);
    }

    #[test]
    fn test_double_mark_yields_single_pending() {
        let mut reg = EntityRegistry::new();
        let a = reg.spawn(Vec2::ZERO, Vec2::ZERO, 1.0, false, EntityKind::Generic);
        assert!(reg.mark_for_removal(a));
        assert!(!reg.mark_for_removal(a));
        assert_eq!(reg.take_pending(), vec![a]);
        assert_eq!(reg.pending_count(), 0);
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let mut reg = EntityRegistry::new();
        let a = reg.spawn(Vec2::ZERO, Vec2::ZERO, 1.0, false, EntityKind::Generic);
        assert!(reg.remove(a).is_some());
        assert!(reg.remove(a).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_ids_snapshot_excludes_later_spawns() {
        let mut reg = EntityRegistry::new();
        reg.spawn(Vec2::ZERO, Vec2::ZERO, 1.0, false, EntityKind::Generic);
        let snapshot = reg.ids();
        reg.spawn(Vec2::ZERO, Vec2::ZERO, 1.0, false, EntityKind::Generic);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(reg.len(), 2);
    }
}

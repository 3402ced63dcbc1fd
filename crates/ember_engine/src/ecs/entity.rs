//! Entity handles and the per-scope entity table
//!
//! An entity is just a numeric id. Everything it "owns" lives in the table
//! record: a map from component key to pool slot index, plus an active flag.
//! Ids are recycled through a free list; a fixed-capacity table refuses to
//! grow once the free list runs dry.

use std::collections::HashMap;
use std::fmt;

use super::EcsError;

/// Lightweight handle to an entity in one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    id: u32,
}

impl Entity {
    pub(crate) const fn new(id: u32) -> Self {
        Self { id }
    }

    /// The numeric id of this entity.
    #[must_use]
    pub const fn id(self) -> u32 {
        self.id
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

/// Per-entity state: the component-key → pool-slot mapping and liveness.
#[derive(Debug, Default)]
pub(crate) struct EntityRecord {
    pub components: HashMap<&'static str, usize>,
    pub active: bool,
}

/// Id allocation and record storage for one scope.
#[derive(Debug)]
pub(crate) struct EntityTable {
    records: HashMap<u32, EntityRecord>,
    free_ids: Vec<u32>,
    allow_growth: bool,
    initial_size: usize,
}

impl EntityTable {
    pub fn new(size: usize, allow_growth: bool) -> Self {
        let mut records = HashMap::with_capacity(size);
        let mut free_ids = Vec::with_capacity(size);
        for id in 0..u32::try_from(size).unwrap_or(u32::MAX) {
            records.insert(id, EntityRecord::default());
            free_ids.push(id);
        }
        Self {
            records,
            free_ids,
            allow_growth,
            initial_size: size,
        }
    }

    /// Hand out an inactive id, growing the table if permitted.
    pub fn allocate(&mut self) -> Result<Entity, EcsError> {
        let id = match self.free_ids.pop() {
            Some(id) => id,
            None if self.allow_growth => {
                let id = u32::try_from(self.records.len()).unwrap_or(u32::MAX);
                self.records.insert(id, EntityRecord::default());
                log::debug!("entity table grew past {} slots", self.initial_size);
                id
            }
            None => return Err(EcsError::EntityCapacityExhausted(self.initial_size)),
        };
        if let Some(record) = self.records.get_mut(&id) {
            record.active = true;
        }
        Ok(Entity::new(id))
    }

    /// Mark an id inactive and recycle it. The caller clears the record's
    /// components first so removal events see a live entity.
    pub fn release(&mut self, entity: Entity) {
        if let Some(record) = self.records.get_mut(&entity.id()) {
            record.components.clear();
            record.active = false;
            self.free_ids.push(entity.id());
        }
    }

    pub fn active_record(&self, id: u32) -> Option<&EntityRecord> {
        self.records.get(&id).filter(|record| record.active)
    }

    pub fn active_record_mut(&mut self, id: u32) -> Option<&mut EntityRecord> {
        self.records.get_mut(&id).filter(|record| record.active)
    }

    pub fn active_count(&self) -> usize {
        self.records.values().filter(|record| record.active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_reuses_highest_free_id_first() {
        let mut table = EntityTable::new(3, true);
        let first = table.allocate().unwrap();
        let second = table.allocate().unwrap();
        assert_eq!(first.id(), 2);
        assert_eq!(second.id(), 1);
    }

    #[test]
    fn test_released_id_is_recycled() {
        let mut table = EntityTable::new(2, true);
        let first = table.allocate().unwrap();
        table.release(first);
        let again = table.allocate().unwrap();
        assert_eq!(first.id(), again.id());
    }

    #[test]
    fn test_fixed_capacity_refuses_to_grow() {
        let mut table = EntityTable::new(1, false);
        table.allocate().unwrap();
        assert!(matches!(
            table.allocate(),
            Err(EcsError::EntityCapacityExhausted(1))
        ));
    }

    #[test]
    fn test_growth_past_initial_size() {
        let mut table = EntityTable::new(1, true);
        let first = table.allocate().unwrap();
        let second = table.allocate().unwrap();
        assert_eq!(first.id(), 0);
        assert_eq!(second.id(), 1);
        assert_eq!(table.active_count(), 2);
    }

    #[test]
    fn test_release_clears_components() {
        let mut table = EntityTable::new(1, false);
        let entity = table.allocate().unwrap();
        table
            .records
            .get_mut(&entity.id())
            .unwrap()
            .components
            .insert("fuel", 0);
        table.release(entity);
        assert!(table.active_record(entity.id()).is_none());
        let again = table.allocate().unwrap();
        assert_eq!(again.id(), entity.id());
        assert!(table
            .active_record(again.id())
            .unwrap()
            .components
            .is_empty());
    }
}

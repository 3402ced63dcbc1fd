//! ECS world: one scope's entity table and component store
//!
//! The world owns id allocation and the per-entity component maps, and
//! routes component operations through the store so lifecycle events fire
//! with the owning entity attached. The table lives behind a shared handle
//! because system membership listeners resolve entities while a store event
//! is mid-dispatch; no borrow is held across a store call.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::events::EventTarget;

use super::component::{ComponentDescriptor, ComponentInstance, ComponentType};
use super::entity::EntityTable;
use super::store::ComponentStore;
use super::{EcsError, Entity};

/// Entity table plus component store for one scope.
pub struct World {
    store: Rc<ComponentStore>,
    entities: Rc<RefCell<EntityTable>>,
}

impl World {
    /// Create a standalone world. `pool_size` caps the entity table and
    /// every component pool; `allow_growth` controls whether the entity
    /// table may grow past it.
    #[must_use]
    pub fn new(pool_size: usize, allow_growth: bool) -> Self {
        Self::linked(pool_size, allow_growth, None, None)
    }

    /// Create a world whose store delegates to `parent_store` and raises
    /// events under `parent_events`.
    #[must_use]
    pub fn linked(
        pool_size: usize,
        allow_growth: bool,
        parent_store: Option<Rc<ComponentStore>>,
        parent_events: Option<&EventTarget>,
    ) -> Self {
        Self {
            store: Rc::new(ComponentStore::linked(
                pool_size,
                parent_store,
                parent_events,
            )),
            entities: Rc::new(RefCell::new(EntityTable::new(pool_size, allow_growth))),
        }
    }

    /// The component store backing this world.
    #[must_use]
    pub fn store(&self) -> &Rc<ComponentStore> {
        &self.store
    }

    /// The event target component lifecycle events are raised on.
    #[must_use]
    pub fn events(&self) -> &EventTarget {
        self.store.events()
    }

    pub(crate) fn entity_table(&self) -> Rc<RefCell<EntityTable>> {
        Rc::clone(&self.entities)
    }

    /// Activate a free entity id, growing the table when permitted.
    pub fn create_entity(&mut self) -> Result<Entity, EcsError> {
        self.entities.borrow_mut().allocate()
    }

    /// Whether `entity` is currently alive in this world.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.borrow().active_record(entity.id()).is_some()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.borrow().active_count()
    }

    /// Mutable accessor for a live entity.
    pub fn entity_mut(&mut self, entity: Entity) -> Option<EntityMut<'_>> {
        if self.contains(entity) {
            Some(EntityMut {
                world: self,
                entity,
            })
        } else {
            None
        }
    }

    /// Remove every component from `entity`, then deactivate it and recycle
    /// its id. Removal events fire while the entity still resolves, so
    /// tracking systems evict it. A dead or unknown entity is a no-op.
    pub fn delete_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        if !self.contains(entity) {
            return Ok(());
        }
        self.clear_components(entity)?;
        self.entities.borrow_mut().release(entity);
        Ok(())
    }

    /// Whether `entity` currently carries the component type.
    #[must_use]
    pub fn has_component(&self, entity: Entity, descriptor: &dyn ComponentDescriptor) -> bool {
        self.entities
            .borrow()
            .active_record(entity.id())
            .is_some_and(|record| record.components.contains_key(descriptor.key()))
    }

    /// Read `entity`'s payload for the component type, if present.
    #[must_use]
    pub fn get_component<T: 'static>(
        &self,
        entity: Entity,
        ty: &ComponentType<T>,
    ) -> Option<Rc<T>> {
        let slot = self.component_slot(entity, ty.key())?;
        match self.store.get(ty, slot) {
            Ok(data) => Some(data),
            Err(err) => {
                log::error!("component lookup failed for {entity}: {err}");
                None
            }
        }
    }

    pub(crate) fn get_component_erased(
        &self,
        entity: Entity,
        key: &'static str,
    ) -> Option<Rc<dyn Any>> {
        let slot = self.component_slot(entity, key)?;
        self.store.lookup_erased(key, slot)
    }

    /// Attach a packaged component. A no-op if the type is already present
    /// (first write wins).
    pub fn add_component<T: 'static>(
        &mut self,
        entity: Entity,
        component: ComponentInstance<'_, T>,
    ) -> Result<(), EcsError> {
        let ComponentInstance { ty, data } = component;
        self.add_component_literal(entity, ty, data)
    }

    /// Attach a payload under the component type. A no-op if the type is
    /// already present (first write wins).
    pub fn add_component_literal<T: 'static>(
        &mut self,
        entity: Entity,
        ty: &ComponentType<T>,
        data: T,
    ) -> Result<(), EcsError> {
        {
            let table = self.entities.borrow();
            let record = table
                .active_record(entity.id())
                .ok_or(EcsError::DeadEntity(entity))?;
            if record.components.contains_key(ty.key()) {
                return Ok(());
            }
        }
        // The creation event fires before the slot is recorded here, so
        // listeners treat the incoming component type as already present.
        let slot = self.store.create_literal(entity, ty, data)?;
        if let Some(record) = self.entities.borrow_mut().active_record_mut(entity.id()) {
            record.components.insert(ty.key(), slot);
        }
        Ok(())
    }

    /// Overwrite the payload of a component the entity already carries.
    /// A no-op if the component is absent; it never creates one.
    pub fn update_component<T: 'static>(
        &mut self,
        entity: Entity,
        ty: &ComponentType<T>,
        data: T,
    ) -> Result<(), EcsError> {
        let Some(slot) = self.component_slot(entity, ty.key()) else {
            return Ok(());
        };
        self.store.update(entity, ty, slot, data)
    }

    /// Detach the component type from `entity`. A no-op if absent.
    pub fn remove_component(
        &mut self,
        entity: Entity,
        descriptor: &dyn ComponentDescriptor,
    ) -> Result<(), EcsError> {
        let Some(slot) = self.component_slot(entity, descriptor.key()) else {
            return Ok(());
        };
        self.store.remove(entity, descriptor, slot)?;
        if let Some(record) = self.entities.borrow_mut().active_record_mut(entity.id()) {
            record.components.remove(descriptor.key());
        }
        Ok(())
    }

    /// Remove every component currently present on `entity`.
    pub fn clear_components(&mut self, entity: Entity) -> Result<(), EcsError> {
        let components: Vec<(&'static str, usize)> = {
            let table = self.entities.borrow();
            match table.active_record(entity.id()) {
                Some(record) => record
                    .components
                    .iter()
                    .map(|(&key, &slot)| (key, slot))
                    .collect(),
                None => return Ok(()),
            }
        };
        for (key, slot) in components {
            self.store.remove_by_key(entity, key, slot)?;
        }
        if let Some(record) = self.entities.borrow_mut().active_record_mut(entity.id()) {
            record.components.clear();
        }
        Ok(())
    }

    fn component_slot(&self, entity: Entity, key: &str) -> Option<usize> {
        self.entities
            .borrow()
            .active_record(entity.id())
            .and_then(|record| record.components.get(key).copied())
    }
}

/// Mutable, entity-scoped view over a [`World`].
pub struct EntityMut<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl EntityMut<'_> {
    /// The entity this accessor addresses.
    #[must_use]
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// Whether this entity carries the component type.
    #[must_use]
    pub fn has_component(&self, descriptor: &dyn ComponentDescriptor) -> bool {
        self.world.has_component(self.entity, descriptor)
    }

    /// Read this entity's payload for the component type, if present.
    #[must_use]
    pub fn get_component<T: 'static>(&self, ty: &ComponentType<T>) -> Option<Rc<T>> {
        self.world.get_component(self.entity, ty)
    }

    /// Attach a packaged component (first write wins).
    pub fn add_component<T: 'static>(
        &mut self,
        component: ComponentInstance<'_, T>,
    ) -> Result<(), EcsError> {
        self.world.add_component(self.entity, component)
    }

    /// Attach a payload under the component type (first write wins).
    pub fn add_component_literal<T: 'static>(
        &mut self,
        ty: &ComponentType<T>,
        data: T,
    ) -> Result<(), EcsError> {
        self.world.add_component_literal(self.entity, ty, data)
    }

    /// Overwrite an existing component's payload; no-op if absent.
    pub fn update_component<T: 'static>(
        &mut self,
        ty: &ComponentType<T>,
        data: T,
    ) -> Result<(), EcsError> {
        self.world.update_component(self.entity, ty, data)
    }

    /// Detach the component type; no-op if absent.
    pub fn remove_component(
        &mut self,
        descriptor: &dyn ComponentDescriptor,
    ) -> Result<(), EcsError> {
        self.world.remove_component(self.entity, descriptor)
    }

    /// Remove every component currently present.
    pub fn clear(&mut self) -> Result<(), EcsError> {
        self.world.clear_components(self.entity)
    }
}

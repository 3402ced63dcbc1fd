//! Scene: one independently tickable world scope
//!
//! A scene owns a [`World`] (entity table + component store) and a
//! priority-ordered system registry. `update` runs systems over distinct
//! priorities ascending, and within one priority in registration order.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::ecs::store::DEFAULT_POOL_SIZE;
use crate::ecs::{ComponentDescriptor, ComponentStore, EcsError, Entity, EntityMut, System, World};
use crate::events::EventTarget;

/// Sizing and growth policy for one scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Initial entity-table size and per-type component pool capacity.
    #[serde(default = "SceneConfig::default_pool_size")]
    pub pool_size: usize,
    /// Whether the entity table may grow past `pool_size`. When false,
    /// exhausting the free ids makes `create_entity` fail.
    #[serde(default = "SceneConfig::default_allow_growth")]
    pub allow_growth: bool,
}

impl SceneConfig {
    const fn default_pool_size() -> usize {
        DEFAULT_POOL_SIZE
    }

    const fn default_allow_growth() -> bool {
        true
    }

    /// Config with the given pool size and growth allowed.
    #[must_use]
    pub const fn with_pool_size(pool_size: usize) -> Self {
        Self {
            pool_size,
            allow_growth: true,
        }
    }

    /// Config with the given pool size and a hard entity cap.
    #[must_use]
    pub const fn fixed(pool_size: usize) -> Self {
        Self {
            pool_size,
            allow_growth: false,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            pool_size: Self::default_pool_size(),
            allow_growth: Self::default_allow_growth(),
        }
    }
}

/// An entity table, component store, and system registry under one event
/// target.
pub struct Scene {
    events: EventTarget,
    world: World,
    systems: BTreeMap<i64, Vec<System>>,
}

impl Scene {
    /// Create a standalone scene.
    #[must_use]
    pub fn new(config: SceneConfig) -> Self {
        Self::linked(config, None, None)
    }

    /// Create a scene whose store delegates missed lookups to
    /// `global_store` and whose events forward to `parent_events`.
    #[must_use]
    pub fn linked(
        config: SceneConfig,
        global_store: Option<Rc<ComponentStore>>,
        parent_events: Option<&EventTarget>,
    ) -> Self {
        let events = parent_events.map_or_else(EventTarget::new, EventTarget::with_parent);
        let world = World::linked(
            config.pool_size,
            config.allow_growth,
            global_store,
            Some(&events),
        );
        Self {
            events,
            world,
            systems: BTreeMap::new(),
        }
    }

    /// The event target scene-level events forward through.
    #[must_use]
    pub fn events(&self) -> &EventTarget {
        &self.events
    }

    /// The world this scene updates.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world this scene updates.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The component store backing this scene.
    #[must_use]
    pub fn component_store(&self) -> &Rc<ComponentStore> {
        self.world.store()
    }

    /// Register one component type on this scene's store.
    pub fn add_component_type(
        &mut self,
        descriptor: &dyn ComponentDescriptor,
    ) -> Result<(), EcsError> {
        self.world.store().register_component_type(descriptor, false)
    }

    /// Register several component types on this scene's store.
    pub fn add_component_types(
        &mut self,
        descriptors: &[&dyn ComponentDescriptor],
    ) -> Result<(), EcsError> {
        for descriptor in descriptors {
            self.add_component_type(*descriptor)?;
        }
        Ok(())
    }

    /// Close component registration and allocate the pools.
    pub fn finish_registration(&mut self) -> Result<(), EcsError> {
        self.world.store().finish_registration()
    }

    /// Activate a free entity id.
    pub fn create_entity(&mut self) -> Result<Entity, EcsError> {
        self.world.create_entity()
    }

    /// Whether `entity` is currently alive in this scene.
    #[must_use]
    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    /// Mutable accessor for a live entity.
    pub fn entity_mut(&mut self, entity: Entity) -> Option<EntityMut<'_>> {
        self.world.entity_mut(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.world.entity_count()
    }

    /// Clear the entity's components, deactivate it, and recycle its id.
    pub fn delete_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.world.delete_entity(entity)
    }

    /// Add a system at priority 0 and subscribe its membership listeners.
    pub fn add_system(&mut self, system: System) -> &mut System {
        self.add_system_at(system, 0)
    }

    /// Add a system at the given priority. Lower priorities update first;
    /// systems sharing a priority update in registration order.
    pub fn add_system_at(&mut self, system: System, priority: i64) -> &mut System {
        system.attach(&self.world);
        let bucket = self.systems.entry(priority).or_default();
        bucket.push(system);
        let index = bucket.len() - 1;
        &mut bucket[index]
    }

    /// Iterate the registered systems in update order.
    pub fn systems(&self) -> impl Iterator<Item = &System> {
        self.systems.values().flatten()
    }

    /// Run every system for one tick, in priority order.
    pub fn update(&mut self, delta_ms: f32) -> Result<(), EcsError> {
        for bucket in self.systems.values_mut() {
            for system in bucket {
                system.update(&mut self.world, delta_ms)?;
            }
        }
        Ok(())
    }
}

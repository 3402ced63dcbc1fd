//! System base: reactive entity membership tracking
//!
//! A system declares a signature (required and excluded component types)
//! and keeps a live set of matching entity ids. The set is maintained
//! purely from the store's lifecycle events; nothing is rescanned per
//! tick:
//!
//! - on a component creation, full membership is re-evaluated for the
//!   owning entity, treating the incoming type as already present (the
//!   event fires before the entity's component map is written)
//! - on a component removal, losing any required type evicts the entity
//!   unconditionally
//!
//! Behavior hooks are composed, not inherited: a [`System`] owns a boxed
//! [`SystemBehavior`] whose default method bodies are no-ops, mirroring
//! the update flow `on_first_tick` (once) → `system_update` →
//! `entity_update` (per tracked entity) → `post_update`.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use super::component::{ComponentDescriptor, ComponentType};
use super::store::{COMPONENT_CREATED, COMPONENT_REMOVED};
use super::world::World;
use super::{EcsError, Entity};

/// Required/excluded component sets defining which entities a system
/// tracks. The two lists are disjoint by convention.
pub struct SystemSignature {
    required: Vec<&'static str>,
    excluded: Vec<&'static str>,
}

impl SystemSignature {
    /// Build a signature from descriptor lists.
    #[must_use]
    pub fn new(
        required: &[&dyn ComponentDescriptor],
        excluded: &[&dyn ComponentDescriptor],
    ) -> Self {
        Self {
            required: required.iter().map(|descriptor| descriptor.key()).collect(),
            excluded: excluded.iter().map(|descriptor| descriptor.key()).collect(),
        }
    }

    /// Keys of the required component types.
    #[must_use]
    pub fn required(&self) -> &[&'static str] {
        &self.required
    }

    /// Keys of the excluded component types.
    #[must_use]
    pub fn excluded(&self) -> &[&'static str] {
        &self.excluded
    }

    /// Membership test run on every component creation. `incoming` is the
    /// type just created, counted as present even though the entity's map
    /// has not been written yet.
    fn tracks(&self, present: &HashMap<&'static str, usize>, incoming: &str) -> bool {
        self.required
            .iter()
            .all(|&key| present.contains_key(key) || key == incoming)
            && self
                .excluded
                .iter()
                .all(|&key| !present.contains_key(key) && key != incoming)
    }

    /// Whether losing `removed` disqualifies an entity outright.
    fn disqualified_by(&self, removed: &str) -> bool {
        self.required.iter().any(|&key| key == removed)
    }
}

/// Per-tick hooks a system runs over the world.
///
/// Every method has a no-op default; implementors override the ones they
/// need. Hooks receive a [`SystemContext`] with mutable world access, and
/// `entity_update` may freely delete the entity it is visiting.
pub trait SystemBehavior {
    /// Runs once, on the system's first update.
    fn on_first_tick(&mut self, _ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
        Ok(())
    }

    /// Runs every tick, before tracked entities are visited.
    fn system_update(
        &mut self,
        _ctx: &mut SystemContext<'_>,
        _delta_ms: f32,
    ) -> Result<(), EcsError> {
        Ok(())
    }

    /// Runs for each tracked entity, when entity updates are enabled.
    fn entity_update(
        &mut self,
        _ctx: &mut SystemContext<'_>,
        _delta_ms: f32,
        _entity: Entity,
    ) -> Result<(), EcsError> {
        Ok(())
    }

    /// Runs every tick, after tracked entities were visited.
    fn post_update(
        &mut self,
        _ctx: &mut SystemContext<'_>,
        _delta_ms: f32,
    ) -> Result<(), EcsError> {
        Ok(())
    }
}

/// World access handed to behavior hooks.
pub struct SystemContext<'a> {
    /// The world the owning scene is updating.
    pub world: &'a mut World,
    signature: Rc<SystemSignature>,
}

impl SystemContext<'_> {
    /// Pull every required component of `entity` into a keyed bundle.
    ///
    /// Fails with [`EcsError::MissingRequiredComponent`] if any is absent;
    /// on a tracked entity that means the tracking invariant was broken,
    /// so the error is meant to propagate, not be ignored.
    pub fn components(&self, entity: Entity) -> Result<ComponentBundle, EcsError> {
        let mut components = HashMap::with_capacity(self.signature.required().len());
        for &key in self.signature.required() {
            let data = self
                .world
                .get_component_erased(entity, key)
                .ok_or(EcsError::MissingRequiredComponent {
                    component: key,
                    entity,
                })?;
            components.insert(key, data);
        }
        Ok(ComponentBundle { entity, components })
    }
}

/// The required components of one entity, keyed by component type.
pub struct ComponentBundle {
    entity: Entity,
    components: HashMap<&'static str, Rc<dyn Any>>,
}

impl ComponentBundle {
    /// The entity the bundle was pulled from.
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Typed access to one of the pulled components.
    pub fn get<T: 'static>(&self, ty: &ComponentType<T>) -> Result<Rc<T>, EcsError> {
        let data = self.components.get(ty.key()).cloned().ok_or(
            EcsError::MissingRequiredComponent {
                component: ty.key(),
                entity: self.entity,
            },
        )?;
        data.downcast::<T>()
            .map_err(|_| EcsError::PayloadTypeMismatch {
                component: ty.key(),
                stored: "unknown",
                requested: std::any::type_name::<T>(),
            })
    }
}

/// Signature-driven entity tracker plus the behavior it drives.
pub struct System {
    signature: Rc<SystemSignature>,
    behavior: Box<dyn SystemBehavior>,
    tracked: Rc<RefCell<BTreeSet<u32>>>,
    ticked: bool,
    entity_updates: bool,
}

impl System {
    /// Compose a system from a signature and a behavior.
    #[must_use]
    pub fn new(signature: SystemSignature, behavior: Box<dyn SystemBehavior>) -> Self {
        Self {
            signature: Rc::new(signature),
            behavior,
            tracked: Rc::new(RefCell::new(BTreeSet::new())),
            ticked: false,
            entity_updates: true,
        }
    }

    /// Disable the per-entity update pass; `system_update` and
    /// `post_update` still run.
    #[must_use]
    pub fn without_entity_updates(mut self) -> Self {
        self.entity_updates = false;
        self
    }

    /// This system's required/excluded signature.
    #[must_use]
    pub fn signature(&self) -> &SystemSignature {
        &self.signature
    }

    /// Number of entities currently tracked.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.tracked.borrow().len()
    }

    /// Stop tracking every entity.
    pub fn clear_tracked(&self) {
        self.tracked.borrow_mut().clear();
    }

    /// Subscribe this system's membership listeners to the world's
    /// component lifecycle events. Called by the scene when the system is
    /// added; standalone worlds call it directly.
    pub fn attach(&self, world: &World) {
        let events = world.events().clone();

        let tracked = Rc::clone(&self.tracked);
        let entities = world.entity_table();
        let signature = Rc::clone(&self.signature);
        events.listen(&COMPONENT_CREATED, move |event, _| {
            let decision = entities
                .borrow()
                .active_record(event.entity.id())
                .map(|record| signature.tracks(&record.components, event.component));
            match decision {
                Some(true) => {
                    tracked.borrow_mut().insert(event.entity.id());
                }
                Some(false) => {
                    tracked.borrow_mut().remove(&event.entity.id());
                }
                None => {}
            }
        });

        let tracked = Rc::clone(&self.tracked);
        let entities = world.entity_table();
        let signature = Rc::clone(&self.signature);
        events.listen(&COMPONENT_REMOVED, move |event, _| {
            if !signature.disqualified_by(event.component) {
                return;
            }
            let resolves = entities
                .borrow()
                .active_record(event.entity.id())
                .is_some();
            if resolves {
                tracked.borrow_mut().remove(&event.entity.id());
            }
        });
    }

    /// Run one tick of this system over `world`.
    ///
    /// Tracked entities are visited from a snapshot: an entity evicted or
    /// deleted mid-pass (including by its own `entity_update`) is skipped
    /// without disturbing the rest of the iteration.
    pub fn update(&mut self, world: &mut World, delta_ms: f32) -> Result<(), EcsError> {
        let first_tick = !self.ticked;
        self.ticked = true;

        let mut ctx = SystemContext {
            world,
            signature: Rc::clone(&self.signature),
        };
        if first_tick {
            self.behavior.on_first_tick(&mut ctx)?;
        }
        self.behavior.system_update(&mut ctx, delta_ms)?;
        if self.entity_updates {
            let snapshot: Vec<u32> = self.tracked.borrow().iter().copied().collect();
            for id in snapshot {
                if !self.tracked.borrow().contains(&id) {
                    continue;
                }
                let entity = Entity::new(id);
                if !ctx.world.contains(entity) {
                    continue;
                }
                self.behavior.entity_update(&mut ctx, delta_ms, entity)?;
            }
        }
        self.behavior.post_update(&mut ctx, delta_ms)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static FUEL: ComponentType<f32> = ComponentType::new("fuel");
    static HEAT: ComponentType<i32> = ComponentType::new("heat");
    static INERT: ComponentType<()> = ComponentType::new("inert");

    fn ready_world(pool_size: usize) -> World {
        let world = World::new(pool_size, true);
        world.store().register_component_type(&FUEL, false).unwrap();
        world.store().register_component_type(&HEAT, false).unwrap();
        world
            .store()
            .register_component_type(&INERT, false)
            .unwrap();
        world.store().finish_registration().unwrap();
        world
    }

    struct Noop;
    impl SystemBehavior for Noop {}

    fn tracker(required: &[&dyn ComponentDescriptor], excluded: &[&dyn ComponentDescriptor]) -> System {
        System::new(SystemSignature::new(required, excluded), Box::new(Noop))
    }

    #[test]
    fn test_tracks_only_entities_with_all_required_components() {
        let mut world = ready_world(3);
        let system = tracker(&[&FUEL, &HEAT], &[]);
        system.attach(&world);
        assert_eq!(system.tracked_count(), 0);

        let first = world.create_entity().unwrap();
        let second = world.create_entity().unwrap();

        world.add_component_literal(first, &FUEL, 1.0).unwrap();
        assert_eq!(system.tracked_count(), 0);

        world.add_component_literal(first, &HEAT, 1).unwrap();
        assert_eq!(system.tracked_count(), 1);

        world.add_component_literal(second, &FUEL, 2.0).unwrap();
        assert_eq!(system.tracked_count(), 1);

        world.add_component_literal(second, &HEAT, 2).unwrap();
        assert_eq!(system.tracked_count(), 2);

        world.remove_component(first, &FUEL).unwrap();
        assert_eq!(system.tracked_count(), 1);

        world.add_component(first, FUEL.instance(1.0)).unwrap();
        assert_eq!(system.tracked_count(), 2);
    }

    #[test]
    fn test_losing_any_required_component_evicts() {
        let mut world = ready_world(3);
        let system = tracker(&[&FUEL, &HEAT], &[]);
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world.add_component_literal(entity, &FUEL, 1.0).unwrap();
        world.add_component_literal(entity, &HEAT, 1).unwrap();
        assert_eq!(system.tracked_count(), 1);

        world.remove_component(entity, &HEAT).unwrap();
        assert_eq!(system.tracked_count(), 0);
    }

    #[test]
    fn test_excluded_component_blocks_tracking() {
        let mut world = ready_world(3);
        let system = tracker(&[&FUEL], &[&INERT]);
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world.add_component_literal(entity, &INERT, ()).unwrap();
        world.add_component_literal(entity, &FUEL, 1.0).unwrap();
        assert_eq!(system.tracked_count(), 0);
    }

    #[test]
    fn test_adding_excluded_component_evicts() {
        let mut world = ready_world(3);
        let system = tracker(&[&FUEL], &[&INERT]);
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world.add_component_literal(entity, &FUEL, 1.0).unwrap();
        assert_eq!(system.tracked_count(), 1);

        world.add_component_literal(entity, &INERT, ()).unwrap();
        assert_eq!(system.tracked_count(), 0);
    }

    #[test]
    fn test_deleted_entity_is_evicted() {
        let mut world = ready_world(3);
        let system = tracker(&[&FUEL], &[]);
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world.add_component_literal(entity, &FUEL, 1.0).unwrap();
        assert_eq!(system.tracked_count(), 1);

        world.delete_entity(entity).unwrap();
        assert_eq!(system.tracked_count(), 0);
    }

    #[test]
    fn test_clear_tracked_forgets_everything() {
        let mut world = ready_world(3);
        let system = tracker(&[&FUEL], &[]);
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world.add_component_literal(entity, &FUEL, 1.0).unwrap();
        assert_eq!(system.tracked_count(), 1);

        system.clear_tracked();
        assert_eq!(system.tracked_count(), 0);
    }

    struct Recorder {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl SystemBehavior for Recorder {
        fn on_first_tick(&mut self, _ctx: &mut SystemContext<'_>) -> Result<(), EcsError> {
            self.log.borrow_mut().push("first".into());
            Ok(())
        }

        fn system_update(
            &mut self,
            _ctx: &mut SystemContext<'_>,
            _delta_ms: f32,
        ) -> Result<(), EcsError> {
            self.log.borrow_mut().push("system".into());
            Ok(())
        }

        fn entity_update(
            &mut self,
            _ctx: &mut SystemContext<'_>,
            _delta_ms: f32,
            entity: Entity,
        ) -> Result<(), EcsError> {
            self.log.borrow_mut().push(format!("entity {entity}"));
            Ok(())
        }

        fn post_update(
            &mut self,
            _ctx: &mut SystemContext<'_>,
            _delta_ms: f32,
        ) -> Result<(), EcsError> {
            self.log.borrow_mut().push("post".into());
            Ok(())
        }
    }

    #[test]
    fn test_update_runs_hooks_in_order_and_first_tick_once() {
        let mut world = ready_world(3);
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut system = System::new(
            SystemSignature::new(&[&FUEL], &[]),
            Box::new(Recorder {
                log: Rc::clone(&log),
            }),
        );
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world.add_component_literal(entity, &FUEL, 1.0).unwrap();

        system.update(&mut world, 16.0).unwrap();
        system.update(&mut world, 16.0).unwrap();

        let expected = vec![
            "first".to_string(),
            "system".to_string(),
            format!("entity {entity}"),
            "post".to_string(),
            "system".to_string(),
            format!("entity {entity}"),
            "post".to_string(),
        ];
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn test_entity_updates_can_be_disabled() {
        let mut world = ready_world(3);
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut system = System::new(
            SystemSignature::new(&[&FUEL], &[]),
            Box::new(Recorder {
                log: Rc::clone(&log),
            }),
        )
        .without_entity_updates();
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world.add_component_literal(entity, &FUEL, 1.0).unwrap();

        system.update(&mut world, 16.0).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["first".to_string(), "system".to_string(), "post".to_string()]
        );
    }

    struct DeleteVisited;

    impl SystemBehavior for DeleteVisited {
        fn entity_update(
            &mut self,
            ctx: &mut SystemContext<'_>,
            _delta_ms: f32,
            entity: Entity,
        ) -> Result<(), EcsError> {
            ctx.world.delete_entity(entity)
        }
    }

    #[test]
    fn test_entity_update_may_delete_the_visited_entity() {
        let mut world = ready_world(4);
        let mut system = System::new(
            SystemSignature::new(&[&FUEL], &[]),
            Box::new(DeleteVisited),
        );
        system.attach(&world);

        for value in [1.0_f32, 2.0, 3.0] {
            let entity = world.create_entity().unwrap();
            world.add_component_literal(entity, &FUEL, value).unwrap();
        }
        assert_eq!(system.tracked_count(), 3);

        system.update(&mut world, 16.0).unwrap();
        assert_eq!(system.tracked_count(), 0);
        assert_eq!(world.entity_count(), 0);
    }

    struct DeleteOther {
        victim: Entity,
        visited: Rc<RefCell<Vec<Entity>>>,
    }

    impl SystemBehavior for DeleteOther {
        fn entity_update(
            &mut self,
            ctx: &mut SystemContext<'_>,
            _delta_ms: f32,
            entity: Entity,
        ) -> Result<(), EcsError> {
            self.visited.borrow_mut().push(entity);
            if entity != self.victim {
                ctx.world.delete_entity(self.victim)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_entity_evicted_mid_pass_is_skipped() {
        let mut world = ready_world(4);

        let first = world.create_entity().unwrap();
        let second = world.create_entity().unwrap();
        // Ids are handed out high-to-low, so `second` is visited last.
        assert!(second.id() < first.id());

        let visited = Rc::new(RefCell::new(Vec::new()));
        let mut system = System::new(
            SystemSignature::new(&[&FUEL], &[]),
            Box::new(DeleteOther {
                victim: first,
                visited: Rc::clone(&visited),
            }),
        );
        system.attach(&world);

        world.add_component_literal(first, &FUEL, 1.0).unwrap();
        world.add_component_literal(second, &FUEL, 2.0).unwrap();
        assert_eq!(system.tracked_count(), 2);

        system.update(&mut world, 16.0).unwrap();
        assert_eq!(*visited.borrow(), vec![second]);
        assert_eq!(system.tracked_count(), 1);
    }

    struct PullRequired {
        seen: Rc<RefCell<Vec<(f32, i32)>>>,
    }

    impl SystemBehavior for PullRequired {
        fn entity_update(
            &mut self,
            ctx: &mut SystemContext<'_>,
            _delta_ms: f32,
            entity: Entity,
        ) -> Result<(), EcsError> {
            let bundle = ctx.components(entity)?;
            self.seen
                .borrow_mut()
                .push((*bundle.get(&FUEL)?, *bundle.get(&HEAT)?));
            Ok(())
        }
    }

    #[test]
    fn test_components_pulls_required_payloads() {
        let mut world = ready_world(3);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut system = System::new(
            SystemSignature::new(&[&FUEL, &HEAT], &[]),
            Box::new(PullRequired {
                seen: Rc::clone(&seen),
            }),
        );
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world.add_component_literal(entity, &FUEL, 1.5).unwrap();
        world.add_component_literal(entity, &HEAT, 4).unwrap();

        system.update(&mut world, 16.0).unwrap();
        assert_eq!(*seen.borrow(), vec![(1.5, 4)]);
    }

    #[test]
    fn test_bundle_rejects_unrequested_component() {
        let mut world = ready_world(3);
        let system = tracker(&[&FUEL], &[]);
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world.add_component_literal(entity, &FUEL, 1.0).unwrap();

        let ctx = SystemContext {
            world: &mut world,
            signature: Rc::new(SystemSignature::new(&[&FUEL], &[])),
        };
        let bundle = ctx.components(entity).unwrap();
        assert!(matches!(
            bundle.get(&HEAT),
            Err(EcsError::MissingRequiredComponent {
                component: "heat",
                ..
            })
        ));
    }
}

//! Lifetime decay
//!
//! Counts each tracked entity's `LIFETIME` component down by the elapsed
//! milliseconds and deletes the entity when it runs out.

use crate::ecs::components::LIFETIME;
use crate::ecs::{EcsError, Entity, System, SystemBehavior, SystemContext, SystemSignature};

/// Deletes entities whose lifetime has elapsed.
pub struct LifetimeSystem;

impl LifetimeSystem {
    /// Build the system, ready to add to a scene.
    #[must_use]
    pub fn system() -> System {
        System::new(SystemSignature::new(&[&LIFETIME], &[]), Box::new(Self))
    }
}

impl SystemBehavior for LifetimeSystem {
    fn entity_update(
        &mut self,
        ctx: &mut SystemContext<'_>,
        delta_ms: f32,
        entity: Entity,
    ) -> Result<(), EcsError> {
        let bundle = ctx.components(entity)?;
        let remaining = *bundle.get(&LIFETIME)? - delta_ms;
        if remaining <= 0.0 {
            return ctx.world.delete_entity(entity);
        }
        ctx.world.update_component(entity, &LIFETIME, remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::World;

    fn ready_world() -> World {
        let world = World::new(8, true);
        world
            .store()
            .register_component_type(&LIFETIME, false)
            .unwrap();
        world.store().finish_registration().unwrap();
        world
    }

    #[test]
    fn test_expired_entity_is_deleted() {
        let mut world = ready_world();
        let mut system = LifetimeSystem::system();
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world.add_component_literal(entity, &LIFETIME, 3000.0).unwrap();

        system.update(&mut world, 3000.0).unwrap();
        assert!(!world.contains(entity));
        assert_eq!(system.tracked_count(), 0);
    }

    #[test]
    fn test_surviving_entity_keeps_decayed_lifetime() {
        let mut world = ready_world();
        let mut system = LifetimeSystem::system();
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world.add_component_literal(entity, &LIFETIME, 3000.0).unwrap();

        system.update(&mut world, 1000.0).unwrap();
        assert!(world.contains(entity));
        let remaining = *world.get_component(entity, &LIFETIME).unwrap();
        assert!((remaining - 2000.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_untracked_entities_are_left_alone() {
        let mut world = ready_world();
        let mut system = LifetimeSystem::system();
        system.attach(&world);

        let eternal = world.create_entity().unwrap();
        let mortal = world.create_entity().unwrap();
        world.add_component_literal(mortal, &LIFETIME, 10.0).unwrap();

        system.update(&mut world, 100.0).unwrap();
        assert!(world.contains(eternal));
        assert!(!world.contains(mortal));
    }
}

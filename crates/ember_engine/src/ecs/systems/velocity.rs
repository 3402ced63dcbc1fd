//! Velocity integration
//!
//! Advances each tracked entity's position by its velocity. Velocity is in
//! world units per second; tick deltas arrive in milliseconds.

use crate::ecs::components::{POSITION_2D, VELOCITY_2D};
use crate::ecs::{EcsError, Entity, System, SystemBehavior, SystemContext, SystemSignature};

/// Integrates `POSITION_2D` from `VELOCITY_2D` each tick.
pub struct VelocitySystem;

impl VelocitySystem {
    /// Build the system, ready to add to a scene.
    #[must_use]
    pub fn system() -> System {
        System::new(
            SystemSignature::new(&[&VELOCITY_2D, &POSITION_2D], &[]),
            Box::new(Self),
        )
    }
}

impl SystemBehavior for VelocitySystem {
    fn entity_update(
        &mut self,
        ctx: &mut SystemContext<'_>,
        delta_ms: f32,
        entity: Entity,
    ) -> Result<(), EcsError> {
        let bundle = ctx.components(entity)?;
        let velocity = bundle.get(&VELOCITY_2D)?;
        let position = bundle.get(&POSITION_2D)?;
        let updated = *position + *velocity * (delta_ms / 1000.0);
        ctx.world.update_component(entity, &POSITION_2D, updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::World;
    use crate::foundation::math::Vec2;
    use approx::assert_relative_eq;

    fn ready_world() -> World {
        let world = World::new(8, true);
        world
            .store()
            .register_component_type(&POSITION_2D, false)
            .unwrap();
        world
            .store()
            .register_component_type(&VELOCITY_2D, false)
            .unwrap();
        world.store().finish_registration().unwrap();
        world
    }

    #[test]
    fn test_position_advances_by_velocity() {
        let mut world = ready_world();
        let mut system = VelocitySystem::system();
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world
            .add_component_literal(entity, &POSITION_2D, Vec2::new(0.0, 0.0))
            .unwrap();
        world
            .add_component_literal(entity, &VELOCITY_2D, Vec2::new(1.0, 0.0))
            .unwrap();

        system.update(&mut world, 1000.0).unwrap();
        let position = world.get_component(entity, &POSITION_2D).unwrap();
        assert_relative_eq!(position.x, 1.0);
        assert_relative_eq!(position.y, 0.0);

        system.update(&mut world, 2000.0).unwrap();
        let position = world.get_component(entity, &POSITION_2D).unwrap();
        assert_relative_eq!(position.x, 3.0);

        system.update(&mut world, 16.33).unwrap();
        let position = world.get_component(entity, &POSITION_2D).unwrap();
        assert_relative_eq!(position.x, 3.016, epsilon = 1e-3);
    }

    #[test]
    fn test_entity_without_position_is_not_tracked() {
        let mut world = ready_world();
        let mut system = VelocitySystem::system();
        system.attach(&world);

        let entity = world.create_entity().unwrap();
        world
            .add_component_literal(entity, &VELOCITY_2D, Vec2::new(1.0, 1.0))
            .unwrap();
        assert_eq!(system.tracked_count(), 0);

        system.update(&mut world, 1000.0).unwrap();
        assert!(world.get_component(entity, &POSITION_2D).is_none());
    }
}

//! # Ember Engine
//!
//! A lightweight entity-component-system runtime for 2D games.
//!
//! ## Features
//!
//! - **Pooled Components**: Fixed-capacity pools with O(1) slot reuse
//! - **Reactive Systems**: Membership tracked from lifecycle events, never
//!   rescanned per tick
//! - **Hierarchical Events**: Store → scene → game event bubbling with
//!   cancel and stop-propagation
//! - **Scene Composition**: An always-updated global scope plus named,
//!   switchable scenes with store delegation
//!
//! ## Quick Start
//!
//! ```rust
//! use ember_engine::prelude::*;
//!
//! fn main() -> Result<(), EcsError> {
//!     let mut game = Game::new();
//!     let scene = game.create_scene("main");
//!     scene.add_component_types(&[&POSITION_2D, &VELOCITY_2D, &LIFETIME])?;
//!     scene.finish_registration()?;
//!     scene.add_system(VelocitySystem::system());
//!     scene.add_system(LifetimeSystem::system());
//!     game.set_active_scene("main");
//!
//!     let entity = game.scene_mut("main").unwrap().create_entity()?;
//!     let scene = game.scene_mut("main").unwrap();
//!     let mut view = scene.entity_mut(entity).unwrap();
//!     view.add_component_literal(&POSITION_2D, Vec2::new(0.0, 0.0))?;
//!     view.add_component_literal(&VELOCITY_2D, Vec2::new(1.0, 0.0))?;
//!     view.add_component_literal(&LIFETIME, 5000.0)?;
//!
//!     game.update(16.0)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod scene;

mod game;

pub use game::{Game, GameConfig};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{ConfigError, EngineConfig},
        ecs::{
            components::{LIFETIME, POSITION_2D, VELOCITY_2D},
            systems::{LifetimeSystem, VelocitySystem},
            ComponentBundle, ComponentDescriptor, ComponentInstance, ComponentStore,
            ComponentType, EcsError, Entity, EntityMut, System, SystemBehavior, SystemContext,
            SystemSignature, World,
        },
        events::{EventControl, EventTarget, EventType},
        foundation::math::Vec2,
        scene::{Scene, SceneConfig},
        Game, GameConfig,
    };
}

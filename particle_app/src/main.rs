//! Headless particle-burst demo
//!
//! Spawns a ring of particles with finite lifetimes, then ticks the game
//! at a fixed timestep until every particle has decayed. Run with
//! `RUST_LOG=debug` to watch the engine's lifecycle logging.

use std::path::Path;

use ember_engine::prelude::*;
use log::info;

const CONFIG_PATH: &str = "engine.toml";
const FRAME_MS: f32 = 16.0;
const FRAMES: u32 = 240;
const PARTICLES: u32 = 64;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    ember_engine::foundation::logging::init();

    let config = if Path::new(CONFIG_PATH).exists() {
        EngineConfig::load(CONFIG_PATH)?
    } else {
        EngineConfig::default()
    };

    let mut game = Game::with_config(config.game.clone());
    let scene = game.create_scene("burst");
    scene.add_component_types(&[&POSITION_2D, &VELOCITY_2D, &LIFETIME])?;
    scene.finish_registration()?;
    scene.add_system(VelocitySystem::system());
    scene.add_system_at(LifetimeSystem::system(), 10);
    game.set_active_scene("burst");

    spawn_burst(game.scene_mut("burst").ok_or("missing burst scene")?)?;
    info!("spawned {PARTICLES} particles");

    for frame in 0..FRAMES {
        game.update(FRAME_MS)?;
        if frame % 60 == 0 {
            let alive = game.scene("burst").map_or(0, Scene::entity_count);
            info!("frame {frame}: {alive} particles alive");
        }
    }

    let alive = game.scene("burst").map_or(0, Scene::entity_count);
    info!("simulation finished with {alive} particles alive");
    Ok(())
}

fn spawn_burst(scene: &mut Scene) -> Result<(), EcsError> {
    for index in 0..PARTICLES {
        let angle = (index as f32 / PARTICLES as f32) * std::f32::consts::TAU;
        let entity = scene.create_entity()?;
        let mut view = scene
            .entity_mut(entity)
            .ok_or(EcsError::DeadEntity(entity))?;
        view.add_component_literal(&POSITION_2D, Vec2::new(0.0, 0.0))?;
        view.add_component_literal(&VELOCITY_2D, Vec2::new(angle.cos(), angle.sin()) * 40.0)?;
        view.add_component_literal(&LIFETIME, 1000.0 + 10.0 * index as f32)?;
    }
    Ok(())
}

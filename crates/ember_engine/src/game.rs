//! Game: scene composition and the top-level tick
//!
//! A game owns one always-updated "global" scene plus a set of named,
//! switchable scenes. Each tick updates the global scene first, then the
//! active scene if one is set. Scenes created through the game parent
//! their component store to the global scene's store, so globally scoped
//! components resolve from any scene.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::ecs::EcsError;
use crate::events::EventTarget;
use crate::scene::{Scene, SceneConfig};

/// Sizing defaults for a game and the scenes it creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Pool size of the fixed-capacity global scene.
    #[serde(default = "GameConfig::default_global_pool_size")]
    pub global_pool_size: usize,
    /// Default config for scenes created via [`Game::create_scene`].
    #[serde(default)]
    pub scene: SceneConfig,
}

impl GameConfig {
    const fn default_global_pool_size() -> usize {
        100
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            global_pool_size: Self::default_global_pool_size(),
            scene: SceneConfig::default(),
        }
    }
}

/// The always-updated global scene plus the named scene registry.
pub struct Game {
    config: GameConfig,
    events: EventTarget,
    global: Scene,
    scenes: HashMap<String, Scene>,
    active: Option<String>,
}

impl Game {
    /// Create a game with default sizing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    /// Create a game with the given sizing.
    #[must_use]
    pub fn with_config(config: GameConfig) -> Self {
        let events = EventTarget::new();
        let global = Scene::new(SceneConfig::fixed(config.global_pool_size));
        Self {
            config,
            events,
            global,
            scenes: HashMap::new(),
            active: None,
        }
    }

    /// Create a game whose event target forwards to `parent`.
    #[must_use]
    pub fn attached(config: GameConfig, parent: &EventTarget) -> Self {
        let mut game = Self::with_config(config);
        game.events = EventTarget::with_parent(parent);
        game
    }

    /// The event target scene events forward through.
    #[must_use]
    pub fn events(&self) -> &EventTarget {
        &self.events
    }

    /// The always-updated global scene.
    #[must_use]
    pub fn global_scene(&self) -> &Scene {
        &self.global
    }

    /// Mutable access to the global scene.
    pub fn global_scene_mut(&mut self) -> &mut Scene {
        &mut self.global
    }

    /// Create (or replace) a named scene with the game's default scene
    /// config. The scene's store delegates to the global scene's store.
    pub fn create_scene(&mut self, name: &str) -> &mut Scene {
        let config = self.config.scene.clone();
        self.create_scene_with(name, config)
    }

    /// Create (or replace) a named scene with an explicit config.
    pub fn create_scene_with(&mut self, name: &str, config: SceneConfig) -> &mut Scene {
        let scene = Scene::linked(
            config,
            Some(Rc::clone(self.global.component_store())),
            Some(&self.events),
        );
        log::debug!("created scene `{name}`");
        match self.scenes.entry(name.to_owned()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(scene);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(scene),
        }
    }

    /// Look up a named scene.
    #[must_use]
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    /// Mutable lookup of a named scene.
    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    /// Make `name` the active scene. Unknown names are a no-op that keeps
    /// the previous active scene; returns whether the switch happened.
    pub fn set_active_scene(&mut self, name: &str) -> bool {
        if self.scenes.contains_key(name) {
            log::debug!("active scene is now `{name}`");
            self.active = Some(name.to_owned());
            true
        } else {
            log::warn!("cannot activate unknown scene `{name}`");
            false
        }
    }

    /// The currently active scene, if any.
    #[must_use]
    pub fn active_scene(&self) -> Option<&Scene> {
        self.active.as_ref().and_then(|name| self.scenes.get(name))
    }

    /// Mutable access to the currently active scene, if any.
    pub fn active_scene_mut(&mut self) -> Option<&mut Scene> {
        self.active.as_ref().and_then(|name| self.scenes.get_mut(name))
    }

    /// Tick the global scene, then the active scene.
    pub fn update(&mut self, delta_ms: f32) -> Result<(), EcsError> {
        self.global.update(delta_ms)?;
        if let Some(name) = &self.active {
            if let Some(scene) = self.scenes.get_mut(name) {
                scene.update(delta_ms)?;
            }
        }
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{
        ComponentType, EcsError, System, SystemBehavior, SystemContext, SystemSignature,
    };
    use std::cell::RefCell;

    static FUEL: ComponentType<f32> = ComponentType::new("fuel");

    struct Tagger {
        tag: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl SystemBehavior for Tagger {
        fn system_update(
            &mut self,
            _ctx: &mut SystemContext<'_>,
            _delta_ms: f32,
        ) -> Result<(), EcsError> {
            self.log.borrow_mut().push(self.tag);
            Ok(())
        }
    }

    fn tagger(tag: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> System {
        System::new(
            SystemSignature::new(&[], &[]),
            Box::new(Tagger {
                tag,
                log: Rc::clone(log),
            }),
        )
        .without_entity_updates()
    }

    #[test]
    fn test_update_ticks_global_then_active_scene() {
        let mut game = Game::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        game.global_scene_mut().add_system(tagger("global", &log));
        game.create_scene("main").add_system(tagger("main", &log));
        game.create_scene("other").add_system(tagger("other", &log));
        game.set_active_scene("main");

        game.update(16.0).unwrap();
        assert_eq!(*log.borrow(), vec!["global", "main"]);
    }

    #[test]
    fn test_update_without_active_scene_ticks_global_only() {
        let mut game = Game::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        game.global_scene_mut().add_system(tagger("global", &log));
        game.create_scene("main").add_system(tagger("main", &log));

        game.update(16.0).unwrap();
        assert_eq!(*log.borrow(), vec!["global"]);
    }

    #[test]
    fn test_set_active_scene_ignores_unknown_names() {
        let mut game = Game::new();
        game.create_scene("main");
        assert!(game.set_active_scene("main"));
        assert!(!game.set_active_scene("missing"));
        assert!(game.active_scene().is_some());
    }

    #[test]
    fn test_scene_store_delegates_to_global_scene() {
        let mut game = Game::new();
        game.global_scene_mut().add_component_type(&FUEL).unwrap();
        game.global_scene_mut().finish_registration().unwrap();

        let global_entity = game.global_scene_mut().create_entity().unwrap();
        let slot = game
            .global_scene()
            .component_store()
            .create_literal(global_entity, &FUEL, 42.0)
            .unwrap();

        let scene = game.create_scene("main");
        scene.finish_registration().unwrap();
        let through_scene = scene.component_store().get(&FUEL, slot).unwrap();
        assert!((*through_scene - 42.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_global_scene_has_fixed_capacity() {
        let mut game = Game::with_config(GameConfig {
            global_pool_size: 1,
            scene: SceneConfig::default(),
        });
        game.global_scene_mut().finish_registration().unwrap();
        game.global_scene_mut().create_entity().unwrap();
        assert!(matches!(
            game.global_scene_mut().create_entity(),
            Err(EcsError::EntityCapacityExhausted(1))
        ));
    }

    #[test]
    fn test_attached_game_forwards_scene_events_to_parent_target() {
        use crate::ecs::COMPONENT_CREATED;

        let root = EventTarget::new();
        let seen = Rc::new(RefCell::new(0));
        let handle = Rc::clone(&seen);
        root.listen(&COMPONENT_CREATED, move |_, _| {
            *handle.borrow_mut() += 1;
        });

        let mut game = Game::attached(GameConfig::default(), &root);
        let scene = game.create_scene("main");
        scene.add_component_type(&FUEL).unwrap();
        scene.finish_registration().unwrap();
        let entity = scene.create_entity().unwrap();
        scene
            .entity_mut(entity)
            .unwrap()
            .add_component_literal(&FUEL, 1.0)
            .unwrap();

        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_create_scene_replaces_existing_name() {
        let mut game = Game::new();
        {
            let scene = game.create_scene("main");
            scene.finish_registration().unwrap();
            scene.create_entity().unwrap();
        }
        let replaced = game.create_scene("main");
        assert_eq!(replaced.entity_count(), 0);
    }
}

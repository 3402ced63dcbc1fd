//! Entity-Component-System implementation
//!
//! Provides pooled component storage, reactive system membership tracking,
//! and the entity handles that tie them together. Everything here is
//! single-threaded and synchronous: store mutations dispatch their
//! lifecycle events before returning, so system tracking sets are already
//! up to date when the next tick observes them.

pub mod component;
pub mod components;
pub mod entity;
pub mod store;
pub mod system;
pub mod systems;
pub mod world;

pub use component::{ComponentDescriptor, ComponentInstance, ComponentType};
pub use entity::Entity;
pub use store::{
    ComponentCreated, ComponentRemoved, ComponentStore, ComponentTypeRegistered,
    ComponentUpdated, COMPONENT_CREATED, COMPONENT_REMOVED, COMPONENT_TYPE_REGISTERED,
    COMPONENT_UPDATED, DEFAULT_POOL_SIZE,
};
pub use system::{ComponentBundle, System, SystemBehavior, SystemContext, SystemSignature};
pub use world::{EntityMut, World};

use thiserror::Error;

/// Errors surfaced by store, entity, and system operations.
///
/// These are programmer errors reported at the call site; nothing here is
/// retried or swallowed internally.
#[derive(Debug, Error)]
pub enum EcsError {
    /// A component type was registered twice without the force flag.
    #[error("component type `{0}` is already registered; use force to replace it")]
    DuplicateComponentType(&'static str),

    /// A component type was registered after `finish_registration`.
    #[error("cannot register component type `{0}` after registration has finished")]
    RegistrationClosed(&'static str),

    /// A component instance operation ran before `finish_registration`.
    #[error("component type `{0}` was used before registration finished")]
    RegistrationOpen(&'static str),

    /// `finish_registration` was called more than once.
    #[error("component registration was already finished")]
    RegistrationAlreadyFinished,

    /// An instance operation named a type the store never registered.
    #[error("unknown component type `{0}`; was it registered?")]
    UnknownComponentType(&'static str),

    /// An instance operation addressed an empty pool slot.
    #[error("no `{component}` component at slot {slot}")]
    EmptySlot {
        /// Key of the component type addressed.
        component: &'static str,
        /// Slot index that was empty.
        slot: usize,
    },

    /// A payload was created or read with the wrong concrete type.
    #[error("component `{component}` stores `{stored}` payloads, not `{requested}`")]
    PayloadTypeMismatch {
        /// Key of the component type addressed.
        component: &'static str,
        /// Payload type recorded at registration.
        stored: &'static str,
        /// Payload type named by the caller.
        requested: &'static str,
    },

    /// A fixed-capacity scope ran out of entity ids.
    #[error("no free entity ids left (capacity {0})")]
    EntityCapacityExhausted(usize),

    /// An operation referenced an entity that is not alive in this scope.
    #[error("entity {0} is not alive in this scope")]
    DeadEntity(Entity),

    /// A tracked entity was missing one of its system's required
    /// components, which breaks the tracking invariant.
    #[error("required component `{component}` missing on tracked entity {entity}")]
    MissingRequiredComponent {
        /// Key of the missing component type.
        component: &'static str,
        /// The tracked entity that failed the pull.
        entity: Entity,
    },
}

//! Pooled component storage
//!
//! One store owns a fixed-capacity pool per registered component type.
//! Slots hold type-erased payloads (`Rc<dyn Any>`) addressed by index, with
//! a free-index stack for O(1) reuse. Registration is a two-phase protocol:
//! declare every type, then `finish_registration` to allocate the pools.
//!
//! All mutations are observable only through the lifecycle events raised on
//! the store's [`EventTarget`]: [`COMPONENT_CREATED`], [`COMPONENT_UPDATED`]
//! (raised before the slot changes), [`COMPONENT_REMOVED`] (raised before
//! the slot empties), and [`COMPONENT_TYPE_REGISTERED`].
//!
//! A store may delegate to a parent: lookups that miss locally (unknown
//! type or empty slot) are retried against the parent before failing, which
//! is how scene-local stores overlay the global one.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::events::{EventTarget, EventType};

use super::component::{ComponentDescriptor, ComponentInstance, ComponentType};
use super::{EcsError, Entity};

/// Pool capacity used when none is configured.
pub const DEFAULT_POOL_SIZE: usize = 2000;

/// Payload of [`COMPONENT_CREATED`].
#[derive(Clone)]
pub struct ComponentCreated {
    /// Key of the component type created.
    pub component: &'static str,
    /// Entity the component was attached to.
    pub entity: Entity,
    /// The stored payload.
    pub data: Rc<dyn Any>,
}

/// Payload of [`COMPONENT_UPDATED`]. Raised before the slot is rewritten.
#[derive(Clone)]
pub struct ComponentUpdated {
    /// Key of the component type updated.
    pub component: &'static str,
    /// Entity the component belongs to.
    pub entity: Entity,
    /// Payload being replaced.
    pub old_data: Rc<dyn Any>,
    /// Payload about to be stored.
    pub new_data: Rc<dyn Any>,
}

/// Payload of [`COMPONENT_REMOVED`]. Raised before the slot empties.
#[derive(Clone)]
pub struct ComponentRemoved {
    /// Key of the component type removed.
    pub component: &'static str,
    /// Entity the component belonged to.
    pub entity: Entity,
    /// Payload that was stored.
    pub data: Rc<dyn Any>,
}

/// Payload of [`COMPONENT_TYPE_REGISTERED`]. Raised for every registration
/// attempt, including ones that then fail the duplicate check.
#[derive(Debug, Clone)]
pub struct ComponentTypeRegistered {
    /// Key of the component type registered.
    pub component: &'static str,
    /// Whether the registration carried the force flag.
    pub forced: bool,
}

/// Raised when a component instance is created.
pub static COMPONENT_CREATED: EventType<ComponentCreated> =
    EventType::new("component_created");

/// Raised when a component instance is updated in place.
pub static COMPONENT_UPDATED: EventType<ComponentUpdated> =
    EventType::new("component_updated");

/// Raised when a component instance is removed.
pub static COMPONENT_REMOVED: EventType<ComponentRemoved> =
    EventType::new("component_removed");

/// Raised when a component type is registered.
pub static COMPONENT_TYPE_REGISTERED: EventType<ComponentTypeRegistered> =
    EventType::new("component_type_registered");

struct RegisteredType {
    payload_type: TypeId,
    payload_type_name: &'static str,
}

struct Pool {
    slots: Vec<Option<Rc<dyn Any>>>,
    free: Vec<usize>,
}

impl Pool {
    fn with_capacity(size: usize) -> Self {
        Self {
            slots: vec![None; size],
            free: (0..size).collect(),
        }
    }
}

/// Owner of the component pools for one scope.
pub struct ComponentStore {
    pool_size: usize,
    parent: Option<Rc<ComponentStore>>,
    events: EventTarget,
    registration_finished: Cell<bool>,
    types: RefCell<HashMap<&'static str, RegisteredType>>,
    pools: RefCell<HashMap<&'static str, Pool>>,
}

impl ComponentStore {
    /// Create a standalone store with the given pool capacity.
    #[must_use]
    pub fn new(pool_size: usize) -> Self {
        Self::linked(pool_size, None, None)
    }

    /// Create a store that delegates missed lookups to `parent` and raises
    /// its events under `parent_events`.
    #[must_use]
    pub fn linked(
        pool_size: usize,
        parent: Option<Rc<ComponentStore>>,
        parent_events: Option<&EventTarget>,
    ) -> Self {
        let events = parent_events.map_or_else(EventTarget::new, EventTarget::with_parent);
        Self {
            pool_size,
            parent,
            events,
            registration_finished: Cell::new(false),
            types: RefCell::new(HashMap::new()),
            pools: RefCell::new(HashMap::new()),
        }
    }

    /// The event target this store raises its lifecycle events on.
    #[must_use]
    pub fn events(&self) -> &EventTarget {
        &self.events
    }

    /// Initial capacity of each pool.
    #[must_use]
    pub const fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Whether a component type is registered on this store (not parents).
    #[must_use]
    pub fn is_registered(&self, key: &str) -> bool {
        self.types.borrow().contains_key(key)
    }

    /// Register a component type.
    ///
    /// Raises [`COMPONENT_TYPE_REGISTERED`] for every attempt. Fails if the
    /// key already exists and `force` is not set; with `force`, the new
    /// descriptor replaces the old one.
    pub fn register_component_type(
        &self,
        descriptor: &dyn ComponentDescriptor,
        force: bool,
    ) -> Result<(), EcsError> {
        let key = descriptor.key();
        if self.registration_finished.get() {
            return Err(EcsError::RegistrationClosed(key));
        }
        self.events.raise(
            &COMPONENT_TYPE_REGISTERED,
            &ComponentTypeRegistered {
                component: key,
                forced: force,
            },
        );
        let mut types = self.types.borrow_mut();
        if types.contains_key(key) && !force {
            return Err(EcsError::DuplicateComponentType(key));
        }
        log::debug!("registered component type `{key}`");
        types.insert(
            key,
            RegisteredType {
                payload_type: descriptor.payload_type(),
                payload_type_name: descriptor.payload_type_name(),
            },
        );
        Ok(())
    }

    /// Close registration and allocate every pool.
    ///
    /// Must be called exactly once, before any instance operation.
    pub fn finish_registration(&self) -> Result<(), EcsError> {
        if self.registration_finished.replace(true) {
            return Err(EcsError::RegistrationAlreadyFinished);
        }
        let types = self.types.borrow();
        let mut pools = self.pools.borrow_mut();
        for &key in types.keys() {
            pools.insert(key, Pool::with_capacity(self.pool_size));
        }
        log::debug!(
            "initialized {} component pools with {} slots each",
            types.len(),
            self.pool_size
        );
        Ok(())
    }

    /// Store a packaged component for `owner`, returning its slot index.
    pub fn create<T: 'static>(
        &self,
        owner: Entity,
        component: ComponentInstance<'_, T>,
    ) -> Result<usize, EcsError> {
        self.create_literal(owner, component.ty, component.data)
    }

    /// Store a payload for `owner`, returning its slot index.
    ///
    /// Pops a free slot, or grows the pool by one when none is free.
    /// Raises [`COMPONENT_CREATED`].
    pub fn create_literal<T: 'static>(
        &self,
        owner: Entity,
        ty: &ComponentType<T>,
        data: T,
    ) -> Result<usize, EcsError> {
        let key = ty.key();
        if !self.registration_finished.get() {
            return Err(EcsError::RegistrationOpen(key));
        }
        self.check_payload_type::<T>(key)?;
        let data: Rc<dyn Any> = Rc::new(data);
        let slot = {
            let mut pools = self.pools.borrow_mut();
            let pool = pools
                .get_mut(key)
                .ok_or(EcsError::UnknownComponentType(key))?;
            let slot = match pool.free.pop() {
                Some(index) => index,
                None => {
                    pool.slots.push(None);
                    pool.slots.len() - 1
                }
            };
            pool.slots[slot] = Some(Rc::clone(&data));
            slot
        };
        self.events.raise(
            &COMPONENT_CREATED,
            &ComponentCreated {
                component: key,
                entity: owner,
                data,
            },
        );
        Ok(slot)
    }

    /// Read the payload at `slot`, retrying against the parent store when
    /// the lookup misses locally.
    pub fn get<T: 'static>(&self, ty: &ComponentType<T>, slot: usize) -> Result<Rc<T>, EcsError> {
        match self.lookup(ty.key(), slot) {
            Ok(data) => data
                .downcast::<T>()
                .map_err(|_| self.payload_mismatch::<T>(ty.key())),
            Err(err) => match &self.parent {
                Some(parent) => parent.get(ty, slot),
                None => Err(err),
            },
        }
    }

    /// Replace the payload at `slot` in place.
    ///
    /// Raises [`COMPONENT_UPDATED`] before mutating, so listeners observe
    /// the previous value. Falls back to the parent store when the lookup
    /// misses locally.
    pub fn update<T: 'static>(
        &self,
        owner: Entity,
        ty: &ComponentType<T>,
        slot: usize,
        data: T,
    ) -> Result<(), EcsError> {
        let key = ty.key();
        match self.lookup(key, slot) {
            Ok(old_data) => {
                self.check_payload_type::<T>(key)?;
                let new_data: Rc<dyn Any> = Rc::new(data);
                self.events.raise(
                    &COMPONENT_UPDATED,
                    &ComponentUpdated {
                        component: key,
                        entity: owner,
                        old_data,
                        new_data: Rc::clone(&new_data),
                    },
                );
                let mut pools = self.pools.borrow_mut();
                if let Some(slot_ref) = pools
                    .get_mut(key)
                    .and_then(|pool| pool.slots.get_mut(slot))
                {
                    if slot_ref.is_some() {
                        *slot_ref = Some(new_data);
                    }
                }
                Ok(())
            }
            Err(err) => match &self.parent {
                Some(parent) => parent.update(owner, ty, slot, data),
                None => Err(err),
            },
        }
    }

    /// Empty the slot and return its index to the free stack.
    ///
    /// Raises [`COMPONENT_REMOVED`] before clearing, so listeners can still
    /// read the payload. Falls back to the parent store when the lookup
    /// misses locally.
    pub fn remove(
        &self,
        owner: Entity,
        descriptor: &dyn ComponentDescriptor,
        slot: usize,
    ) -> Result<(), EcsError> {
        self.remove_by_key(owner, descriptor.key(), slot)
    }

    pub(crate) fn remove_by_key(
        &self,
        owner: Entity,
        key: &'static str,
        slot: usize,
    ) -> Result<(), EcsError> {
        match self.lookup(key, slot) {
            Ok(data) => {
                self.events.raise(
                    &COMPONENT_REMOVED,
                    &ComponentRemoved {
                        component: key,
                        entity: owner,
                        data,
                    },
                );
                let mut pools = self.pools.borrow_mut();
                if let Some(pool) = pools.get_mut(key) {
                    if let Some(slot_ref) = pool.slots.get_mut(slot) {
                        // A listener may have removed it first.
                        if slot_ref.take().is_some() {
                            pool.free.push(slot);
                        }
                    }
                }
                Ok(())
            }
            Err(err) => match &self.parent {
                Some(parent) => parent.remove_by_key(owner, key, slot),
                None => Err(err),
            },
        }
    }

    pub(crate) fn lookup_erased(&self, key: &'static str, slot: usize) -> Option<Rc<dyn Any>> {
        match self.lookup(key, slot) {
            Ok(data) => Some(data),
            Err(_) => self
                .parent
                .as_ref()
                .and_then(|parent| parent.lookup_erased(key, slot)),
        }
    }

    fn lookup(&self, key: &'static str, slot: usize) -> Result<Rc<dyn Any>, EcsError> {
        if !self.registration_finished.get() {
            return Err(EcsError::RegistrationOpen(key));
        }
        let pools = self.pools.borrow();
        let pool = pools
            .get(key)
            .ok_or(EcsError::UnknownComponentType(key))?;
        pool.slots
            .get(slot)
            .and_then(Clone::clone)
            .ok_or(EcsError::EmptySlot {
                component: key,
                slot,
            })
    }

    fn check_payload_type<T: 'static>(&self, key: &'static str) -> Result<(), EcsError> {
        let types = self.types.borrow();
        let registered = types
            .get(key)
            .ok_or(EcsError::UnknownComponentType(key))?;
        if registered.payload_type == TypeId::of::<T>() {
            Ok(())
        } else {
            Err(EcsError::PayloadTypeMismatch {
                component: key,
                stored: registered.payload_type_name,
                requested: std::any::type_name::<T>(),
            })
        }
    }

    fn payload_mismatch<T: 'static>(&self, key: &'static str) -> EcsError {
        let stored = self
            .types
            .borrow()
            .get(key)
            .map_or("unknown", |registered| registered.payload_type_name);
        EcsError::PayloadTypeMismatch {
            component: key,
            stored,
            requested: std::any::type_name::<T>(),
        }
    }
}

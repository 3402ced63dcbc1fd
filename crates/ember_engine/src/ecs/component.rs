//! Component descriptors
//!
//! A descriptor is a keyed, typed tag identifying one kind of component.
//! It carries no runtime data: pools are registered and addressed by the
//! descriptor's key, and the payload type only exists at the API surface.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

/// Typed descriptor for a kind of component.
///
/// Equality is by key. Declare descriptors once as `static`s and pass
/// references around:
///
/// ```
/// use ember_engine::ecs::ComponentType;
///
/// static HEALTH: ComponentType<f32> = ComponentType::new("health");
/// assert_eq!(HEALTH.key(), "health");
/// ```
pub struct ComponentType<T> {
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> ComponentType<T> {
    /// Declare a component type under the given key.
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }

    /// The key this component type registers and dispatches under.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Package a payload with its descriptor, for
    /// [`add_component`](crate::ecs::EntityMut::add_component)-style calls.
    #[must_use]
    pub fn instance(&self, data: T) -> ComponentInstance<'_, T> {
        ComponentInstance { ty: self, data }
    }
}

impl<T> fmt::Debug for ComponentType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentType").field(&self.key).finish()
    }
}

impl<T> PartialEq for ComponentType<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for ComponentType<T> {}

/// A payload paired with the descriptor it belongs to.
pub struct ComponentInstance<'a, T> {
    pub(crate) ty: &'a ComponentType<T>,
    pub(crate) data: T,
}

/// Type-erased view of a [`ComponentType`], usable in heterogeneous lists
/// (registration batches, system signatures).
pub trait ComponentDescriptor {
    /// The descriptor's key.
    fn key(&self) -> &'static str;

    /// `TypeId` of the payload type.
    fn payload_type(&self) -> TypeId;

    /// Human-readable payload type name, for diagnostics.
    fn payload_type_name(&self) -> &'static str;
}

impl<T: 'static> ComponentDescriptor for ComponentType<T> {
    fn key(&self) -> &'static str {
        self.key
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn payload_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

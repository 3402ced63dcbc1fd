//! Built-in component descriptors
//!
//! Small set of descriptors used by the built-in systems. Payloads are
//! plain math/data types; the store accepts any `'static` payload, so
//! games define their own descriptors the same way.

use crate::foundation::math::Vec2;

use super::component::ComponentType;

/// 2D position, in world units.
pub static POSITION_2D: ComponentType<Vec2> = ComponentType::new("position2d");

/// 2D velocity, in world units per second.
pub static VELOCITY_2D: ComponentType<Vec2> = ComponentType::new("velocity2d");

/// Remaining lifetime, in milliseconds. The lifetime system deletes the
/// entity once this reaches zero.
pub static LIFETIME: ComponentType<f32> = ComponentType::new("lifetime");

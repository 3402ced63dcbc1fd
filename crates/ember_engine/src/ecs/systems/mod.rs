//! Built-in systems
//!
//! Reference implementations built on the public `SystemBehavior` surface;
//! gameplay crates are expected to ship their own systems the same way.

pub mod lifetime;
pub mod velocity;

pub use lifetime::LifetimeSystem;
pub use velocity::VelocitySystem;

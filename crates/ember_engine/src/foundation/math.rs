//! Math types for 2D game logic
//!
//! Thin aliases over `nalgebra`; component payloads and gameplay code use
//! these rather than naming the nalgebra generics directly.

pub use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

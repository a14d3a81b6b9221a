//! Core engine types for the orrery demo.
//!
//! This crate provides the foundational types used across the demo:
//! - Frame time management
//! - Data-driven world-transform composition

pub mod time;
pub mod transform;

pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

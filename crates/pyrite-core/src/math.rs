//! Math types, re-exported wholesale from [`glam`].
//!
//! The renderer mostly uses [`Vec2`] for positions, pen advances and
//! bearings, and [`Mat4`] for the orthographic projection.

pub use glam::*;

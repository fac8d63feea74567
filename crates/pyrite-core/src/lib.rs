//! Core utilities shared by the Pyrite crates.
//!
//! This crate carries the foundation the renderer is built on: logging
//! bootstrap, math re-exports, geometry primitives, and the frame clock.

pub mod clock;
pub mod geometry;
pub mod logging;
pub mod math;

pub use clock::Clock;
pub use geometry::{Rect, Size};

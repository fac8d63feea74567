//! Batched 2D rendering for Pyrite.
//!
//! The central type is [`Renderer2D`]: call [`begin`](Renderer2D::begin),
//! issue any number of `draw*` calls, then [`end`](Renderer2D::end). Quads
//! accumulate in a fixed-capacity staging buffer and distinct textures pack
//! into a bounded slot table, so an entire frame usually costs one buffer
//! upload and one indexed draw. When the staging buffer or the slot table
//! runs out mid-frame the renderer flushes transparently and keeps going;
//! paint order always equals call order.
//!
//! ```no_run
//! use pyrite_gpu::WgpuDevice;
//! use pyrite_render::{Color, Rect, Renderer2D};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), pyrite_gpu::GpuError> {
//! let device = Arc::new(WgpuDevice::new()?);
//! let mut renderer = Renderer2D::new(device, 800, 600)?;
//!
//! renderer.begin();
//! renderer.draw_quad(Rect::new(10.0, 10.0, 64.0, 64.0), Color::RED);
//! renderer.end();
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod color;
pub mod text;
pub mod texture;
pub mod vertex;

pub use batch::{BatchConfig, BatchStats, Renderer2D};
pub use color::Color;
pub use pyrite_core::geometry::Rect;
pub use text::{Glyph, GlyphRun, PlacedGlyph, TextureFont};
pub use texture::Texture2D;
pub use vertex::Vertex;

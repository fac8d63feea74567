//! Pyrite: a batched 2D rendering engine.
//!
//! This facade re-exports the workspace crates:
//!
//! - [`core`] — logging bootstrap, math, geometry, the frame [`Clock`].
//! - [`gpu`] — the [`RenderDevice`] abstraction and its `wgpu` backend.
//! - [`render`] — the batching [`Renderer2D`], textures, fonts.

pub use pyrite_core as core;
pub use pyrite_gpu as gpu;
pub use pyrite_render as render;

pub use pyrite_core::{Clock, Rect, Size};
pub use pyrite_gpu::{GpuError, RenderDevice, WgpuDevice};
pub use pyrite_render::{
    BatchConfig, BatchStats, Color, Renderer2D, Texture2D, TextureFont, Vertex,
};

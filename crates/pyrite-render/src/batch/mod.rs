//! The batching 2D renderer.
//!
//! Geometry accumulates in a CPU staging buffer between `begin()` and
//! `end()`. A flush uploads the staged vertices, binds the batch's textures
//! and issues one indexed draw; it happens automatically when the staging
//! buffer or the texture slot table fills, and once more at `end()` for the
//! remainder. The static index pattern (two triangles per quad) is uploaded
//! to the GPU exactly once at construction and never touched again.

mod slots;

use std::borrow::Cow;
use std::sync::Arc;

use glam::{Mat4, Vec2};
use tracing::trace;

use pyrite_core::geometry::Rect;
use pyrite_gpu::{
    BufferDescriptor, BufferUsage, GpuBuffer, GpuError, GpuShader, GpuTexture, RenderDevice,
    ShaderDescriptor, ShaderSource,
};

use crate::color::Color;
use crate::text::{self, TextureFont};
use crate::texture::Texture2D;
use crate::vertex::Vertex;

pub use slots::SlotTable;

const BATCH_SHADER: &str = include_str!("../shaders/batch.wgsl");

/// Batch capacities. Larger values mean fewer flushes per frame at the cost
/// of staging memory and shader-side sampler array size.
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Quads the staging buffer holds before an automatic flush.
    pub max_quads: usize,
    /// Distinct textures per batch. The wgpu backend's binding array is
    /// sized for 32; do not exceed that there.
    pub max_texture_slots: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_quads: 1024,
            max_texture_slots: 32,
        }
    }
}

impl BatchConfig {
    fn max_vertices(&self) -> usize {
        self.max_quads * 4
    }
}

/// Per-frame counters, reset at [`begin`](Renderer2D::begin).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Quads submitted, including those dropped as degenerate.
    pub quads: u32,
    /// Flushes performed, implicit and final.
    pub flushes: u32,
    /// Indexed draw submissions issued. Equal to `flushes`.
    pub draw_calls: u32,
    /// Texture-unit binds across all flushes.
    pub texture_binds: u32,
}

/// Batched 2D quad and text renderer.
///
/// Owns its vertex/index buffers, shader and white fallback texture; caller
/// textures are borrowed per draw call and referenced only for the duration
/// of the batch they appear in.
///
/// Not internally synchronized: one instance belongs to one thread.
pub struct Renderer2D {
    device: Arc<dyn RenderDevice>,
    vertex_buffer: GpuBuffer,
    index_buffer: GpuBuffer,
    shader: GpuShader,
    white: Texture2D,
    vertices: Vec<Vertex>,
    slots: SlotTable,
    projection: Mat4,
    config: BatchConfig,
    recording: bool,
    stats: BatchStats,
}

impl Renderer2D {
    /// Create a renderer targeting a `width` x `height` viewport with
    /// default capacities.
    pub fn new(device: Arc<dyn RenderDevice>, width: u32, height: u32) -> Result<Self, GpuError> {
        Self::with_config(device, width, height, BatchConfig::default())
    }

    /// Create a renderer with explicit batch capacities.
    ///
    /// # Panics
    /// Panics if `max_quads` or `max_texture_slots` is zero.
    pub fn with_config(
        device: Arc<dyn RenderDevice>,
        width: u32,
        height: u32,
        config: BatchConfig,
    ) -> Result<Self, GpuError> {
        assert!(config.max_quads > 0, "max_quads must be at least 1");
        assert!(
            config.max_texture_slots > 0,
            "max_texture_slots must be at least 1"
        );

        let vertex_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("batch_vertices"),
            size: (config.max_vertices() * std::mem::size_of::<Vertex>()) as u64,
            usage: BufferUsage::Vertex,
        })?;

        // Static index pattern: quad q occupies indices
        // [4q, 4q+1, 4q+2, 4q+2, 4q+3, 4q]. Uploaded once, reused forever.
        let mut indices = Vec::with_capacity(config.max_quads * 6);
        for quad in 0..config.max_quads as u32 {
            let base = quad * 4;
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        let index_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("batch_indices"),
            size: (indices.len() * std::mem::size_of::<u32>()) as u64,
            usage: BufferUsage::Index,
        })?;
        device.write_buffer(&index_buffer, 0, bytemuck::cast_slice(&indices));

        let shader = device.create_shader(&ShaderDescriptor {
            label: Some("batch_shader"),
            source: ShaderSource::String(Cow::Borrowed(BATCH_SHADER)),
        })?;

        let white = Texture2D::white(device.as_ref())?;

        // Point the sampler array at units 0..N once up front.
        let units: Vec<i32> = (0..config.max_texture_slots as i32).collect();
        device.bind_shader(&shader);
        device.set_uniform_int_array("u_textures", &units);
        device.unbind_shader();

        Ok(Self {
            vertex_buffer,
            index_buffer,
            shader,
            white,
            vertices: Vec::with_capacity(config.max_vertices()),
            slots: SlotTable::new(config.max_texture_slots),
            projection: Self::projection_for(width, height),
            config,
            recording: false,
            stats: BatchStats::default(),
            device,
        })
    }

    /// Pixel-space orthographic projection: origin top-left, y down.
    fn projection_for(width: u32, height: u32) -> Mat4 {
        Mat4::orthographic_rh(0.0, width as f32, height as f32, 0.0, -1.0, 1.0)
    }

    /// Start a frame's batch. Resets the staging buffer, slot table and
    /// stats.
    ///
    /// # Panics
    /// Panics if called again before [`end`](Self::end).
    pub fn begin(&mut self) {
        assert!(!self.recording, "begin() called again without end()");
        self.recording = true;
        self.vertices.clear();
        self.slots.reset();
        self.stats = BatchStats::default();
    }

    /// Draw the whole of `texture` into `bounds`, untinted.
    pub fn draw(&mut self, bounds: Rect<f32>, texture: &Texture2D) {
        self.draw_tinted(bounds, texture.full_source(), Color::WHITE, texture);
    }

    /// Draw the `source` pixel region of `texture` into `bounds`, untinted.
    pub fn draw_region(&mut self, bounds: Rect<f32>, source: Rect<f32>, texture: &Texture2D) {
        self.draw_tinted(bounds, source, Color::WHITE, texture);
    }

    /// Draw the `source` pixel region of `texture` into `bounds`, modulated
    /// by `tint`.
    pub fn draw_tinted(
        &mut self,
        bounds: Rect<f32>,
        source: Rect<f32>,
        tint: Color,
        texture: &Texture2D,
    ) {
        let gpu = texture.gpu().clone();
        self.submit_quad(bounds, source, tint, &gpu, texture.width(), texture.height());
    }

    /// Draw a flat-colored quad. Samples the renderer's white texture, which
    /// occupies a slot like any caller texture.
    pub fn draw_quad(&mut self, bounds: Rect<f32>, color: Color) {
        let white = self.white.gpu().clone();
        let source = self.white.full_source();
        let (w, h) = (self.white.width(), self.white.height());
        self.submit_quad(bounds, source, color, &white, w, h);
    }

    /// Draw `text` starting at `position`, returning the final pen position.
    ///
    /// Layout policy lives in [`text::layout`]: `'\n'` starts a new line,
    /// absent glyphs advance by the font's fallback width, and every advance
    /// scales with `scale`.
    pub fn draw_string(
        &mut self,
        text: &str,
        position: Vec2,
        color: Color,
        font: &TextureFont,
        scale: f32,
    ) -> Vec2 {
        let run = text::layout(text, position, font, scale);
        for glyph in &run.glyphs {
            self.draw_tinted(glyph.dest, glyph.source, color, font.atlas());
        }
        run.pen
    }

    fn submit_quad(
        &mut self,
        bounds: Rect<f32>,
        source: Rect<f32>,
        tint: Color,
        texture: &GpuTexture,
        texture_width: u32,
        texture_height: u32,
    ) {
        assert!(self.recording, "draw call outside begin()/end()");
        self.stats.quads += 1;

        if bounds.is_degenerate() {
            trace!(?bounds, "skipping degenerate quad");
            return;
        }

        if self.vertices.len() + 4 > self.config.max_vertices() {
            self.flush();
        }
        let slot = match self.slots.resolve(texture) {
            Some(slot) => slot,
            None => {
                self.flush();
                match self.slots.resolve(texture) {
                    Some(slot) => slot,
                    None => unreachable!("slot table has free slots after a flush"),
                }
            }
        };

        let (u0, v0, u1, v1) = (
            source.x / texture_width as f32,
            source.y / texture_height as f32,
            source.right() / texture_width as f32,
            source.bottom() / texture_height as f32,
        );
        let color = tint.to_array();

        // Top-left, top-right, bottom-right, bottom-left; the index pattern
        // triangulates as (0,1,2) and (2,3,0).
        self.vertices.push(Vertex {
            position: [bounds.x, bounds.y],
            uv: [u0, v0],
            color,
            slot,
        });
        self.vertices.push(Vertex {
            position: [bounds.right(), bounds.y],
            uv: [u1, v0],
            color,
            slot,
        });
        self.vertices.push(Vertex {
            position: [bounds.right(), bounds.bottom()],
            uv: [u1, v1],
            color,
            slot,
        });
        self.vertices.push(Vertex {
            position: [bounds.x, bounds.bottom()],
            uv: [u0, v1],
            color,
            slot,
        });
    }

    /// Upload and submit everything staged since the last flush.
    fn flush(&mut self) {
        if self.vertices.is_empty() {
            return;
        }

        for (unit, texture) in self.slots.bound().iter().enumerate() {
            self.device.bind_texture_unit(unit as u32, texture);
            self.stats.texture_binds += 1;
        }

        self.device
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));

        self.device.bind_shader(&self.shader);
        self.device
            .set_uniform_mat4("u_projection", &self.projection.to_cols_array_2d());

        let index_count = (self.vertices.len() / 4 * 6) as u32;
        self.device
            .draw_indexed(&self.vertex_buffer, &self.index_buffer, index_count);

        trace!(
            vertices = self.vertices.len(),
            index_count,
            textures = self.slots.bound().len(),
            "flushed batch"
        );

        self.vertices.clear();
        self.slots.reset();
        self.stats.flushes += 1;
        self.stats.draw_calls += 1;
    }

    /// Finish the frame's batch, flushing any staged geometry.
    ///
    /// # Panics
    /// Panics if no batch is open.
    pub fn end(&mut self) {
        assert!(self.recording, "end() called without begin()");
        self.flush();
        self.recording = false;
    }

    /// Recompute the projection for a new viewport size. Takes effect at the
    /// next flush; geometry already flushed keeps the old projection.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection = Self::projection_for(width, height);
    }

    /// Counters for the current frame (or the last one, after `end`).
    pub fn stats(&self) -> BatchStats {
        self.stats
    }
}

//! The [`RenderDevice`] trait and its descriptor types.
//!
//! Descriptors are this crate's own types rather than `wgpu` ones, so
//! callers (and the mock device) never depend on backend details.

use std::borrow::Cow;
use std::path::PathBuf;

use crate::error::GpuError;
use crate::handles::{GpuBuffer, GpuShader, GpuTexture};

/// What a buffer is used for. Determines GPU-side usage flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Per-vertex data, re-uploaded every flush.
    Vertex,
    /// Index data, uploaded once at initialisation.
    Index,
    /// Shader uniform data.
    Uniform,
}

#[derive(Debug, Clone, Copy)]
pub struct BufferDescriptor<'a> {
    pub label: Option<&'a str>,
    pub size: u64,
    pub usage: BufferUsage,
}

/// Pixel formats the renderer uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA, sRGB. 4 bytes per pixel.
    Rgba8,
    /// Single 8-bit channel, e.g. a font atlas coverage mask.
    R8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::R8 => 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextureDescriptor<'a> {
    pub label: Option<&'a str>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Where shader source comes from.
pub enum ShaderSource {
    File(PathBuf),
    String(Cow<'static, str>),
}

pub struct ShaderDescriptor<'a> {
    pub label: Option<&'a str>,
    pub source: ShaderSource,
}

/// Narrow contract the batching renderer holds against the GPU layer.
///
/// Methods take `&self` and return owned handles; backends use interior
/// mutability for any state they need (bound shader, bound texture units).
///
/// Creation methods are the only fallible operations. Frame operations
/// (`write_buffer`, binds, `draw_indexed`) are fire-and-forget from the
/// caller's perspective; backends report runtime faults through their own
/// error channels rather than return values.
///
/// Uniform setters apply to the currently bound shader. Calling one with no
/// shader bound is a logged no-op, mirroring the "must bind first" rule of
/// the underlying APIs.
pub trait RenderDevice: Send + Sync {
    /// Create a GPU buffer. Vertex buffers support repeated sub-range
    /// writes without reallocation; index buffers are written once.
    fn create_buffer(&self, desc: &BufferDescriptor<'_>) -> Result<GpuBuffer, GpuError>;

    /// Write `data` into `buffer` starting at `offset` bytes.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]);

    /// Create a texture and upload its pixels. The returned handle carries
    /// a stable `u64` identity usable for equality comparison.
    fn create_texture(
        &self,
        desc: &TextureDescriptor<'_>,
        pixels: &[u8],
    ) -> Result<GpuTexture, GpuError>;

    /// Create a shader program. Failures distinguish unreadable source
    /// ([`GpuError::Io`]), compile errors ([`GpuError::ShaderCompile`]) and
    /// link errors ([`GpuError::PipelineLink`]).
    fn create_shader(&self, desc: &ShaderDescriptor<'_>) -> Result<GpuShader, GpuError>;

    /// Make `shader` current for subsequent uniform sets and draws.
    fn bind_shader(&self, shader: &GpuShader);

    /// Clear the current shader binding.
    fn unbind_shader(&self);

    /// Set a named 4x4 matrix uniform on the bound shader.
    fn set_uniform_mat4(&self, name: &str, value: &[[f32; 4]; 4]);

    /// Set a named integer-array uniform on the bound shader.
    fn set_uniform_int_array(&self, name: &str, values: &[i32]);

    /// Bind `texture` to the given texture unit. The batching renderer
    /// keeps slot index and unit index identical.
    fn bind_texture_unit(&self, unit: u32, texture: &GpuTexture);

    /// Issue one indexed draw submission over the first `index_count`
    /// entries of `indices`, sourcing vertices from `vertices`.
    fn draw_indexed(&self, vertices: &GpuBuffer, indices: &GpuBuffer, index_count: u32);
}

//! Owned, clonable handles to GPU resources.
//!
//! Handles carry either real `wgpu` objects or mock bookkeeping (behind the
//! `mock` feature), so the [`RenderDevice`](crate::RenderDevice) trait can
//! return them by value from `&self` methods and stay object-safe.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic id source shared by every backend, so textures and shaders
/// created by different devices never collide.
static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_resource_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a GPU buffer.
#[derive(Debug, Clone)]
pub struct GpuBuffer {
    pub(crate) id: u64,
    pub(crate) size: u64,
    pub(crate) inner: BufferInner,
}

#[derive(Debug, Clone)]
pub(crate) enum BufferInner {
    Real(wgpu::Buffer),
    #[cfg(feature = "mock")]
    Mock,
}

impl GpuBuffer {
    /// Stable identity of this buffer, unique within the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Allocated size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub(crate) fn raw(&self) -> Option<&wgpu::Buffer> {
        match &self.inner {
            BufferInner::Real(buffer) => Some(buffer),
            #[cfg(feature = "mock")]
            BufferInner::Mock => None,
        }
    }
}

/// Handle to a GPU texture.
///
/// The `id` is the identity the batcher's slot table compares: two handles
/// with equal ids refer to the same texture, cloned handles included.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    pub(crate) id: u64,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) inner: TextureInner,
}

#[derive(Debug, Clone)]
pub(crate) enum TextureInner {
    Real {
        #[allow(dead_code)]
        texture: Arc<wgpu::Texture>,
        view: Arc<wgpu::TextureView>,
    },
    #[cfg(feature = "mock")]
    Mock,
}

impl GpuTexture {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn view(&self) -> Option<&Arc<wgpu::TextureView>> {
        match &self.inner {
            TextureInner::Real { view, .. } => Some(view),
            #[cfg(feature = "mock")]
            TextureInner::Mock => None,
        }
    }
}

impl PartialEq for GpuTexture {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GpuTexture {}

/// Handle to a compiled shader program.
#[derive(Debug, Clone)]
pub struct GpuShader {
    pub(crate) id: u64,
    pub(crate) inner: ShaderInner,
}

#[derive(Debug, Clone)]
pub(crate) enum ShaderInner {
    Real(Arc<crate::wgpu_backend::ShaderData>),
    #[cfg(feature = "mock")]
    Mock,
}

impl GpuShader {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn data(&self) -> Option<&Arc<crate::wgpu_backend::ShaderData>> {
        match &self.inner {
            ShaderInner::Real(data) => Some(data),
            #[cfg(feature = "mock")]
            ShaderInner::Mock => None,
        }
    }
}

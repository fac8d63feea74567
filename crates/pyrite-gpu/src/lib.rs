//! Graphics API abstraction for the Pyrite renderer.
//!
//! The batching renderer never talks to a graphics API directly. It goes
//! through [`RenderDevice`], a narrow, object-safe trait covering exactly
//! what sprite batching needs: buffer creation and sub-range upload, texture
//! creation with a stable identity, shader creation with named uniform
//! setters, texture-unit binding, and indexed draw submission.
//!
//! Two implementations ship with the crate:
//!
//! - [`WgpuDevice`] — the real backend over `wgpu`.
//! - `MockDevice` (feature `mock`) — records every call for test assertions
//!   without touching a GPU.
//!
//! # Design
//!
//! All trait methods take `&self` and return owned handle types
//! ([`GpuBuffer`], [`GpuTexture`], [`GpuShader`]). Handles are cheap to
//! clone and carry no lifetimes, so the trait stays object-safe and mock
//! implementations can use interior mutability to record calls.

pub mod device;
pub mod error;
pub mod handles;
#[cfg(feature = "mock")]
pub mod mock;
pub mod wgpu_backend;

pub use device::{
    BufferDescriptor, BufferUsage, RenderDevice, ShaderDescriptor, ShaderSource,
    TextureDescriptor, TextureFormat,
};
pub use error::GpuError;
pub use handles::{GpuBuffer, GpuShader, GpuTexture};
#[cfg(feature = "mock")]
pub use mock::{DeviceCall, MockDevice};
pub use wgpu_backend::WgpuDevice;

//! A recording [`RenderDevice`] for tests.
//!
//! Every trait call is appended to an in-memory log as a [`DeviceCall`], so
//! tests can assert on exactly what a renderer asked the GPU layer to do:
//! how many draws were issued, what bytes were uploaded, which textures were
//! bound to which units. No GPU is involved.

use parking_lot::Mutex;

use crate::device::{
    BufferDescriptor, BufferUsage, RenderDevice, ShaderDescriptor, ShaderSource,
    TextureDescriptor, TextureFormat,
};
use crate::error::GpuError;
use crate::handles::{
    BufferInner, GpuBuffer, GpuShader, GpuTexture, ShaderInner, TextureInner, next_resource_id,
};

/// One recorded [`RenderDevice`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateBuffer {
        id: u64,
        size: u64,
        usage: BufferUsage,
    },
    WriteBuffer {
        buffer: u64,
        offset: u64,
        data: Vec<u8>,
    },
    CreateTexture {
        id: u64,
        width: u32,
        height: u32,
        format: TextureFormat,
    },
    CreateShader {
        id: u64,
        label: Option<String>,
    },
    BindShader {
        id: u64,
    },
    UnbindShader,
    SetUniformMat4 {
        name: String,
        value: [[f32; 4]; 4],
    },
    SetUniformIntArray {
        name: String,
        values: Vec<i32>,
    },
    BindTextureUnit {
        unit: u32,
        texture: u64,
    },
    DrawIndexed {
        index_count: u32,
    },
}

/// Records every call for later inspection.
#[derive(Default)]
pub struct MockDevice {
    calls: Mutex<Vec<DeviceCall>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: DeviceCall) {
        self.calls.lock().push(call);
    }

    /// Snapshot of every call recorded so far, in order.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().clone()
    }

    /// Forget everything recorded so far. Useful to scope assertions to a
    /// single frame after setup.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, DeviceCall::DrawIndexed { .. }))
            .count()
    }

    /// Index counts of every draw, in submission order.
    pub fn draw_index_counts(&self) -> Vec<u32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::DrawIndexed { index_count } => Some(*index_count),
                _ => None,
            })
            .collect()
    }

    /// Bytes of every write targeting `buffer`, in submission order.
    pub fn writes_to(&self, buffer: u64) -> Vec<Vec<u8>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::WriteBuffer { buffer: b, data, .. } if *b == buffer => {
                    Some(data.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Values of every `set_uniform_mat4` for `name`, in order.
    pub fn mat4_values(&self, name: &str) -> Vec<[[f32; 4]; 4]> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::SetUniformMat4 { name: n, value } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Every `(unit, texture_id)` bind, in order.
    pub fn texture_binds(&self) -> Vec<(u32, u64)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::BindTextureUnit { unit, texture } => Some((*unit, *texture)),
                _ => None,
            })
            .collect()
    }
}

impl RenderDevice for MockDevice {
    fn create_buffer(&self, desc: &BufferDescriptor<'_>) -> Result<GpuBuffer, GpuError> {
        let id = next_resource_id();
        self.record(DeviceCall::CreateBuffer {
            id,
            size: desc.size,
            usage: desc.usage,
        });
        Ok(GpuBuffer {
            id,
            size: desc.size,
            inner: BufferInner::Mock,
        })
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        self.record(DeviceCall::WriteBuffer {
            buffer: buffer.id(),
            offset,
            data: data.to_vec(),
        });
    }

    fn create_texture(
        &self,
        desc: &TextureDescriptor<'_>,
        _pixels: &[u8],
    ) -> Result<GpuTexture, GpuError> {
        let id = next_resource_id();
        self.record(DeviceCall::CreateTexture {
            id,
            width: desc.width,
            height: desc.height,
            format: desc.format,
        });
        Ok(GpuTexture {
            id,
            width: desc.width,
            height: desc.height,
            inner: TextureInner::Mock,
        })
    }

    fn create_shader(&self, desc: &ShaderDescriptor<'_>) -> Result<GpuShader, GpuError> {
        // File sources go through the filesystem even here, so the
        // unreadable-source path is exercised without a GPU.
        if let ShaderSource::File(path) = &desc.source {
            std::fs::read_to_string(path).map_err(|e| GpuError::Io {
                path: path.clone(),
                source: e,
            })?;
        }
        let id = next_resource_id();
        self.record(DeviceCall::CreateShader {
            id,
            label: desc.label.map(str::to_owned),
        });
        Ok(GpuShader {
            id,
            inner: ShaderInner::Mock,
        })
    }

    fn bind_shader(&self, shader: &GpuShader) {
        self.record(DeviceCall::BindShader { id: shader.id() });
    }

    fn unbind_shader(&self) {
        self.record(DeviceCall::UnbindShader);
    }

    fn set_uniform_mat4(&self, name: &str, value: &[[f32; 4]; 4]) {
        self.record(DeviceCall::SetUniformMat4 {
            name: name.to_owned(),
            value: *value,
        });
    }

    fn set_uniform_int_array(&self, name: &str, values: &[i32]) {
        self.record(DeviceCall::SetUniformIntArray {
            name: name.to_owned(),
            values: values.to_vec(),
        });
    }

    fn bind_texture_unit(&self, unit: u32, texture: &GpuTexture) {
        self.record(DeviceCall::BindTextureUnit {
            unit,
            texture: texture.id(),
        });
    }

    fn draw_indexed(&self, _vertices: &GpuBuffer, _indices: &GpuBuffer, index_count: u32) {
        self.record(DeviceCall::DrawIndexed { index_count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_in_order() {
        let device = MockDevice::new();
        let buffer = device
            .create_buffer(&BufferDescriptor {
                label: Some("test"),
                size: 64,
                usage: BufferUsage::Vertex,
            })
            .unwrap();
        device.write_buffer(&buffer, 0, &[1, 2, 3]);
        device.draw_indexed(&buffer, &buffer, 6);

        let calls = device.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], DeviceCall::CreateBuffer { size: 64, .. }));
        assert_eq!(
            calls[1],
            DeviceCall::WriteBuffer {
                buffer: buffer.id(),
                offset: 0,
                data: vec![1, 2, 3],
            }
        );
        assert_eq!(calls[2], DeviceCall::DrawIndexed { index_count: 6 });
    }

    #[test]
    fn missing_shader_file_is_an_io_error() {
        let device = MockDevice::new();
        let result = device.create_shader(&ShaderDescriptor {
            label: None,
            source: ShaderSource::File("/nonexistent/batch.wgsl".into()),
        });
        assert!(matches!(result, Err(GpuError::Io { .. })));
    }

    #[test]
    fn writes_to_filters_by_buffer() {
        let device = MockDevice::new();
        let a = device
            .create_buffer(&BufferDescriptor {
                label: None,
                size: 16,
                usage: BufferUsage::Vertex,
            })
            .unwrap();
        let b = device
            .create_buffer(&BufferDescriptor {
                label: None,
                size: 16,
                usage: BufferUsage::Index,
            })
            .unwrap();
        device.write_buffer(&a, 0, &[1]);
        device.write_buffer(&b, 0, &[2]);
        device.write_buffer(&a, 4, &[3]);

        assert_eq!(device.writes_to(a.id()), vec![vec![1], vec![3]]);
        assert_eq!(device.writes_to(b.id()), vec![vec![2]]);
    }
}

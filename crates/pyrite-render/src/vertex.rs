use bytemuck::{Pod, Zeroable};

/// One batched vertex as uploaded to the GPU.
///
/// `slot` is a per-batch texture slot index, not a texture identity: the
/// same texture can land in different slots in different batches. 36 bytes,
/// `#[repr(C)]`, no padding, so a `&[Vertex]` casts straight to upload
/// bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    pub slot: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_stable() {
        assert_eq!(std::mem::size_of::<Vertex>(), 36);
        assert_eq!(std::mem::align_of::<Vertex>(), 4);
    }

    #[test]
    fn vertices_cast_to_bytes() {
        let vertices = [Vertex {
            position: [1.0, 2.0],
            uv: [0.0, 1.0],
            color: [1.0, 1.0, 1.0, 1.0],
            slot: 3,
        }];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 36);
    }
}

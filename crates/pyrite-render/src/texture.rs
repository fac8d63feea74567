use pyrite_core::geometry::Rect;
use pyrite_gpu::{GpuError, GpuTexture, RenderDevice, TextureDescriptor, TextureFormat};

/// A 2D texture plus the dimensions the renderer needs for UV math.
///
/// The renderer borrows textures per draw call and keeps only their `u64`
/// identity in its slot table; the caller owns the texture for as long as it
/// is drawn with.
#[derive(Debug, Clone)]
pub struct Texture2D {
    gpu: GpuTexture,
    width: u32,
    height: u32,
}

impl Texture2D {
    /// Upload RGBA8 pixels (`width * height * 4` bytes).
    pub fn from_pixels(
        device: &dyn RenderDevice,
        label: Option<&str>,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self, GpuError> {
        let gpu = device.create_texture(
            &TextureDescriptor {
                label,
                width,
                height,
                format: TextureFormat::Rgba8,
            },
            pixels,
        )?;
        Ok(Self { gpu, width, height })
    }

    /// Upload a single-channel coverage mask (`width * height` bytes),
    /// e.g. a font atlas.
    pub fn from_coverage(
        device: &dyn RenderDevice,
        label: Option<&str>,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self, GpuError> {
        let gpu = device.create_texture(
            &TextureDescriptor {
                label,
                width,
                height,
                format: TextureFormat::R8,
            },
            pixels,
        )?;
        Ok(Self { gpu, width, height })
    }

    /// A 1x1 opaque white texture. Flat-colored quads sample this so every
    /// quad goes down the same textured path.
    pub fn white(device: &dyn RenderDevice) -> Result<Self, GpuError> {
        Self::from_pixels(device, Some("white_texture"), 1, 1, &[255, 255, 255, 255])
    }

    /// Stable identity, usable for equality across cloned handles.
    pub fn id(&self) -> u64 {
        self.gpu.id()
    }

    pub fn gpu(&self) -> &GpuTexture {
        &self.gpu
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Source rectangle covering the whole texture, in pixels.
    pub fn full_source(&self) -> Rect<f32> {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_gpu::MockDevice;

    #[test]
    fn cloned_handles_share_identity() {
        let device = MockDevice::new();
        let texture = Texture2D::from_pixels(&device, None, 2, 2, &[0; 16]).unwrap();
        assert_eq!(texture.clone().id(), texture.id());
    }

    #[test]
    fn full_source_covers_pixel_extent() {
        let device = MockDevice::new();
        let texture = Texture2D::from_pixels(&device, None, 8, 4, &[0; 128]).unwrap();
        let source = texture.full_source();
        assert_eq!(source.width, 8.0);
        assert_eq!(source.height, 4.0);
    }
}

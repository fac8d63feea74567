use ahash::HashMap;
use pyrite_gpu::GpuTexture;

/// Per-batch mapping from texture identity to slot index.
///
/// Slots are handed out in first-use order and deduplicated by identity, so
/// drawing with the same texture repeatedly costs one slot. The table never
/// owns textures beyond the current batch: [`reset`](SlotTable::reset) drops
/// every handle at flush. No slot is reserved; the renderer's white texture
/// competes for slots like any other.
pub struct SlotTable {
    capacity: usize,
    bound: Vec<GpuTexture>,
    lookup: HashMap<u64, u32>,
}

impl SlotTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            bound: Vec::with_capacity(capacity),
            lookup: HashMap::default(),
        }
    }

    /// Slot index for `texture`, assigning the next free slot on first use.
    /// `None` means the table is full and the batch must flush.
    pub fn resolve(&mut self, texture: &GpuTexture) -> Option<u32> {
        if let Some(&slot) = self.lookup.get(&texture.id()) {
            return Some(slot);
        }
        if self.bound.len() == self.capacity {
            return None;
        }
        let slot = self.bound.len() as u32;
        self.bound.push(texture.clone());
        self.lookup.insert(texture.id(), slot);
        Some(slot)
    }

    /// Textures bound this batch, indexed by slot.
    pub fn bound(&self) -> &[GpuTexture] {
        &self.bound
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Drop all assignments, ready for the next batch.
    pub fn reset(&mut self) {
        self.bound.clear();
        self.lookup.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_gpu::{MockDevice, RenderDevice, TextureDescriptor, TextureFormat};

    fn make_texture(device: &MockDevice) -> GpuTexture {
        device
            .create_texture(
                &TextureDescriptor {
                    label: None,
                    width: 1,
                    height: 1,
                    format: TextureFormat::Rgba8,
                },
                &[0, 0, 0, 0],
            )
            .unwrap()
    }

    #[test]
    fn same_identity_reuses_slot() {
        let device = MockDevice::new();
        let texture = make_texture(&device);
        let mut table = SlotTable::new(4);

        assert_eq!(table.resolve(&texture), Some(0));
        assert_eq!(table.resolve(&texture.clone()), Some(0));
        assert_eq!(table.bound().len(), 1);
    }

    #[test]
    fn slots_assigned_in_first_use_order() {
        let device = MockDevice::new();
        let a = make_texture(&device);
        let b = make_texture(&device);
        let mut table = SlotTable::new(4);

        assert_eq!(table.resolve(&a), Some(0));
        assert_eq!(table.resolve(&b), Some(1));
        assert_eq!(table.resolve(&a), Some(0));
    }

    #[test]
    fn full_table_signals_flush() {
        let device = MockDevice::new();
        let a = make_texture(&device);
        let b = make_texture(&device);
        let c = make_texture(&device);
        let mut table = SlotTable::new(2);

        assert_eq!(table.resolve(&a), Some(0));
        assert_eq!(table.resolve(&b), Some(1));
        assert_eq!(table.resolve(&c), None);
        // Already-assigned identities still resolve while full.
        assert_eq!(table.resolve(&a), Some(0));

        table.reset();
        assert_eq!(table.resolve(&c), Some(0));
    }
}

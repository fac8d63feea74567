//! Renderer2D batching behavior, verified against the recording device.

use std::sync::Arc;

use glam::Mat4;
use pyrite_gpu::{BufferUsage, DeviceCall, MockDevice};
use pyrite_render::{BatchConfig, Color, Rect, Renderer2D, Texture2D, Vertex};

fn renderer_with(
    config: BatchConfig,
) -> (Arc<MockDevice>, Renderer2D) {
    let device = Arc::new(MockDevice::new());
    let renderer = Renderer2D::with_config(device.clone(), 800, 600, config).unwrap();
    (device, renderer)
}

fn default_renderer() -> (Arc<MockDevice>, Renderer2D) {
    renderer_with(BatchConfig::default())
}

/// Ids of the renderer's vertex and index buffers, from the creation log.
fn buffer_ids(device: &MockDevice) -> (u64, u64) {
    let mut vertex = None;
    let mut index = None;
    for call in device.calls() {
        if let DeviceCall::CreateBuffer { id, usage, .. } = call {
            match usage {
                BufferUsage::Vertex => vertex = Some(id),
                BufferUsage::Index => index = Some(id),
                BufferUsage::Uniform => {}
            }
        }
    }
    (vertex.unwrap(), index.unwrap())
}

fn decode_vertices(writes: &[Vec<u8>]) -> Vec<Vertex> {
    writes
        .iter()
        .flat_map(|bytes| bytemuck::pod_collect_to_vec::<u8, Vertex>(bytes))
        .collect()
}

#[test]
fn index_pattern_uploaded_once_at_construction() {
    let (device, mut renderer) = renderer_with(BatchConfig {
        max_quads: 8,
        max_texture_slots: 32,
    });
    let (_, index_id) = buffer_ids(&device);

    let writes = device.writes_to(index_id);
    assert_eq!(writes.len(), 1);

    let indices: Vec<u32> = bytemuck::pod_collect_to_vec(&writes[0]);
    assert_eq!(indices.len(), 8 * 6);
    assert_eq!(&indices[..12], &[0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);

    // Frames never re-upload it.
    renderer.begin();
    renderer.draw_quad(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
    renderer.end();
    assert_eq!(device.writes_to(index_id).len(), 1);
}

#[test]
fn empty_frame_issues_no_gpu_work() {
    let (device, mut renderer) = default_renderer();
    device.clear_calls();

    renderer.begin();
    renderer.end();

    assert_eq!(device.draw_count(), 0);
    assert!(
        device
            .calls()
            .iter()
            .all(|c| !matches!(c, DeviceCall::WriteBuffer { .. }))
    );
}

#[test]
fn one_frame_one_flush_in_call_order() {
    let (device, mut renderer) = default_renderer();
    let (vertex_id, _) = buffer_ids(&device);
    let colors = [Color::RED, Color::GREEN, Color::BLUE];

    renderer.begin();
    for (i, color) in colors.iter().enumerate() {
        renderer.draw_quad(Rect::new(i as f32 * 10.0, 0.0, 10.0, 10.0), *color);
    }
    renderer.end();

    assert_eq!(device.draw_count(), 1);
    assert_eq!(device.draw_index_counts(), vec![18]);

    let vertices = decode_vertices(&device.writes_to(vertex_id));
    assert_eq!(vertices.len(), 12);
    for (i, color) in colors.iter().enumerate() {
        let quad = &vertices[i * 4..i * 4 + 4];
        // Top-left corner carries the draw position; order equals call order.
        assert_eq!(quad[0].position, [i as f32 * 10.0, 0.0]);
        assert!(quad.iter().all(|v| v.color == color.to_array()));
    }
}

#[test]
fn quad_corners_wind_clockwise_from_top_left() {
    let (device, mut renderer) = default_renderer();
    let (vertex_id, _) = buffer_ids(&device);

    renderer.begin();
    renderer.draw_quad(Rect::new(5.0, 10.0, 20.0, 30.0), Color::WHITE);
    renderer.end();

    let vertices = decode_vertices(&device.writes_to(vertex_id));
    assert_eq!(vertices[0].position, [5.0, 10.0]);
    assert_eq!(vertices[1].position, [25.0, 10.0]);
    assert_eq!(vertices[2].position, [25.0, 40.0]);
    assert_eq!(vertices[3].position, [5.0, 40.0]);
}

#[test]
fn capacity_exhaustion_flushes_before_the_overflowing_quad() {
    let (device, mut renderer) = renderer_with(BatchConfig {
        max_quads: 2,
        max_texture_slots: 32,
    });
    let (vertex_id, _) = buffer_ids(&device);

    renderer.begin();
    for i in 0..3 {
        renderer.draw_quad(Rect::new(i as f32, 0.0, 1.0, 1.0), Color::WHITE);
    }
    renderer.end();

    // One automatic flush after the 2nd quad, one final flush at end().
    assert_eq!(device.draw_index_counts(), vec![12, 6]);

    let writes = device.writes_to(vertex_id);
    assert_eq!(writes.len(), 2);
    let first: Vec<Vertex> = bytemuck::pod_collect_to_vec(&writes[0]);
    let second: Vec<Vertex> = bytemuck::pod_collect_to_vec(&writes[1]);
    assert_eq!(first.len(), 8);
    assert_eq!(second.len(), 4);
    // The 3rd quad's vertices land after the flush, never inside it.
    assert_eq!(second[0].position, [2.0, 0.0]);
    assert_eq!(renderer.stats().flushes, 2);
}

#[test]
fn repeated_texture_occupies_one_slot() {
    let (device, mut renderer) = default_renderer();
    let texture = Texture2D::from_pixels(device.as_ref(), None, 2, 2, &[0; 16]).unwrap();
    device.clear_calls();

    renderer.begin();
    renderer.draw(Rect::new(0.0, 0.0, 4.0, 4.0), &texture);
    renderer.draw(Rect::new(8.0, 0.0, 4.0, 4.0), &texture);
    renderer.end();

    assert_eq!(device.texture_binds(), vec![(0, texture.id())]);
    assert_eq!(renderer.stats().texture_binds, 1);
}

#[test]
fn slot_exhaustion_flushes_per_texture_block() {
    let (device, mut renderer) = renderer_with(BatchConfig {
        max_quads: 1024,
        max_texture_slots: 2,
    });
    let textures: Vec<Texture2D> = (0..4)
        .map(|_| Texture2D::from_pixels(device.as_ref(), None, 2, 2, &[0; 16]).unwrap())
        .collect();
    let (vertex_id, _) = buffer_ids(&device);
    device.clear_calls();

    renderer.begin();
    for (i, texture) in textures.iter().enumerate() {
        renderer.draw(Rect::new(i as f32 * 10.0, 0.0, 4.0, 4.0), texture);
    }
    renderer.end();

    // ceil(4 distinct textures / 2 slots) = 2 flushes.
    assert_eq!(device.draw_count(), 2);
    assert_eq!(renderer.stats().flushes, 2);

    // No quad lost or duplicated across the flush boundary.
    let vertices = decode_vertices(&device.writes_to(vertex_id));
    assert_eq!(vertices.len(), 16);
    for (i, _) in textures.iter().enumerate() {
        assert_eq!(vertices[i * 4].position, [i as f32 * 10.0, 0.0]);
    }

    // Slots restart from zero after each flush.
    assert_eq!(
        device.texture_binds(),
        vec![
            (0, textures[0].id()),
            (1, textures[1].id()),
            (0, textures[2].id()),
            (1, textures[3].id()),
        ]
    );
}

#[test]
fn source_region_maps_to_normalized_uvs() {
    let (device, mut renderer) = default_renderer();
    let texture = Texture2D::from_pixels(device.as_ref(), None, 64, 32, &[0; 64 * 32 * 4]).unwrap();
    let (vertex_id, _) = buffer_ids(&device);

    renderer.begin();
    renderer.draw_region(
        Rect::new(0.0, 0.0, 16.0, 8.0),
        Rect::new(16.0, 8.0, 32.0, 16.0),
        &texture,
    );
    renderer.end();

    let vertices = decode_vertices(&device.writes_to(vertex_id));
    assert_eq!(vertices[0].uv, [0.25, 0.25]);
    assert_eq!(vertices[1].uv, [0.75, 0.25]);
    assert_eq!(vertices[2].uv, [0.75, 0.75]);
    assert_eq!(vertices[3].uv, [0.25, 0.75]);
}

#[test]
fn resize_takes_effect_at_the_next_flush() {
    let (device, mut renderer) = default_renderer();
    let before = Mat4::orthographic_rh(0.0, 800.0, 600.0, 0.0, -1.0, 1.0).to_cols_array_2d();
    let after = Mat4::orthographic_rh(0.0, 1024.0, 768.0, 0.0, -1.0, 1.0).to_cols_array_2d();

    renderer.begin();
    renderer.draw_quad(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
    renderer.end();

    renderer.resize(1024, 768);

    renderer.begin();
    renderer.draw_quad(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
    renderer.end();

    assert_eq!(device.mat4_values("u_projection"), vec![before, after]);
}

#[test]
fn degenerate_bounds_are_dropped() {
    let (device, mut renderer) = default_renderer();
    device.clear_calls();

    renderer.begin();
    renderer.draw_quad(Rect::new(0.0, 0.0, 0.0, 10.0), Color::WHITE);
    renderer.draw_quad(Rect::new(0.0, 0.0, 10.0, -1.0), Color::WHITE);
    renderer.end();

    assert_eq!(device.draw_count(), 0);
    assert_eq!(renderer.stats().quads, 2);
    assert_eq!(renderer.stats().flushes, 0);
}

#[test]
fn sampler_array_is_initialized_at_construction() {
    let (device, _renderer) = renderer_with(BatchConfig {
        max_quads: 4,
        max_texture_slots: 8,
    });

    let expected: Vec<i32> = (0..8).collect();
    assert!(device.calls().iter().any(|c| matches!(
        c,
        DeviceCall::SetUniformIntArray { name, values }
            if name == "u_textures" && *values == expected
    )));
}

#[test]
#[should_panic(expected = "begin() called again without end()")]
fn nested_begin_panics() {
    let (_device, mut renderer) = default_renderer();
    renderer.begin();
    renderer.begin();
}

#[test]
#[should_panic(expected = "draw call outside begin()/end()")]
fn draw_before_begin_panics() {
    let (_device, mut renderer) = default_renderer();
    renderer.draw_quad(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
}

#[test]
#[should_panic(expected = "draw call outside begin()/end()")]
fn draw_after_end_panics() {
    let (_device, mut renderer) = default_renderer();
    renderer.begin();
    renderer.end();
    renderer.draw_quad(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
}

#[test]
#[should_panic(expected = "end() called without begin()")]
fn end_without_begin_panics() {
    let (_device, mut renderer) = default_renderer();
    renderer.end();
}

//! Unit tests for the resource manager

use crate::device::mock::MockDevice;
use crate::device::GpuDevice;
use crate::error::GpuError;
use crate::memory::HeapAllocator;
use crate::resource::{BufferUsage, ResourceManager, TextureDesc, TextureFormat};

struct Fixture {
    resources: ResourceManager,
    allocator: HeapAllocator,
    device: MockDevice,
}

impl Fixture {
    fn new() -> Self {
        let device = MockDevice::nvidia();
        let allocator = HeapAllocator::new(device.memory_heaps(), device.min_alignment());
        Self {
            resources: ResourceManager::new(),
            allocator,
            device,
        }
    }
}

// ============================================================================
// BUFFER ALLOCATION
// ============================================================================

#[test]
fn test_zero_size_buffer_fails_invalid_param() {
    let mut fx = Fixture::new();
    let result =
        fx.resources
            .allocate_buffer(&mut fx.device, &mut fx.allocator, 0, BufferUsage::VERTEX);
    assert!(matches!(result.unwrap_err(), GpuError::InvalidParam(_)));
}

#[test]
fn test_allocation_larger_than_every_heap_fails_out_of_memory() {
    let mut fx = Fixture::new();
    let before: Vec<u64> = fx.allocator.heaps().iter().map(|h| h.available).collect();
    let result = fx.resources.allocate_buffer(
        &mut fx.device,
        &mut fx.allocator,
        1 << 40,
        BufferUsage::VERTEX,
    );
    assert_eq!(result.unwrap_err(), GpuError::OutOfMemory);
    let after: Vec<u64> = fx.allocator.heaps().iter().map(|h| h.available).collect();
    assert_eq!(before, after);
}

#[test]
fn test_staging_buffer_lands_host_visible() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .allocate_buffer(&mut fx.device, &mut fx.allocator, 512, BufferUsage::STAGING)
        .unwrap();
    let buffer = fx.resources.buffer(id).unwrap();
    assert!(buffer.host_visible);
    assert!(fx.allocator.heaps()[buffer.heap_index].host_coherent);
}

#[test]
fn test_vertex_buffer_lands_device_local() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .allocate_buffer(&mut fx.device, &mut fx.allocator, 512, BufferUsage::VERTEX)
        .unwrap();
    let buffer = fx.resources.buffer(id).unwrap();
    assert!(fx.allocator.heaps()[buffer.heap_index].device_local);
}

// ============================================================================
// MAPPING
// ============================================================================

#[test]
fn test_map_unmap_cycle_is_repeatable() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .allocate_buffer(&mut fx.device, &mut fx.allocator, 256, BufferUsage::STAGING)
        .unwrap();
    for _ in 0..100 {
        fx.resources.map_buffer(&mut fx.device, id).unwrap();
        assert!(fx.resources.buffer(id).unwrap().is_mapped);
        fx.resources.unmap_buffer(&mut fx.device, id).unwrap();
        assert!(!fx.resources.buffer(id).unwrap().is_mapped);
    }
}

#[test]
fn test_map_device_local_buffer_fails_not_supported() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .allocate_buffer(&mut fx.device, &mut fx.allocator, 256, BufferUsage::VERTEX)
        .unwrap();
    let result = fx.resources.map_buffer(&mut fx.device, id);
    assert!(matches!(result.unwrap_err(), GpuError::NotSupported(_)));
}

#[test]
fn test_double_map_fails_device_error() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .allocate_buffer(&mut fx.device, &mut fx.allocator, 256, BufferUsage::STAGING)
        .unwrap();
    fx.resources.map_buffer(&mut fx.device, id).unwrap();
    let result = fx.resources.map_buffer(&mut fx.device, id);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));
    // Still mapped, state unchanged by the failed call
    assert!(fx.resources.buffer(id).unwrap().is_mapped);
}

#[test]
fn test_unmap_unmapped_buffer_is_noop() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .allocate_buffer(&mut fx.device, &mut fx.allocator, 256, BufferUsage::STAGING)
        .unwrap();
    fx.resources.unmap_buffer(&mut fx.device, id).unwrap();
    fx.resources.unmap_buffer(&mut fx.device, id).unwrap();
}

#[test]
fn test_free_mapped_buffer_fails() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .allocate_buffer(&mut fx.device, &mut fx.allocator, 256, BufferUsage::STAGING)
        .unwrap();
    fx.resources.map_buffer(&mut fx.device, id).unwrap();
    let result = fx.resources.free_buffer(&mut fx.device, &mut fx.allocator, id);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));

    fx.resources.unmap_buffer(&mut fx.device, id).unwrap();
    fx.resources
        .free_buffer(&mut fx.device, &mut fx.allocator, id)
        .unwrap();
}

// ============================================================================
// UPLOADS
// ============================================================================

#[test]
fn test_upload_overflow_fails() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .allocate_buffer(&mut fx.device, &mut fx.allocator, 16, BufferUsage::STAGING)
        .unwrap();
    let data = [0u8; 12];
    let result =
        fx.resources
            .upload_buffer_data(&mut fx.device, &mut fx.allocator, id, &data, 8);
    assert_eq!(result.unwrap_err(), GpuError::BufferOverflow);
}

#[test]
fn test_host_visible_upload_is_a_direct_copy() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .allocate_buffer(&mut fx.device, &mut fx.allocator, 64, BufferUsage::STAGING)
        .unwrap();
    let data: Vec<u8> = (0..64).collect();
    fx.resources
        .upload_buffer_data(&mut fx.device, &mut fx.allocator, id, &data, 0)
        .unwrap();

    let backing = fx.resources.buffer(id).unwrap().backing;
    assert_eq!(fx.device.read_buffer(backing, 0, 64).unwrap(), data);
}

#[test]
fn test_device_local_upload_stages_and_matches_direct_path() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .allocate_buffer(&mut fx.device, &mut fx.allocator, 64, BufferUsage::VERTEX)
        .unwrap();
    assert!(!fx.resources.buffer(id).unwrap().host_visible);

    let data: Vec<u8> = (0..32).map(|i| i * 2).collect();
    fx.resources
        .upload_buffer_data(&mut fx.device, &mut fx.allocator, id, &data, 16)
        .unwrap();

    // Observably equivalent to the direct path
    let backing = fx.resources.buffer(id).unwrap().backing;
    assert_eq!(fx.device.read_buffer(backing, 16, 32).unwrap(), data);
    // The internal staging buffer was released
    assert_eq!(fx.resources.buffer_count(), 1);
}

// ============================================================================
// TEXTURES
// ============================================================================

#[test]
fn test_create_texture_validates_mips_and_layers() {
    let mut fx = Fixture::new();
    let mut desc = TextureDesc::simple_2d(16, 16, TextureFormat::R8G8B8A8_UNORM);
    desc.mip_levels = 0;
    let result = fx
        .resources
        .create_texture(&mut fx.device, &mut fx.allocator, desc);
    assert!(matches!(result.unwrap_err(), GpuError::InvalidParam(_)));

    let mut desc = TextureDesc::simple_2d(16, 16, TextureFormat::R8G8B8A8_UNORM);
    desc.array_size = 0;
    let result = fx
        .resources
        .create_texture(&mut fx.device, &mut fx.allocator, desc);
    assert!(matches!(result.unwrap_err(), GpuError::InvalidParam(_)));
}

#[test]
fn test_depth_stencil_rejects_color_format() {
    let mut fx = Fixture::new();
    let result = fx.resources.create_depth_stencil(
        &mut fx.device,
        &mut fx.allocator,
        64,
        64,
        TextureFormat::R8G8B8A8_UNORM,
    );
    assert!(matches!(result.unwrap_err(), GpuError::InvalidParam(_)));
}

#[test]
fn test_depth_stencil_accepts_depth_format() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .create_depth_stencil(&mut fx.device, &mut fx.allocator, 64, 64, TextureFormat::D32_FLOAT)
        .unwrap();
    let texture = fx.resources.texture(id).unwrap();
    assert!(texture.is_depth_stencil);
    assert!(!texture.is_render_target);
}

#[test]
fn test_render_target_rejects_depth_format() {
    let mut fx = Fixture::new();
    let result = fx.resources.create_render_target(
        &mut fx.device,
        &mut fx.allocator,
        64,
        64,
        TextureFormat::D32_FLOAT,
    );
    assert!(matches!(result.unwrap_err(), GpuError::InvalidParam(_)));
}

#[test]
fn test_destroy_texture_returns_heap_capacity() {
    let mut fx = Fixture::new();
    let before: u64 = fx.allocator.heaps().iter().map(|h| h.available).sum();
    let id = fx
        .resources
        .create_render_target(
            &mut fx.device,
            &mut fx.allocator,
            32,
            32,
            TextureFormat::R8G8B8A8_UNORM,
        )
        .unwrap();
    fx.resources
        .destroy_texture(&mut fx.device, &mut fx.allocator, id)
        .unwrap();
    let after: u64 = fx.allocator.heaps().iter().map(|h| h.available).sum();
    assert_eq!(before, after);
}

// ============================================================================
// IN-FLIGHT PROTECTION
// ============================================================================

#[test]
fn test_free_in_flight_buffer_fails_until_released() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .allocate_buffer(&mut fx.device, &mut fx.allocator, 256, BufferUsage::VERTEX)
        .unwrap();

    fx.resources.mark_buffer_in_flight(id);
    let result = fx.resources.free_buffer(&mut fx.device, &mut fx.allocator, id);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));

    fx.resources.release_buffer_in_flight(id);
    fx.resources
        .free_buffer(&mut fx.device, &mut fx.allocator, id)
        .unwrap();
}

#[test]
fn test_destroy_in_flight_texture_fails_until_released() {
    let mut fx = Fixture::new();
    let id = fx
        .resources
        .create_render_target(
            &mut fx.device,
            &mut fx.allocator,
            32,
            32,
            TextureFormat::R8G8B8A8_UNORM,
        )
        .unwrap();

    fx.resources.mark_texture_in_flight(id);
    let result = fx
        .resources
        .destroy_texture(&mut fx.device, &mut fx.allocator, id);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));

    fx.resources.release_texture_in_flight(id);
    fx.resources
        .destroy_texture(&mut fx.device, &mut fx.allocator, id)
        .unwrap();
}

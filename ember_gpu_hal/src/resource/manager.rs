/// Resource manager - creates, uploads, maps and frees buffers and textures
///
/// The manager is the only entity that frees resources; everything else
/// holds generation-checked handles. Heap capacity lives in the
/// HeapAllocator and backend storage behind the GpuDevice trait, both
/// passed in per call so the Session can split its borrows.

use slotmap::SlotMap;

use crate::device::GpuDevice;
use crate::error::{GpuError, Result};
use crate::memory::HeapAllocator;
use crate::resource::{
    Buffer, BufferId, BufferUsage, Texture, TextureDesc, TextureFormat, TextureId,
};

/// Owns every buffer and texture of the active device
#[derive(Default)]
pub struct ResourceManager {
    buffers: SlotMap<BufferId, Buffer>,
    textures: SlotMap<TextureId, Texture>,
}

impl ResourceManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self {
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
        }
    }

    // ===== BUFFERS =====

    /// Allocate a buffer.
    ///
    /// The heap is chosen from the usage flags (see
    /// `HeapAllocator::pick_heap`); the allocation size is rounded up to
    /// the device minimum alignment.
    ///
    /// # Errors
    ///
    /// `InvalidParam` on zero size, `OutOfMemory` when no heap fits.
    pub fn allocate_buffer(
        &mut self,
        backend: &mut dyn GpuDevice,
        allocator: &mut HeapAllocator,
        size: u64,
        usage: BufferUsage,
    ) -> Result<BufferId> {
        if size == 0 {
            return Err(GpuError::InvalidParam("buffer size must be > 0".to_string()));
        }
        let allocation = allocator.allocate(size, usage)?;
        let backing = match backend.create_buffer_backing(allocation.size, usage, allocation.heap_index) {
            Ok(backing) => backing,
            Err(err) => {
                // Heap capacity must not leak when the backend refuses
                allocator.free(allocation);
                return Err(err);
            }
        };
        let host_visible = allocator.heaps()[allocation.heap_index].host_visible;
        Ok(self.buffers.insert(Buffer {
            backing: backing.handle,
            size: allocation.size,
            requested_size: size,
            usage,
            heap_index: allocation.heap_index,
            host_visible,
            device_address: backing.device_address,
            is_mapped: false,
            in_flight: 0,
        }))
    }

    /// Map a buffer for CPU access.
    ///
    /// # Errors
    ///
    /// `NotSupported` when the backing heap is not host-visible,
    /// `DeviceError` when the buffer is already mapped.
    pub fn map_buffer(&mut self, backend: &mut dyn GpuDevice, id: BufferId) -> Result<()> {
        let buffer = Self::expect_buffer_mut(&mut self.buffers, id)?;
        if !buffer.host_visible {
            return Err(GpuError::NotSupported(
                "buffer heap is not host-visible".to_string(),
            ));
        }
        if buffer.is_mapped {
            return Err(GpuError::DeviceError("buffer is already mapped".to_string()));
        }
        backend.map_buffer(buffer.backing)?;
        buffer.is_mapped = true;
        Ok(())
    }

    /// Unmap a buffer. Unmapping an unmapped buffer is a no-op.
    pub fn unmap_buffer(&mut self, backend: &mut dyn GpuDevice, id: BufferId) -> Result<()> {
        let buffer = Self::expect_buffer_mut(&mut self.buffers, id)?;
        if !buffer.is_mapped {
            return Ok(());
        }
        backend.unmap_buffer(buffer.backing)?;
        buffer.is_mapped = false;
        Ok(())
    }

    /// Write through a live mapping.
    ///
    /// # Errors
    ///
    /// `DeviceError` when the buffer is not mapped, `BufferOverflow`
    /// when `offset + data.len()` exceeds the buffer size.
    pub fn write_mapped(
        &mut self,
        backend: &mut dyn GpuDevice,
        id: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<()> {
        let buffer = Self::expect_buffer_mut(&mut self.buffers, id)?;
        if !buffer.is_mapped {
            return Err(GpuError::DeviceError("buffer is not mapped".to_string()));
        }
        Self::check_bounds(buffer.requested_size, offset, data.len() as u64)?;
        backend.write_buffer(buffer.backing, offset, data)
    }

    /// Upload bytes into a buffer at `offset`.
    ///
    /// Host-visible buffers take a direct copy; device-local buffers go
    /// through an internal staging buffer and a device-side transfer.
    /// The two paths are observably equivalent to the caller.
    ///
    /// # Errors
    ///
    /// `BufferOverflow` when `offset + data.len()` exceeds the buffer
    /// size.
    pub fn upload_buffer_data(
        &mut self,
        backend: &mut dyn GpuDevice,
        allocator: &mut HeapAllocator,
        id: BufferId,
        data: &[u8],
        offset: u64,
    ) -> Result<()> {
        let (backing, host_visible, requested_size) = {
            let buffer = Self::expect_buffer(&self.buffers, id)?;
            (buffer.backing, buffer.host_visible, buffer.requested_size)
        };
        Self::check_bounds(requested_size, offset, data.len() as u64)?;
        if data.is_empty() {
            return Ok(());
        }

        if host_visible {
            return backend.write_buffer(backing, offset, data);
        }

        // Device-local path: stage in host memory, then transfer
        let staging = self.allocate_buffer(backend, allocator, data.len() as u64, BufferUsage::STAGING)?;
        let result = (|| {
            let staging_backing = Self::expect_buffer(&self.buffers, staging)?.backing;
            backend.write_buffer(staging_backing, 0, data)?;
            backend.copy_buffer(staging_backing, 0, backing, offset, data.len() as u64)
        })();
        // The staging buffer is released on every exit path
        let free_result = self.free_buffer(backend, allocator, staging);
        result.and(free_result)
    }

    /// Free a buffer.
    ///
    /// # Errors
    ///
    /// `DeviceError` while the buffer is mapped or still referenced by
    /// an in-flight command buffer; wait for completion first.
    pub fn free_buffer(
        &mut self,
        backend: &mut dyn GpuDevice,
        allocator: &mut HeapAllocator,
        id: BufferId,
    ) -> Result<()> {
        let buffer = Self::expect_buffer(&self.buffers, id)?;
        if buffer.is_mapped {
            return Err(GpuError::DeviceError(
                "buffer must be unmapped before free".to_string(),
            ));
        }
        if buffer.is_in_flight() {
            return Err(GpuError::DeviceError(
                "buffer is referenced by an in-flight command buffer".to_string(),
            ));
        }
        match self.buffers.remove(id) {
            Some(buffer) => {
                backend.destroy_buffer_backing(buffer.backing)?;
                allocator.free(crate::memory::HeapAllocation {
                    heap_index: buffer.heap_index,
                    size: buffer.size,
                });
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Look up a buffer
    pub fn buffer(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.get(id)
    }

    /// Look up a buffer, failing `InvalidParam` on a stale handle
    pub fn expect_buffer_ref(&self, id: BufferId) -> Result<&Buffer> {
        Self::expect_buffer(&self.buffers, id)
    }

    /// Number of live buffers
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    // ===== TEXTURES =====

    /// Create a sampled texture.
    ///
    /// # Errors
    ///
    /// `InvalidParam` on zero dimensions, `mip_levels`/`array_size`/
    /// `sample_count` below 1, or an unknown format; `OutOfMemory` when
    /// no heap fits.
    pub fn create_texture(
        &mut self,
        backend: &mut dyn GpuDevice,
        allocator: &mut HeapAllocator,
        desc: TextureDesc,
    ) -> Result<TextureId> {
        self.create_texture_with_roles(backend, allocator, desc, false, false)
    }

    /// Create a color render target
    ///
    /// # Errors
    ///
    /// `InvalidParam` when `format` is a depth/stencil format; depth
    /// targets come from `create_depth_stencil`.
    pub fn create_render_target(
        &mut self,
        backend: &mut dyn GpuDevice,
        allocator: &mut HeapAllocator,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId> {
        if format.is_depth_stencil() {
            return Err(GpuError::InvalidParam(format!(
                "{} is a depth/stencil format; use create_depth_stencil",
                format
            )));
        }
        let desc = TextureDesc::simple_2d(width, height, format);
        self.create_texture_with_roles(backend, allocator, desc, true, false)
    }

    /// Create a depth/stencil target.
    ///
    /// # Errors
    ///
    /// `InvalidParam` when `format` is not depth/stencil-capable.
    pub fn create_depth_stencil(
        &mut self,
        backend: &mut dyn GpuDevice,
        allocator: &mut HeapAllocator,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId> {
        if !format.is_depth_stencil() {
            return Err(GpuError::InvalidParam(format!(
                "{} is not a depth/stencil-capable format",
                format
            )));
        }
        let desc = TextureDesc::simple_2d(width, height, format);
        self.create_texture_with_roles(backend, allocator, desc, false, true)
    }

    /// Upload tightly packed level-0 texel data.
    ///
    /// # Errors
    ///
    /// `TextureError` when `data` does not match the level-0 byte size.
    pub fn upload_texture_data(
        &mut self,
        backend: &mut dyn GpuDevice,
        id: TextureId,
        data: &[u8],
    ) -> Result<()> {
        let texture = Self::expect_texture(&self.textures, id)?;
        let expected = texture
            .desc
            .format
            .level_size_bytes(texture.desc.width, texture.desc.height, texture.desc.depth);
        if data.len() as u64 != expected {
            return Err(GpuError::TextureError(format!(
                "level-0 upload needs {} bytes, got {}",
                expected,
                data.len()
            )));
        }
        backend.write_texture(texture.backing, data)
    }

    /// Destroy a texture.
    ///
    /// # Errors
    ///
    /// `DeviceError` while the texture is still referenced by an
    /// in-flight command buffer; wait for completion first.
    pub fn destroy_texture(
        &mut self,
        backend: &mut dyn GpuDevice,
        allocator: &mut HeapAllocator,
        id: TextureId,
    ) -> Result<()> {
        let texture = Self::expect_texture(&self.textures, id)?;
        if texture.is_in_flight() {
            return Err(GpuError::DeviceError(
                "texture is referenced by an in-flight command buffer".to_string(),
            ));
        }
        match self.textures.remove(id) {
            Some(texture) => {
                backend.destroy_texture_backing(texture.backing)?;
                allocator.free(crate::memory::HeapAllocation {
                    heap_index: texture.heap_index,
                    size: texture.size,
                });
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Look up a texture
    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id)
    }

    /// Look up a texture, failing `InvalidParam` on a stale handle
    pub fn expect_texture_ref(&self, id: TextureId) -> Result<&Texture> {
        Self::expect_texture(&self.textures, id)
    }

    /// Number of live textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // ===== IN-FLIGHT BOOKKEEPING (driven by the Submission Engine) =====

    pub(crate) fn mark_buffer_in_flight(&mut self, id: BufferId) {
        if let Some(buffer) = self.buffers.get_mut(id) {
            buffer.in_flight += 1;
        }
    }

    pub(crate) fn release_buffer_in_flight(&mut self, id: BufferId) {
        if let Some(buffer) = self.buffers.get_mut(id) {
            buffer.in_flight = buffer.in_flight.saturating_sub(1);
        }
    }

    pub(crate) fn mark_texture_in_flight(&mut self, id: TextureId) {
        if let Some(texture) = self.textures.get_mut(id) {
            texture.in_flight += 1;
        }
    }

    pub(crate) fn release_texture_in_flight(&mut self, id: TextureId) {
        if let Some(texture) = self.textures.get_mut(id) {
            texture.in_flight = texture.in_flight.saturating_sub(1);
        }
    }

    /// Tear down everything (device shutdown path)
    pub(crate) fn clear(&mut self, backend: &mut dyn GpuDevice, allocator: &mut HeapAllocator) {
        for (_, buffer) in self.buffers.drain() {
            let _ = backend.destroy_buffer_backing(buffer.backing);
            allocator.free(crate::memory::HeapAllocation {
                heap_index: buffer.heap_index,
                size: buffer.size,
            });
        }
        for (_, texture) in self.textures.drain() {
            let _ = backend.destroy_texture_backing(texture.backing);
            allocator.free(crate::memory::HeapAllocation {
                heap_index: texture.heap_index,
                size: texture.size,
            });
        }
    }

    // ===== INTERNAL =====

    fn create_texture_with_roles(
        &mut self,
        backend: &mut dyn GpuDevice,
        allocator: &mut HeapAllocator,
        desc: TextureDesc,
        is_render_target: bool,
        is_depth_stencil: bool,
    ) -> Result<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GpuError::InvalidParam(
                "texture dimensions must be > 0".to_string(),
            ));
        }
        if desc.mip_levels < 1 {
            return Err(GpuError::InvalidParam("mip_levels must be >= 1".to_string()));
        }
        if desc.array_size < 1 {
            return Err(GpuError::InvalidParam("array_size must be >= 1".to_string()));
        }
        if desc.sample_count < 1 {
            return Err(GpuError::InvalidParam("sample_count must be >= 1".to_string()));
        }
        if desc.format == TextureFormat::Unknown {
            return Err(GpuError::InvalidParam("unknown texture format".to_string()));
        }

        let size = desc.total_size_bytes();
        // Textures always prefer device-local memory
        let allocation = allocator.allocate(size, BufferUsage::empty())?;
        let backing = match backend.create_texture_backing(&desc, allocation.heap_index, allocation.size) {
            Ok(backing) => backing,
            Err(err) => {
                allocator.free(allocation);
                return Err(err);
            }
        };
        Ok(self.textures.insert(Texture {
            backing: backing.handle,
            desc,
            size: allocation.size,
            heap_index: allocation.heap_index,
            device_address: backing.device_address,
            is_render_target,
            is_depth_stencil,
            in_flight: 0,
        }))
    }

    fn expect_buffer<'a>(buffers: &'a SlotMap<BufferId, Buffer>, id: BufferId) -> Result<&'a Buffer> {
        buffers
            .get(id)
            .ok_or_else(|| GpuError::InvalidParam("stale buffer handle".to_string()))
    }

    fn expect_buffer_mut<'a>(
        buffers: &'a mut SlotMap<BufferId, Buffer>,
        id: BufferId,
    ) -> Result<&'a mut Buffer> {
        buffers
            .get_mut(id)
            .ok_or_else(|| GpuError::InvalidParam("stale buffer handle".to_string()))
    }

    fn expect_texture<'a>(
        textures: &'a SlotMap<TextureId, Texture>,
        id: TextureId,
    ) -> Result<&'a Texture> {
        textures
            .get(id)
            .ok_or_else(|| GpuError::InvalidParam("stale texture handle".to_string()))
    }

    fn check_bounds(size: u64, offset: u64, len: u64) -> Result<()> {
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok(()),
            _ => Err(GpuError::BufferOverflow),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;

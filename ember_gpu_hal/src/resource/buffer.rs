/// Buffer resource type and usage flags

use bitflags::bitflags;
use slotmap::new_key_type;

new_key_type! {
    /// Generation-checked handle to a buffer owned by the ResourceManager.
    ///
    /// Using a handle after the buffer was freed is detected (lookup
    /// fails) instead of dereferencing a stale object.
    pub struct BufferId;
}

bitflags! {
    /// Buffer usage flags
    ///
    /// The bit values are part of the firmware ABI and must not change.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Vertex data
        const VERTEX  = 0x01;
        /// Index data
        const INDEX   = 0x02;
        /// Uniform/constant data, rewritten by the CPU between frames
        const UNIFORM = 0x04;
        /// Shader storage
        const STORAGE = 0x08;
        /// Frequently updated from the CPU
        const DYNAMIC = 0x10;
        /// CPU-side staging source for transfers
        const STAGING = 0x20;
    }
}

impl BufferUsage {
    /// Whether this usage requires CPU-visible backing memory
    pub fn requires_host_visible(self) -> bool {
        self.intersects(BufferUsage::UNIFORM | BufferUsage::DYNAMIC | BufferUsage::STAGING)
    }

    /// Whether this usage prefers coherent mapping (no explicit flush)
    pub fn prefers_host_coherent(self) -> bool {
        self.contains(BufferUsage::STAGING)
    }
}

/// A GPU buffer owned by the ResourceManager.
///
/// A buffer can be mapped by at most one caller at a time and must be
/// unmapped before it is freed or submitted for writing.
#[derive(Debug)]
pub struct Buffer {
    /// Backend storage handle
    pub(crate) backing: u64,
    /// Size in bytes (after alignment rounding)
    pub size: u64,
    /// Requested size in bytes, before alignment rounding
    pub requested_size: u64,
    /// Usage flags
    pub usage: BufferUsage,
    /// Index of the heap the allocation was served from
    pub heap_index: usize,
    /// Whether the backing heap is CPU-visible
    pub host_visible: bool,
    /// GPU virtual address
    pub device_address: u64,
    /// Whether a CPU mapping is currently live
    pub is_mapped: bool,
    /// Number of submitted, not-yet-completed command buffers that
    /// reference this buffer
    pub(crate) in_flight: u32,
}

impl Buffer {
    /// Whether a submitted command buffer still references this buffer
    pub fn is_in_flight(&self) -> bool {
        self.in_flight > 0
    }
}

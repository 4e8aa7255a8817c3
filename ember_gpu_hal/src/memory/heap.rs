/// GPU memory heap description and alignment utilities

/// Kind of GPU-addressable memory a heap is carved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapKind {
    /// Dedicated video memory
    Vram,
    /// System memory reachable by the device
    System,
    /// System memory carved out for the device by firmware
    Shared,
    /// Single physical pool addressed by CPU and GPU alike
    Unified,
}

/// A pool of GPU-addressable memory
///
/// `available` is maintained by the HeapAllocator; a heap never
/// over-commits.
#[derive(Debug, Clone)]
pub struct Heap {
    /// Memory kind
    pub kind: HeapKind,
    /// Total capacity in bytes
    pub size: u64,
    /// Unallocated capacity in bytes
    pub available: u64,
    /// GPU-local (fast path for device reads)
    pub device_local: bool,
    /// CPU mappable
    pub host_visible: bool,
    /// CPU writes are visible to the device without explicit flushes
    pub host_coherent: bool,
}

/// Round `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two.
pub fn align_up(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Round `value` down to the previous multiple of `alignment`.
///
/// `alignment` must be a power of two.
pub fn align_down(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    value & !(alignment - 1)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "heap_tests.rs"]
mod tests;

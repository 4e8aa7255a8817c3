/// Heap allocator - capacity accounting over the device-reported heaps

use crate::error::{GpuError, Result};
use crate::memory::{align_up, Heap};
use crate::resource::BufferUsage;

/// Record of one served allocation, needed to return the capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapAllocation {
    /// Index of the heap the allocation was served from
    pub heap_index: usize,
    /// Allocation size in bytes, after alignment rounding
    pub size: u64,
}

/// Tracks the available capacity of every heap of the active device.
///
/// The allocator does no address-level bookkeeping; placement inside a
/// heap belongs to the backend. It guarantees that the sum of live
/// allocations per heap never exceeds the heap capacity and that every
/// allocation size is rounded up to the device minimum alignment before
/// the capacity check.
#[derive(Debug)]
pub struct HeapAllocator {
    heaps: Vec<Heap>,
    min_alignment: u64,
}

impl HeapAllocator {
    /// Create an allocator over the device-reported heap list
    ///
    /// # Arguments
    ///
    /// * `heaps` - Heap list as reported by the backend at device init
    /// * `min_alignment` - Device minimum allocation alignment (power of two)
    pub fn new(heaps: Vec<Heap>, min_alignment: u64) -> Self {
        debug_assert!(min_alignment.is_power_of_two());
        Self { heaps, min_alignment }
    }

    /// The heap list with live availability numbers
    pub fn heaps(&self) -> &[Heap] {
        &self.heaps
    }

    /// Device minimum allocation alignment
    pub fn min_alignment(&self) -> u64 {
        self.min_alignment
    }

    /// Pick the heap for a buffer usage.
    ///
    /// Selection is first-fit over the heap list in device order:
    /// host-visible usages (UNIFORM/DYNAMIC/STAGING) require a
    /// host-visible heap, STAGING additionally prefers host-coherent;
    /// everything else prefers device-local. Preferences relax if no
    /// heap satisfies them, requirements never do.
    pub fn pick_heap(&self, usage: BufferUsage, size: u64) -> Option<usize> {
        let size = align_up(size, self.min_alignment);
        let needs_host = usage.requires_host_visible();
        let prefers_coherent = usage.prefers_host_coherent();

        let fits = |heap: &Heap| heap.available >= size;
        let satisfies = |heap: &Heap| !needs_host || heap.host_visible;

        // Preferred pass: honor coherency/device-local preferences
        let preferred = self.heaps.iter().position(|heap| {
            fits(heap)
                && satisfies(heap)
                && (!prefers_coherent || heap.host_coherent)
                && (needs_host || heap.device_local)
        });
        if preferred.is_some() {
            return preferred;
        }

        // Relaxed pass: hard requirements only
        self.heaps
            .iter()
            .position(|heap| fits(heap) && satisfies(heap))
    }

    /// Allocate `size` bytes against a heap matching `usage`.
    ///
    /// Fails with `OutOfMemory` when no heap has sufficient available
    /// capacity and with `NotSupported` when no heap can satisfy the
    /// host-visibility requirement at any size. Never partially
    /// allocates: on failure every heap's availability is unchanged.
    pub fn allocate(&mut self, size: u64, usage: BufferUsage) -> Result<HeapAllocation> {
        let aligned = align_up(size, self.min_alignment);

        let Some(heap_index) = self.pick_heap(usage, size) else {
            // Distinguish "no compatible heap" from "compatible but full"
            let compatible_exists = self
                .heaps
                .iter()
                .any(|heap| !usage.requires_host_visible() || heap.host_visible);
            return if compatible_exists {
                Err(GpuError::OutOfMemory)
            } else {
                Err(GpuError::NotSupported(format!(
                    "no heap accepts usage {:?}",
                    usage
                )))
            };
        };

        let heap = &mut self.heaps[heap_index];
        heap.available -= aligned;
        Ok(HeapAllocation {
            heap_index,
            size: aligned,
        })
    }

    /// Return an allocation's capacity to its heap
    pub fn free(&mut self, allocation: HeapAllocation) {
        let heap = &mut self.heaps[allocation.heap_index];
        heap.available = (heap.available + allocation.size).min(heap.size);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "allocator_tests.rs"]
mod tests;

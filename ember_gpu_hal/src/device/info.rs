/// Physical device description types

use std::fmt;

/// GPU vendor identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuVendor {
    Unknown,
    Nvidia,
    Amd,
    Intel,
    Arm,
    Qualcomm,
    Imagination,
}

impl fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GpuVendor::Unknown => "Unknown",
            GpuVendor::Nvidia => "NVIDIA",
            GpuVendor::Amd => "AMD",
            GpuVendor::Intel => "Intel",
            GpuVendor::Arm => "ARM",
            GpuVendor::Qualcomm => "Qualcomm",
            GpuVendor::Imagination => "Imagination",
        };
        write!(f, "{}", name)
    }
}

/// GPU architecture class
///
/// Ordered from least to most capable; used by best-device selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GpuArch {
    Unknown,
    /// Fixed-function era hardware
    Legacy,
    /// Unified shader cores
    Unified,
    /// Unified cores plus general compute queues
    Compute,
    /// Hardware raytracing units
    Raytracing,
}

/// Optional capability flags reported by a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCaps {
    /// Compute dispatch support
    pub compute: bool,
    /// Hardware raytracing support
    pub raytracing: bool,
    /// Mesh shader support
    pub mesh_shaders: bool,
    /// Variable-rate shading support
    pub variable_rate_shading: bool,
}

/// Description of one physical GPU device
///
/// Returned by enumeration before any device is initialized; everything
/// here is probed from the bus/firmware without touching device state.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// PCI device id
    pub device_id: u32,
    /// PCI vendor id
    pub vendor_id: u32,
    /// Decoded vendor
    pub vendor: GpuVendor,
    /// Architecture class
    pub architecture: GpuArch,
    /// Human-readable device name
    pub device_name: String,
    /// Driver/firmware revision string
    pub driver_version: String,
    /// Dedicated VRAM size in bytes
    pub vram_size: u64,
    /// CPU/GPU shared memory size in bytes
    pub shared_memory_size: u64,
    /// Number of compute units / SMs
    pub compute_units: u32,
    /// Largest supported texture dimension
    pub max_texture_size: u32,
    /// Maximum simultaneous color targets in a render pass
    pub max_render_targets: u32,
    /// Optional capabilities
    pub caps: DeviceCaps,
    /// Memory-mapped I/O region base address
    pub mmio_base: u64,
    /// Memory-mapped I/O region size in bytes
    pub mmio_size: u64,
}

impl DeviceInfo {
    /// Score used by best-device selection: architecture class first,
    /// VRAM size as the tie-breaker.
    pub fn selection_score(&self) -> (GpuArch, u64) {
        (self.architecture, self.vram_size)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "info_tests.rs"]
mod tests;

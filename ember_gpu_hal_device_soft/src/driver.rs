/// Soft driver - enumerates virtual adapters and opens soft devices

use ember_gpu_hal::ember::device::{DeviceCaps, DeviceInfo, GpuArch, GpuDevice, GpuDriver, GpuVendor};
use ember_gpu_hal::ember::Result;

use crate::device::SoftDevice;

const MIB: u64 = 1024 * 1024;

/// Driver over a configurable list of virtual adapters.
///
/// The default configuration exposes one compute-class discrete
/// adapter; tests construct multi-adapter or empty buses as needed.
pub struct SoftDriver {
    devices: Vec<DeviceInfo>,
}

impl SoftDriver {
    /// One default virtual adapter
    pub fn new() -> Self {
        Self {
            devices: vec![Self::default_adapter()],
        }
    }

    /// Arbitrary adapter list (possibly empty)
    pub fn with_devices(devices: Vec<DeviceInfo>) -> Self {
        Self { devices }
    }

    /// The adapter description used by `new()`
    pub fn default_adapter() -> DeviceInfo {
        DeviceInfo {
            device_id: 0x0001,
            vendor_id: 0x10DE,
            vendor: GpuVendor::Nvidia,
            architecture: GpuArch::Compute,
            device_name: "Ember Soft Adapter".to_string(),
            driver_version: env!("CARGO_PKG_VERSION").to_string(),
            vram_size: 16 * MIB,
            shared_memory_size: 8 * MIB,
            compute_units: 8,
            max_texture_size: 8192,
            max_render_targets: 8,
            caps: DeviceCaps {
                compute: true,
                raytracing: false,
                mesh_shaders: false,
                variable_rate_shading: false,
            },
            mmio_base: 0xFEA0_0000,
            mmio_size: 16 * MIB,
        }
    }
}

impl Default for SoftDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuDriver for SoftDriver {
    fn enumerate(&self) -> Vec<DeviceInfo> {
        self.devices.clone()
    }

    fn open(&self, index: usize) -> Result<Box<dyn GpuDevice>> {
        let info = self
            .devices
            .get(index)
            .cloned()
            .ok_or(ember_gpu_hal::ember::GpuError::DeviceNotFound)?;
        Ok(Box::new(SoftDevice::new(info)))
    }
}

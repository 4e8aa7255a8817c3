/// Mock backend for unit tests (no device required)
///
/// This mock lets the Session, ResourceManager and the other subsystems
/// be tested without real hardware. Storage is plain byte vectors,
/// shader "compilation" is a marker check, and fences signal when the
/// host waits.

#[cfg(test)]
use rustc_hash::FxHashMap;

#[cfg(test)]
use crate::command::RecordedCommand;
#[cfg(test)]
use crate::device::{
    DeviceCaps, DeviceInfo, GpuArch, GpuDevice, GpuDriver, GpuVendor, PipelineStages,
    ResourceBacking, SubmitBatch,
};
#[cfg(test)]
use crate::error::{GpuError, Result};
#[cfg(test)]
use crate::memory::{Heap, HeapKind};
#[cfg(test)]
use crate::pipeline::GraphicsPipelineDesc;
#[cfg(test)]
use crate::resource::{BufferUsage, TextureDesc};
#[cfg(test)]
use crate::shader::ShaderStage;

/// Bytecode prefix the mock rejects, for exercising ShaderCompile paths
#[cfg(test)]
pub const MOCK_BAD_BYTECODE: &[u8] = b"BAD!";

/// Source marker that makes mock compilation fail with a diagnostic
#[cfg(test)]
pub const MOCK_BAD_SOURCE: &str = "syntax_error";

// ============================================================================
// Mock Driver
// ============================================================================

/// Mock driver enumerating a configurable device list
#[cfg(test)]
pub struct MockDriver {
    devices: Vec<DeviceInfo>,
    /// Fail every open() with DeviceInitFailed
    fail_handshake: bool,
    /// One-shot fault injection: the first submit on any opened device
    /// is rejected
    fail_first_submit: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl MockDriver {
    /// One discrete NVIDIA-class device (the common test fixture)
    pub fn single_nvidia() -> Self {
        Self {
            devices: vec![Self::nvidia_info()],
            fail_handshake: false,
            fail_first_submit: Default::default(),
        }
    }

    /// No devices on the bus
    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
            fail_handshake: false,
            fail_first_submit: Default::default(),
        }
    }

    /// Arbitrary device list
    pub fn with_devices(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices,
            fail_handshake: false,
            fail_first_submit: Default::default(),
        }
    }

    /// Devices enumerate but every handshake fails
    pub fn failing_handshake() -> Self {
        Self {
            devices: vec![Self::nvidia_info()],
            fail_handshake: true,
            fail_first_submit: Default::default(),
        }
    }

    /// One device whose first submission is rejected by the queue
    pub fn failing_first_submit() -> Self {
        let driver = Self::single_nvidia();
        driver
            .fail_first_submit
            .store(true, std::sync::atomic::Ordering::Relaxed);
        driver
    }

    /// The DeviceInfo used by the NVIDIA-class fixtures
    pub fn nvidia_info() -> DeviceInfo {
        DeviceInfo {
            device_id: 0x2684,
            vendor_id: 0x10DE,
            vendor: GpuVendor::Nvidia,
            architecture: GpuArch::Raytracing,
            device_name: "Mock RTX".to_string(),
            driver_version: "mock-1.0".to_string(),
            vram_size: 64 * 1024,
            shared_memory_size: 16 * 1024,
            compute_units: 128,
            max_texture_size: 16384,
            max_render_targets: 8,
            caps: DeviceCaps {
                compute: true,
                raytracing: true,
                mesh_shaders: true,
                variable_rate_shading: true,
            },
            mmio_base: 0xF000_0000,
            mmio_size: 16 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
impl GpuDriver for MockDriver {
    fn enumerate(&self) -> Vec<DeviceInfo> {
        self.devices.clone()
    }

    fn open(&self, index: usize) -> Result<Box<dyn GpuDevice>> {
        let info = self
            .devices
            .get(index)
            .cloned()
            .ok_or(GpuError::DeviceNotFound)?;
        if self.fail_handshake {
            return Err(GpuError::DeviceInitFailed(
                "mock handshake failure".to_string(),
            ));
        }
        let mut device = MockDevice::new(info);
        device.fail_next_submit = self
            .fail_first_submit
            .swap(false, std::sync::atomic::Ordering::Relaxed);
        Ok(Box::new(device))
    }
}

// ============================================================================
// Mock Device
// ============================================================================

/// Mock device: byte-vector storage, marker-checked shaders, and a
/// command log of executed batches
#[cfg(test)]
pub struct MockDevice {
    info: DeviceInfo,
    next_handle: u64,
    buffers: FxHashMap<u64, Vec<u8>>,
    textures: FxHashMap<u64, Vec<u8>>,
    shaders: FxHashMap<u64, ShaderStage>,
    pipelines: FxHashMap<u64, bool>,
    /// Command names of every executed batch, in execution order
    pub executed: Vec<String>,
    /// Reject the next submit with a backend error (fault injection)
    pub fail_next_submit: bool,
    signaled_fence: u64,
    queued_fences: Vec<u64>,
}

#[cfg(test)]
impl MockDevice {
    /// Standalone device over the NVIDIA-class fixture info
    pub fn nvidia() -> Self {
        Self::new(MockDriver::nvidia_info())
    }

    pub fn new(info: DeviceInfo) -> Self {
        Self {
            info,
            next_handle: 1,
            buffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            shaders: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            executed: Vec::new(),
            fail_next_submit: false,
            signaled_fence: 0,
            queued_fences: Vec::new(),
        }
    }

    fn handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn buffer(&self, backing: u64) -> Result<&Vec<u8>> {
        self.buffers
            .get(&backing)
            .ok_or_else(|| GpuError::Backend("unknown buffer backing".to_string()))
    }
}

#[cfg(test)]
impl GpuDevice for MockDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn memory_heaps(&self) -> Vec<Heap> {
        vec![
            Heap {
                kind: HeapKind::Vram,
                size: self.info.vram_size,
                available: self.info.vram_size,
                device_local: true,
                host_visible: false,
                host_coherent: false,
            },
            Heap {
                kind: HeapKind::System,
                size: self.info.shared_memory_size,
                available: self.info.shared_memory_size,
                device_local: false,
                host_visible: true,
                host_coherent: true,
            },
        ]
    }

    fn min_alignment(&self) -> u64 {
        256
    }

    fn create_buffer_backing(
        &mut self,
        size: u64,
        _usage: BufferUsage,
        _heap_index: usize,
    ) -> Result<ResourceBacking> {
        let handle = self.handle();
        self.buffers.insert(handle, vec![0u8; size as usize]);
        Ok(ResourceBacking {
            handle,
            device_address: 0x1000_0000 + handle * 0x1_0000,
        })
    }

    fn destroy_buffer_backing(&mut self, backing: u64) -> Result<()> {
        self.buffers
            .remove(&backing)
            .map(|_| ())
            .ok_or_else(|| GpuError::Backend("unknown buffer backing".to_string()))
    }

    fn map_buffer(&mut self, backing: u64) -> Result<()> {
        self.buffer(backing).map(|_| ())
    }

    fn unmap_buffer(&mut self, backing: u64) -> Result<()> {
        self.buffer(backing).map(|_| ())
    }

    fn write_buffer(&mut self, backing: u64, offset: u64, data: &[u8]) -> Result<()> {
        let storage = self
            .buffers
            .get_mut(&backing)
            .ok_or_else(|| GpuError::Backend("unknown buffer backing".to_string()))?;
        let offset = offset as usize;
        storage[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&self, backing: u64, offset: u64, size: u64) -> Result<Vec<u8>> {
        let storage = self.buffer(backing)?;
        let offset = offset as usize;
        Ok(storage[offset..offset + size as usize].to_vec())
    }

    fn copy_buffer(
        &mut self,
        src: u64,
        src_offset: u64,
        dst: u64,
        dst_offset: u64,
        size: u64,
    ) -> Result<()> {
        let data = self.read_buffer(src, src_offset, size)?;
        self.write_buffer(dst, dst_offset, &data)
    }

    fn create_texture_backing(
        &mut self,
        _desc: &TextureDesc,
        _heap_index: usize,
        size: u64,
    ) -> Result<ResourceBacking> {
        let handle = self.handle();
        self.textures.insert(handle, vec![0u8; size as usize]);
        Ok(ResourceBacking {
            handle,
            device_address: 0x2000_0000 + handle * 0x1_0000,
        })
    }

    fn destroy_texture_backing(&mut self, backing: u64) -> Result<()> {
        self.textures
            .remove(&backing)
            .map(|_| ())
            .ok_or_else(|| GpuError::Backend("unknown texture backing".to_string()))
    }

    fn write_texture(&mut self, backing: u64, data: &[u8]) -> Result<()> {
        let storage = self
            .textures
            .get_mut(&backing)
            .ok_or_else(|| GpuError::Backend("unknown texture backing".to_string()))?;
        storage[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read_texture(&self, backing: u64) -> Result<Vec<u8>> {
        self.textures
            .get(&backing)
            .cloned()
            .ok_or_else(|| GpuError::Backend("unknown texture backing".to_string()))
    }

    fn create_shader_backing(
        &mut self,
        stage: ShaderStage,
        bytecode: &[u8],
        _entry_point: &str,
    ) -> Result<u64> {
        if bytecode.starts_with(MOCK_BAD_BYTECODE) {
            return Err(GpuError::ShaderCompile(
                "mock: bytecode container rejected".to_string(),
            ));
        }
        let handle = self.handle();
        self.shaders.insert(handle, stage);
        Ok(handle)
    }

    fn destroy_shader_backing(&mut self, backing: u64) -> Result<()> {
        self.shaders
            .remove(&backing)
            .map(|_| ())
            .ok_or_else(|| GpuError::Backend("unknown shader backing".to_string()))
    }

    fn compile_source(
        &mut self,
        stage: ShaderStage,
        source: &str,
        entry_point: &str,
    ) -> Result<Vec<u8>> {
        if source.contains(MOCK_BAD_SOURCE) {
            return Err(GpuError::ShaderCompile(format!(
                "mock: syntax error near '{}'",
                MOCK_BAD_SOURCE
            )));
        }
        if !source.contains(entry_point) {
            return Err(GpuError::ShaderCompile(format!(
                "mock: entry point '{}' not found",
                entry_point
            )));
        }
        Ok(format!("MOCK:{:?}:{}", stage, source).into_bytes())
    }

    fn create_graphics_pipeline(
        &mut self,
        _desc: &GraphicsPipelineDesc,
        _stages: PipelineStages,
    ) -> Result<u64> {
        let handle = self.handle();
        self.pipelines.insert(handle, false);
        Ok(handle)
    }

    fn create_compute_pipeline(&mut self, _shader: u64) -> Result<u64> {
        let handle = self.handle();
        self.pipelines.insert(handle, true);
        Ok(handle)
    }

    fn destroy_pipeline(&mut self, backing: u64) -> Result<()> {
        self.pipelines
            .remove(&backing)
            .map(|_| ())
            .ok_or_else(|| GpuError::Backend("unknown pipeline backing".to_string()))
    }

    fn submit(&mut self, batch: SubmitBatch<'_>) -> Result<()> {
        if self.fail_next_submit {
            self.fail_next_submit = false;
            return Err(GpuError::Backend("mock: queue rejected batch".to_string()));
        }
        for command in batch.commands {
            let name = match command {
                RecordedCommand::BeginRenderPass(_) => "begin_render_pass",
                RecordedCommand::EndRenderPass => "end_render_pass",
                RecordedCommand::BindPipeline(_) => "bind_pipeline",
                RecordedCommand::BindVertexBuffers { .. } => "bind_vertex_buffers",
                RecordedCommand::BindIndexBuffer { .. } => "bind_index_buffer",
                RecordedCommand::SetViewport(_) => "set_viewport",
                RecordedCommand::SetScissor(_) => "set_scissor",
                RecordedCommand::Draw { .. } => "draw",
                RecordedCommand::DrawIndexed { .. } => "draw_indexed",
                RecordedCommand::Dispatch { .. } => "dispatch",
                RecordedCommand::Barrier => "barrier",
            };
            self.executed.push(name.to_string());
        }
        self.queued_fences.push(batch.fence);
        Ok(())
    }

    fn completed_fence(&self) -> u64 {
        self.signaled_fence
    }

    fn wait_fence(&mut self, fence: u64) -> Result<()> {
        // Pre-OS polling model: completion is observed at the wait point
        self.queued_fences.retain(|&queued| queued > fence);
        if fence > self.signaled_fence {
            self.signaled_fence = fence;
        }
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<()> {
        if let Some(&max) = self.queued_fences.iter().max() {
            self.wait_fence(max)?;
        }
        Ok(())
    }
}

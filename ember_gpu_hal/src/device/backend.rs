/// Backend traits - the seam between the HAL core and vendor drivers
///
/// The core owns all validation, lifetime and state-machine logic; a
/// backend only has to move bytes, accept shader bytecode and execute
/// recorded command streams. Backends are selected at
/// device-initialization time through a `GpuDriver`.

use rustc_hash::FxHashMap;

use crate::command::RecordedCommand;
use crate::device::DeviceInfo;
use crate::error::Result;
use crate::memory::Heap;
use crate::pipeline::{GraphicsPipelineDesc, PipelineId};
use crate::resource::{BufferId, BufferUsage, TextureDesc, TextureId};
use crate::shader::ShaderStage;

/// Backend storage handle plus the GPU virtual address of the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceBacking {
    /// Opaque backend handle
    pub handle: u64,
    /// GPU virtual address
    pub device_address: u64,
}

/// Backend shader handles of the stages referenced by a graphics pipeline
#[derive(Debug, Clone, Copy)]
pub struct PipelineStages {
    pub vertex: u64,
    pub fragment: Option<u64>,
    pub geometry: Option<u64>,
}

/// One submission handed to the backend.
///
/// Command streams reference resources by their core handles; the
/// lookup tables resolve them to backend handles for execution.
pub struct SubmitBatch<'a> {
    /// Fence value the backend signals when this batch completes
    pub fence: u64,
    /// Recorded command stream
    pub commands: &'a [RecordedCommand],
    /// Core buffer handle -> backend handle
    pub buffers: &'a FxHashMap<BufferId, u64>,
    /// Core texture handle -> backend handle
    pub textures: &'a FxHashMap<TextureId, u64>,
    /// Core pipeline handle -> backend PSO handle
    pub pipelines: &'a FxHashMap<PipelineId, u64>,
}

/// Driver entry point: probes the bus and opens devices.
///
/// One implementation per vendor family; the Session picks one at
/// device-initialization time.
pub trait GpuDriver: Send + Sync {
    /// Probe for devices.
    ///
    /// The order is stable for the lifetime of the driver; an empty
    /// result is not an error.
    fn enumerate(&self) -> Vec<DeviceInfo>;

    /// Open the device at `index` (an index into `enumerate()`'s result).
    ///
    /// # Errors
    ///
    /// `DeviceInitFailed` when the firmware/driver handshake fails.
    fn open(&self, index: usize) -> Result<Box<dyn GpuDevice>>;
}

/// An initialized device.
///
/// All methods operate on backend handles the device itself handed out;
/// the core guarantees it never passes a handle it did not receive from
/// this device, and never uses one after destroying it.
pub trait GpuDevice: Send + Sync {
    // ===== DEVICE =====

    /// Static description of this device
    fn info(&self) -> &DeviceInfo;

    /// Memory heap layout; `available` fields are initial capacities
    fn memory_heaps(&self) -> Vec<Heap>;

    /// Minimum allocation alignment (power of two)
    fn min_alignment(&self) -> u64;

    // ===== BUFFERS =====

    /// Create backing storage for a buffer in the given heap
    fn create_buffer_backing(
        &mut self,
        size: u64,
        usage: BufferUsage,
        heap_index: usize,
    ) -> Result<ResourceBacking>;

    /// Release buffer backing storage
    fn destroy_buffer_backing(&mut self, backing: u64) -> Result<()>;

    /// Pin a buffer for CPU access
    fn map_buffer(&mut self, backing: u64) -> Result<()>;

    /// Unpin a buffer after CPU access
    fn unmap_buffer(&mut self, backing: u64) -> Result<()>;

    /// Write bytes into a buffer at `offset`
    fn write_buffer(&mut self, backing: u64, offset: u64, data: &[u8]) -> Result<()>;

    /// Read bytes out of a buffer at `offset`
    fn read_buffer(&self, backing: u64, offset: u64, size: u64) -> Result<Vec<u8>>;

    /// Device-side copy between two buffers
    fn copy_buffer(
        &mut self,
        src: u64,
        src_offset: u64,
        dst: u64,
        dst_offset: u64,
        size: u64,
    ) -> Result<()>;

    // ===== TEXTURES =====

    /// Create backing storage for a texture in the given heap
    fn create_texture_backing(
        &mut self,
        desc: &TextureDesc,
        heap_index: usize,
        size: u64,
    ) -> Result<ResourceBacking>;

    /// Release texture backing storage
    fn destroy_texture_backing(&mut self, backing: u64) -> Result<()>;

    /// Upload texel data (tightly packed, level 0)
    fn write_texture(&mut self, backing: u64, data: &[u8]) -> Result<()>;

    /// Read back the full texel contents (tightly packed, level 0)
    fn read_texture(&self, backing: u64) -> Result<Vec<u8>>;

    // ===== SHADERS =====

    /// Validate bytecode and register it; fails `ShaderCompile` with a
    /// diagnostic when the container is rejected
    fn create_shader_backing(
        &mut self,
        stage: ShaderStage,
        bytecode: &[u8],
        entry_point: &str,
    ) -> Result<u64>;

    /// Release a registered shader
    fn destroy_shader_backing(&mut self, backing: u64) -> Result<()>;

    /// Translate shader source to bytecode; fails `ShaderCompile` with
    /// the backend diagnostic on syntax/semantic errors
    fn compile_source(
        &mut self,
        stage: ShaderStage,
        source: &str,
        entry_point: &str,
    ) -> Result<Vec<u8>>;

    // ===== PIPELINES =====

    /// Build a graphics pipeline-state object
    fn create_graphics_pipeline(
        &mut self,
        desc: &GraphicsPipelineDesc,
        stages: PipelineStages,
    ) -> Result<u64>;

    /// Build a compute pipeline-state object
    fn create_compute_pipeline(&mut self, shader: u64) -> Result<u64>;

    /// Tear down a pipeline-state object
    fn destroy_pipeline(&mut self, backing: u64) -> Result<()>;

    // ===== SUBMISSION =====

    /// Queue a recorded command stream for execution.
    ///
    /// Returns as soon as the work is queued; the batch fence signals
    /// on completion.
    fn submit(&mut self, batch: SubmitBatch<'_>) -> Result<()>;

    /// Highest fence value the device has signaled
    fn completed_fence(&self) -> u64;

    /// Block until the given fence value signals
    fn wait_fence(&mut self, fence: u64) -> Result<()>;

    /// Block until every queued batch has completed
    fn wait_idle(&mut self) -> Result<()>;
}

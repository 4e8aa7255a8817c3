/// Soft device - byte-vector storage and the deterministic shader
/// translator behind the GpuDevice trait

use rustc_hash::FxHashMap;

use ember_gpu_hal::ember::device::{
    DeviceInfo, GpuDevice, PipelineStages, ResourceBacking, SubmitBatch,
};
use ember_gpu_hal::ember::memory::{Heap, HeapKind};
use ember_gpu_hal::ember::pipeline::GraphicsPipelineDesc;
use ember_gpu_hal::ember::resource::{BufferUsage, TextureDesc};
use ember_gpu_hal::ember::shader::ShaderStage;
use ember_gpu_hal::ember::{GpuError, Result};

use crate::executor::{CommandExecutor, ExecStats};
use crate::stats;

/// Magic header of the soft bytecode container
pub(crate) const BYTECODE_MAGIC: &[u8; 4] = b"ESB1";

/// Virtual address space base for resource placement
const VA_BASE: u64 = 0x1_0000_0000;
/// Virtual address granularity
const VA_GRANULE: u64 = 64 * 1024;

pub(crate) struct SoftTexture {
    pub desc: TextureDesc,
    pub data: Vec<u8>,
}

struct SoftBuffer {
    data: Vec<u8>,
    pinned: bool,
}

/// A virtual GPU executing everything on the CPU.
///
/// Submitted command streams run synchronously, but fences still follow
/// the asynchronous contract: `completed_fence` only advances when the
/// host reaches a blocking wait, matching how a polled device behaves
/// before interrupts exist.
pub struct SoftDevice {
    info: DeviceInfo,
    next_handle: u64,
    next_va: u64,
    buffers: FxHashMap<u64, SoftBuffer>,
    textures: FxHashMap<u64, SoftTexture>,
    shaders: FxHashMap<u64, ShaderStage>,
    pipelines: FxHashMap<u64, bool>,
    stats: ExecStats,
    signaled_fence: u64,
    queued_fences: Vec<u64>,
    #[cfg(feature = "exec-trace")]
    trace: Vec<String>,
}

impl SoftDevice {
    /// Create a device over an adapter description
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            info,
            next_handle: 1,
            next_va: VA_BASE,
            buffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            shaders: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            stats: ExecStats::default(),
            signaled_fence: 0,
            queued_fences: Vec::new(),
            #[cfg(feature = "exec-trace")]
            trace: Vec::new(),
        }
    }

    /// Execution counters accumulated over the device lifetime
    pub fn stats(&self) -> &ExecStats {
        &self.stats
    }

    /// Executed command trace, newest last
    #[cfg(feature = "exec-trace")]
    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    fn handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn place(&mut self, size: u64) -> u64 {
        let address = self.next_va;
        let granules = size.div_ceil(VA_GRANULE).max(1);
        self.next_va += granules * VA_GRANULE;
        address
    }

    fn buffer(&self, backing: u64) -> Result<&SoftBuffer> {
        self.buffers
            .get(&backing)
            .ok_or_else(|| GpuError::Backend(format!("unknown buffer backing {}", backing)))
    }

    fn buffer_mut(&mut self, backing: u64) -> Result<&mut SoftBuffer> {
        self.buffers
            .get_mut(&backing)
            .ok_or_else(|| GpuError::Backend(format!("unknown buffer backing {}", backing)))
    }

    fn stage_tag(stage: ShaderStage) -> u8 {
        match stage {
            ShaderStage::Vertex => 0,
            ShaderStage::Fragment => 1,
            ShaderStage::Geometry => 2,
            ShaderStage::Compute => 3,
            ShaderStage::TessellationControl => 4,
            ShaderStage::TessellationEvaluation => 5,
        }
    }
}

impl GpuDevice for SoftDevice {
    // ===== DEVICE =====

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
            Heap {
                kind: HeapKind::Unified,
                size: self.info.shared_memory_size,
                available: self.info.shared_memory_size,
                device_local: true,
                host_visible: true,
                host_coherent: false,
            },
        ]
    }

    fn min_alignment(&self) -> u64 {
        256
    }

    // ===== BUFFERS =====

    fn create_buffer_backing(
        &mut self,
        size: u64,
        _usage: BufferUsage,
        _heap_index: usize,
    ) -> Result<ResourceBacking> {
        let handle = self.handle();
        let device_address = self.place(size);
        self.buffers.insert(
            handle,
            SoftBuffer {
                data: vec![0u8; size as usize],
                pinned: false,
            },
        );
        Ok(ResourceBacking { handle, device_address })
    }

    fn destroy_buffer_backing(&mut self, backing: u64) -> Result<()> {
        self.buffers
            .remove(&backing)
            .map(|_| ())
            .ok_or_else(|| GpuError::Backend(format!("unknown buffer backing {}", backing)))
    }

    fn map_buffer(&mut self, backing: u64) -> Result<()> {
        self.buffer_mut(backing)?.pinned = true;
        Ok(())
    }

    fn unmap_buffer(&mut self, backing: u64) -> Result<()> {
        self.buffer_mut(backing)?.pinned = false;
        Ok(())
    }

    fn write_buffer(&mut self, backing: u64, offset: u64, data: &[u8]) -> Result<()> {
        let buffer = self.buffer_mut(backing)?;
        let offset = offset as usize;
        let end = offset + data.len();
        if end > buffer.data.len() {
            return Err(GpuError::Backend(format!(
                "write past backing end ({} > {})",
                end,
                buffer.data.len()
            )));
        }
        buffer.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&self, backing: u64, offset: u64, size: u64) -> Result<Vec<u8>> {
        let buffer = self.buffer(backing)?;
        let offset = offset as usize;
        let end = offset + size as usize;
        if end > buffer.data.len() {
            return Err(GpuError::Backend(format!(
                "read past backing end ({} > {})",
                end,
                buffer.data.len()
            )));
        }
        Ok(buffer.data[offset..end].to_vec())
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

    // ===== TEXTURES =====

    fn create_texture_backing(
        &mut self,
        desc: &TextureDesc,
        _heap_index: usize,
        size: u64,
    ) -> Result<ResourceBacking> {
        let handle = self.handle();
        let device_address = self.place(size);
        self.textures.insert(
            handle,
            SoftTexture {
                desc: desc.clone(),
                data: vec![0u8; size as usize],
            },
        );
        Ok(ResourceBacking { handle, device_address })
    }

    fn destroy_texture_backing(&mut self, backing: u64) -> Result<()> {
        self.textures
            .remove(&backing)
            .map(|_| ())
            .ok_or_else(|| GpuError::Backend(format!("unknown texture backing {}", backing)))
    }

    fn write_texture(&mut self, backing: u64, data: &[u8]) -> Result<()> {
        let texture = self
            .textures
            .get_mut(&backing)
            .ok_or_else(|| GpuError::Backend(format!("unknown texture backing {}", backing)))?;
        if data.len() > texture.data.len() {
            return Err(GpuError::Backend(format!(
                "texture upload past backing end ({} > {})",
                data.len(),
                texture.data.len()
            )));
        }
        texture.data[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read_texture(&self, backing: u64) -> Result<Vec<u8>> {
        let texture = self
            .textures
            .get(&backing)
            .ok_or_else(|| GpuError::Backend(format!("unknown texture backing {}", backing)))?;
        let level0 = texture.desc.format.level_size_bytes(
            texture.desc.width,
            texture.desc.height,
            texture.desc.depth,
        ) as usize;
        Ok(texture.data[..level0.min(texture.data.len())].to_vec())
    }

    // ===== SHADERS =====

    fn create_shader_backing(
        &mut self,
        stage: ShaderStage,
        bytecode: &[u8],
        _entry_point: &str,
    ) -> Result<u64> {
        if bytecode.len() < 5 || &bytecode[..4] != BYTECODE_MAGIC {
            return Err(GpuError::ShaderCompile(
                "bytecode container missing ESB1 magic".to_string(),
            ));
        }
        if bytecode[4] != Self::stage_tag(stage) {
            return Err(GpuError::ShaderCompile(format!(
                "container stage tag {} does not match {:?}",
                bytecode[4], stage
            )));
        }
        let handle = self.handle();
        self.shaders.insert(handle, stage);
        Ok(handle)
    }

    fn destroy_shader_backing(&mut self, backing: u64) -> Result<()> {
        self.shaders
            .remove(&backing)
            .map(|_| ())
            .ok_or_else(|| GpuError::Backend(format!("unknown shader backing {}", backing)))
    }

    fn compile_source(
        &mut self,
        stage: ShaderStage,
        source: &str,
        entry_point: &str,
    ) -> Result<Vec<u8>> {
        if source.trim().is_empty() {
            return Err(GpuError::ShaderCompile("empty source".to_string()));
        }
        // `#error <msg>` aborts translation with the message as diagnostic
        for (line_number, line) in source.lines().enumerate() {
            if let Some(rest) = line.trim_start().strip_prefix("#error") {
                return Err(GpuError::ShaderCompile(format!(
                    "line {}: {}",
                    line_number + 1,
                    rest.trim()
                )));
            }
        }
        let opens = source.matches('{').count();
        let closes = source.matches('}').count();
        if opens != closes {
            return Err(GpuError::ShaderCompile(format!(
                "unbalanced braces ({} open, {} close)",
                opens, closes
            )));
        }
        if !source.contains(entry_point) {
            return Err(GpuError::ShaderCompile(format!(
                "entry point '{}' not found in source",
                entry_point
            )));
        }

        // Container: magic, stage tag, entry length, entry, source
        let mut bytecode = Vec::with_capacity(source.len() + entry_point.len() + 9);
        bytecode.extend_from_slice(BYTECODE_MAGIC);
        bytecode.push(Self::stage_tag(stage));
        bytecode.extend_from_slice(&(entry_point.len() as u32).to_le_bytes());
        bytecode.extend_from_slice(entry_point.as_bytes());
        bytecode.extend_from_slice(source.as_bytes());
        Ok(bytecode)
    }

    // ===== PIPELINES =====

    fn create_graphics_pipeline(
        &mut self,
        _desc: &GraphicsPipelineDesc,
        stages: PipelineStages,
    ) -> Result<u64> {
        for stage in [Some(stages.vertex), stages.fragment, stages.geometry]
            .into_iter()
            .flatten()
        {
            if !self.shaders.contains_key(&stage) {
                return Err(GpuError::Backend(format!("unknown shader backing {}", stage)));
            }
        }
        let handle = self.handle();
        self.pipelines.insert(handle, false);
        Ok(handle)
    }

    fn create_compute_pipeline(&mut self, shader: u64) -> Result<u64> {
        if !self.shaders.contains_key(&shader) {
            return Err(GpuError::Backend(format!("unknown shader backing {}", shader)));
        }
        let handle = self.handle();
        self.pipelines.insert(handle, true);
        Ok(handle)
    }

    fn destroy_pipeline(&mut self, backing: u64) -> Result<()> {
        self.pipelines
            .remove(&backing)
            .map(|_| ())
            .ok_or_else(|| GpuError::Backend(format!("unknown pipeline backing {}", backing)))
    }

    // ===== SUBMISSION =====

    fn submit(&mut self, batch: SubmitBatch<'_>) -> Result<()> {
        let mut executor = CommandExecutor::new(&mut self.textures, &mut self.stats);
        executor.run(batch.commands, batch.textures)?;
        #[cfg(feature = "exec-trace")]
        self.trace.extend(executor.take_trace());
        stats::accumulate_commands(batch.commands);
        self.queued_fences.push(batch.fence);
        Ok(())
    }

    fn completed_fence(&self) -> u64 {
        self.signaled_fence
    }

    fn wait_fence(&mut self, fence: u64) -> Result<()> {
        // Work already ran at submit; the wait is where the host
        // observes the fence
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

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;

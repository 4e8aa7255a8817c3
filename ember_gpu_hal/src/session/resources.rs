/// Session operations over buffers, textures, shaders and pipelines
///
/// Thin facades: validation and bookkeeping live in the owning
/// subsystem, the session contributes the active-device check and the
/// diagnostics plumbing.

use crate::error::Result;
use crate::external::FileProvider;
use crate::pipeline::{GraphicsPipelineDesc, Pipeline, PipelineId};
use crate::resource::{
    Buffer, BufferId, BufferUsage, Texture, TextureDesc, TextureFormat, TextureId,
};
use crate::session::Session;
use crate::shader::{ShaderId, ShaderModule, ShaderStage};

impl Session {
    // ===== BUFFERS =====

    /// Allocate a buffer against a heap matching `usage`.
    ///
    /// # Errors
    ///
    /// `InvalidParam` on zero size, `OutOfMemory` when no heap fits.
    pub fn allocate_buffer(&mut self, size: u64, usage: BufferUsage) -> Result<BufferId> {
        let result = self.device_mut().and_then(|device| {
            device
                .resources
                .allocate_buffer(device.backend.as_mut(), &mut device.allocator, size, usage)
        });
        self.finish(result)
    }

    /// Map a buffer for CPU access
    pub fn map_buffer(&mut self, buffer: BufferId) -> Result<()> {
        let result = self
            .device_mut()
            .and_then(|device| device.resources.map_buffer(device.backend.as_mut(), buffer));
        self.finish(result)
    }

    /// Unmap a buffer; unmapping an unmapped buffer is a no-op
    pub fn unmap_buffer(&mut self, buffer: BufferId) -> Result<()> {
        let result = self
            .device_mut()
            .and_then(|device| device.resources.unmap_buffer(device.backend.as_mut(), buffer));
        self.finish(result)
    }

    /// Write through a live mapping
    pub fn write_mapped(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            device
                .resources
                .write_mapped(device.backend.as_mut(), buffer, offset, data)
        });
        self.finish(result)
    }

    /// Upload bytes into a buffer, staging through host memory when the
    /// buffer is device-local
    pub fn upload_buffer_data(&mut self, buffer: BufferId, data: &[u8], offset: u64) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            device.resources.upload_buffer_data(
                device.backend.as_mut(),
                &mut device.allocator,
                buffer,
                data,
                offset,
            )
        });
        self.finish(result)
    }

    /// Free a buffer.
    ///
    /// # Errors
    ///
    /// `DeviceError` while mapped or referenced by an in-flight command
    /// buffer.
    pub fn free_buffer(&mut self, buffer: BufferId) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            device
                .resources
                .free_buffer(device.backend.as_mut(), &mut device.allocator, buffer)
        });
        self.finish(result)
    }

    /// Look up a buffer
    pub fn buffer(&self, buffer: BufferId) -> Option<&Buffer> {
        self.device.as_ref()?.resources.buffer(buffer)
    }

    // ===== TEXTURES =====

    /// Create a sampled texture
    pub fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureId> {
        let result = self.device_mut().and_then(|device| {
            device
                .resources
                .create_texture(device.backend.as_mut(), &mut device.allocator, desc)
        });
        self.finish(result)
    }

    /// Create a color render target
    pub fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId> {
        let result = self.device_mut().and_then(|device| {
            device.resources.create_render_target(
                device.backend.as_mut(),
                &mut device.allocator,
                width,
                height,
                format,
            )
        });
        self.finish(result)
    }

    /// Create a depth/stencil target
    pub fn create_depth_stencil(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId> {
        let result = self.device_mut().and_then(|device| {
            device.resources.create_depth_stencil(
                device.backend.as_mut(),
                &mut device.allocator,
                width,
                height,
                format,
            )
        });
        self.finish(result)
    }

    /// Upload tightly packed level-0 texel data
    pub fn upload_texture_data(&mut self, texture: TextureId, data: &[u8]) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            device
                .resources
                .upload_texture_data(device.backend.as_mut(), texture, data)
        });
        self.finish(result)
    }

    /// Destroy a texture.
    ///
    /// # Errors
    ///
    /// `DeviceError` while referenced by an in-flight command buffer.
    pub fn destroy_texture(&mut self, texture: TextureId) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            device
                .resources
                .destroy_texture(device.backend.as_mut(), &mut device.allocator, texture)
        });
        self.finish(result)
    }

    /// Look up a texture
    pub fn texture(&self, texture: TextureId) -> Option<&Texture> {
        self.device.as_ref()?.resources.texture(texture)
    }

    // ===== SHADERS =====

    /// Register pre-built shader bytecode
    pub fn create_shader(
        &mut self,
        stage: ShaderStage,
        bytecode: &[u8],
        entry_point: &str,
    ) -> Result<ShaderId> {
        let result = self.device_mut().and_then(|device| {
            device
                .shaders
                .create_shader(device.backend.as_mut(), stage, bytecode, entry_point)
        });
        self.finish(result)
    }

    /// Compile shader source to bytecode, then register it.
    ///
    /// On failure the backend diagnostic lands in the last-error slot.
    pub fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
        entry_point: &str,
    ) -> Result<ShaderId> {
        let result = self.device_mut().and_then(|device| {
            device
                .shaders
                .compile_shader(device.backend.as_mut(), stage, source, entry_point)
        });
        self.finish(result)
    }

    /// Load shader bytecode through the filesystem collaborator.
    ///
    /// `NotFound`/`AccessDenied` propagate unchanged.
    pub fn load_shader_from_file(
        &mut self,
        files: &dyn FileProvider,
        stage: ShaderStage,
        path: &str,
        entry_point: &str,
    ) -> Result<ShaderId> {
        let result = self.device_mut().and_then(|device| {
            device.shaders.load_shader_from_file(
                device.backend.as_mut(),
                files,
                stage,
                path,
                entry_point,
            )
        });
        self.finish(result)
    }

    /// Tear down a shader; pipelines already built from it stay valid
    pub fn destroy_shader(&mut self, shader: ShaderId) -> Result<()> {
        let result = self
            .device_mut()
            .and_then(|device| device.shaders.destroy_shader(device.backend.as_mut(), shader));
        self.finish(result)
    }

    /// Look up a shader
    pub fn shader(&self, shader: ShaderId) -> Option<&ShaderModule> {
        self.device.as_ref()?.shaders.get(shader)
    }

    // ===== PIPELINES =====

    /// Build or retrieve a cached graphics pipeline.
    ///
    /// Field-wise equal descriptions share one pipeline-state object.
    pub fn create_graphics_pipeline(&mut self, desc: GraphicsPipelineDesc) -> Result<PipelineId> {
        let result = self.device_mut().and_then(|device| {
            device
                .pipelines
                .create_graphics_pipeline(device.backend.as_mut(), &device.shaders, desc)
        });
        self.finish(result)
    }

    /// Build or retrieve a cached compute pipeline.
    ///
    /// # Errors
    ///
    /// `InvalidParam` when `shader` is not a compute shader.
    pub fn create_compute_pipeline(&mut self, shader: ShaderId) -> Result<PipelineId> {
        let result = self.device_mut().and_then(|device| {
            device
                .pipelines
                .create_compute_pipeline(device.backend.as_mut(), &device.shaders, shader)
        });
        self.finish(result)
    }

    /// Drop one cache reference; teardown happens when no reference and
    /// no in-flight command buffer remains
    pub fn destroy_pipeline(&mut self, pipeline: PipelineId) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            device
                .pipelines
                .destroy_pipeline(device.backend.as_mut(), pipeline)
        });
        self.finish(result)
    }

    /// Look up a pipeline
    pub fn pipeline(&self, pipeline: PipelineId) -> Option<&Pipeline> {
        self.device.as_ref()?.pipelines.get(pipeline)
    }
}

/// Shader store - loads, compiles and owns shader modules

use slotmap::SlotMap;

use crate::device::GpuDevice;
use crate::error::{GpuError, Result};
use crate::external::FileProvider;
use crate::shader::{ShaderId, ShaderModule, ShaderStage};

/// Owns every shader of the active device.
///
/// Handles stay valid until `destroy_shader`; pipelines capture what
/// they need at creation, so tearing down a shader does not invalidate
/// pipelines already built from it.
#[derive(Default)]
pub struct ShaderStore {
    shaders: SlotMap<ShaderId, ShaderModule>,
}

impl ShaderStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self { shaders: SlotMap::with_key() }
    }

    /// Register pre-built bytecode.
    ///
    /// The bytecode must be non-empty and acceptable to the backend;
    /// the returned handle has `is_compiled` set.
    ///
    /// # Errors
    ///
    /// `ShaderCompile` when the bytecode is empty or the backend
    /// rejects it.
    pub fn create_shader(
        &mut self,
        backend: &mut dyn GpuDevice,
        stage: ShaderStage,
        bytecode: &[u8],
        entry_point: &str,
    ) -> Result<ShaderId> {
        if bytecode.is_empty() {
            return Err(GpuError::ShaderCompile("empty bytecode".to_string()));
        }
        if entry_point.is_empty() {
            return Err(GpuError::InvalidParam("empty entry point".to_string()));
        }
        let backing = backend.create_shader_backing(stage, bytecode, entry_point)?;
        Ok(self.shaders.insert(ShaderModule {
            backing,
            stage,
            bytecode: bytecode.to_vec(),
            entry_point: entry_point.to_string(),
            is_compiled: true,
        }))
    }

    /// Compile shader source to bytecode, then register it.
    ///
    /// # Errors
    ///
    /// `ShaderCompile` carrying the backend diagnostic on syntax or
    /// semantic errors.
    pub fn compile_shader(
        &mut self,
        backend: &mut dyn GpuDevice,
        stage: ShaderStage,
        source: &str,
        entry_point: &str,
    ) -> Result<ShaderId> {
        if source.is_empty() {
            return Err(GpuError::ShaderCompile("empty source".to_string()));
        }
        let bytecode = backend.compile_source(stage, source, entry_point)?;
        self.create_shader(backend, stage, &bytecode, entry_point)
    }

    /// Load bytecode through the filesystem collaborator, then behave
    /// as `create_shader`.
    ///
    /// # Errors
    ///
    /// `NotFound`/`AccessDenied` propagate unchanged from the
    /// collaborator.
    pub fn load_shader_from_file(
        &mut self,
        backend: &mut dyn GpuDevice,
        files: &dyn FileProvider,
        stage: ShaderStage,
        path: &str,
        entry_point: &str,
    ) -> Result<ShaderId> {
        let bytecode = files.load_file_to_memory(path)?;
        self.create_shader(backend, stage, &bytecode, entry_point)
    }

    /// Look up a shader
    pub fn get(&self, id: ShaderId) -> Option<&ShaderModule> {
        self.shaders.get(id)
    }

    /// Look up a shader, failing `InvalidParam` on a stale handle
    pub fn expect(&self, id: ShaderId) -> Result<&ShaderModule> {
        self.shaders
            .get(id)
            .ok_or_else(|| GpuError::InvalidParam("stale shader handle".to_string()))
    }

    /// Tear down a shader.
    ///
    /// Pipelines already created from it stay valid.
    pub fn destroy_shader(&mut self, backend: &mut dyn GpuDevice, id: ShaderId) -> Result<()> {
        let shader = self
            .shaders
            .remove(id)
            .ok_or_else(|| GpuError::InvalidParam("stale shader handle".to_string()))?;
        backend.destroy_shader_backing(shader.backing)
    }

    /// Number of live shaders
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// Whether the store holds no shaders
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Tear down everything (device shutdown path)
    pub(crate) fn clear(&mut self, backend: &mut dyn GpuDevice) {
        for (_, shader) in self.shaders.drain() {
            // Shutdown must release every module even if one teardown fails
            let _ = backend.destroy_shader_backing(shader.backing);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

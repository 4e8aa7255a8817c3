/// Pipeline cache - builds, deduplicates and owns pipeline-state objects

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::device::{GpuDevice, PipelineStages};
use crate::error::{GpuError, Result};
use crate::pipeline::{GraphicsPipelineDesc, PipelineId};
use crate::shader::{ShaderId, ShaderStage, ShaderStore};

/// Cache identity of a pipeline-state object.
///
/// Equality is structural over the full description; two descriptions
/// that compare equal share one underlying object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PipelineKey {
    Graphics(GraphicsPipelineDesc),
    Compute(ShaderId),
}

/// A pipeline-state object owned by the cache
#[derive(Debug)]
pub struct Pipeline {
    /// Backend PSO handle
    pub(crate) backing: u64,
    /// Cache identity this object was built from
    pub key: PipelineKey,
    /// Compute (vs graphics) pipeline
    pub is_compute: bool,
    /// Live cache references (create minus destroy)
    refs: u32,
    /// Submitted, not-yet-completed command buffers referencing this PSO
    in_flight: u32,
    /// All cache references dropped while still in flight; tear down
    /// when the last in-flight reference drains
    pending_destroy: bool,
}

impl Pipeline {
    /// Whether a submitted command buffer still references this pipeline
    pub fn is_in_flight(&self) -> bool {
        self.in_flight > 0
    }

    /// Live cache reference count
    pub fn ref_count(&self) -> u32 {
        self.refs
    }
}

/// Builds pipeline-state objects and caches them by description identity.
#[derive(Default)]
pub struct PipelineCache {
    pipelines: SlotMap<PipelineId, Pipeline>,
    lookup: FxHashMap<PipelineKey, PipelineId>,
}

impl PipelineCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            pipelines: SlotMap::with_key(),
            lookup: FxHashMap::default(),
        }
    }

    /// Build or retrieve a graphics pipeline.
    ///
    /// Shader-slot invariants: every referenced shader must be live,
    /// compiled and of the right stage. A cache hit returns the existing
    /// object and bumps its reference count.
    ///
    /// # Errors
    ///
    /// `InvalidParam` on stale/miscompiled/mis-staged shaders or a zero
    /// sample count.
    pub fn create_graphics_pipeline(
        &mut self,
        backend: &mut dyn GpuDevice,
        shaders: &ShaderStore,
        desc: GraphicsPipelineDesc,
    ) -> Result<PipelineId> {
        if desc.sample_count == 0 {
            return Err(GpuError::InvalidParam("sample_count must be >= 1".to_string()));
        }
        let vertex = Self::expect_stage(shaders, desc.vertex_shader, ShaderStage::Vertex)?;
        let fragment = desc
            .fragment_shader
            .map(|id| Self::expect_stage(shaders, id, ShaderStage::Fragment))
            .transpose()?;
        let geometry = desc
            .geometry_shader
            .map(|id| Self::expect_stage(shaders, id, ShaderStage::Geometry))
            .transpose()?;

        let key = PipelineKey::Graphics(desc.clone());
        if let Some(&id) = self.lookup.get(&key) {
            self.pipelines[id].refs += 1;
            return Ok(id);
        }

        let backing = backend.create_graphics_pipeline(
            &desc,
            PipelineStages { vertex, fragment, geometry },
        )?;
        let id = self.pipelines.insert(Pipeline {
            backing,
            key: key.clone(),
            is_compute: false,
            refs: 1,
            in_flight: 0,
            pending_destroy: false,
        });
        self.lookup.insert(key, id);
        Ok(id)
    }

    /// Build or retrieve a compute pipeline.
    ///
    /// # Errors
    ///
    /// `InvalidParam` when the shader is stale, not compiled, or not a
    /// compute shader.
    pub fn create_compute_pipeline(
        &mut self,
        backend: &mut dyn GpuDevice,
        shaders: &ShaderStore,
        shader: ShaderId,
    ) -> Result<PipelineId> {
        let backing_shader = Self::expect_stage(shaders, shader, ShaderStage::Compute)?;

        let key = PipelineKey::Compute(shader);
        if let Some(&id) = self.lookup.get(&key) {
            self.pipelines[id].refs += 1;
            return Ok(id);
        }

        let backing = backend.create_compute_pipeline(backing_shader)?;
        let id = self.pipelines.insert(Pipeline {
            backing,
            key: key.clone(),
            is_compute: true,
            refs: 1,
            in_flight: 0,
            pending_destroy: false,
        });
        self.lookup.insert(key, id);
        Ok(id)
    }

    /// Drop one cache reference.
    ///
    /// The underlying object is torn down when no cache reference and
    /// no in-flight command buffer references it; with work still in
    /// flight, teardown is deferred until the last fence drains.
    pub fn destroy_pipeline(&mut self, backend: &mut dyn GpuDevice, id: PipelineId) -> Result<()> {
        let pipeline = self
            .pipelines
            .get_mut(id)
            .ok_or_else(|| GpuError::InvalidParam("stale pipeline handle".to_string()))?;
        pipeline.refs = pipeline.refs.saturating_sub(1);
        if pipeline.refs > 0 {
            return Ok(());
        }
        self.lookup.remove(&pipeline.key);
        if pipeline.in_flight > 0 {
            pipeline.pending_destroy = true;
            return Ok(());
        }
        match self.pipelines.remove(id) {
            Some(pipeline) => backend.destroy_pipeline(pipeline.backing),
            None => Ok(()),
        }
    }

    /// Look up a pipeline
    pub fn get(&self, id: PipelineId) -> Option<&Pipeline> {
        self.pipelines.get(id)
    }

    /// Look up a pipeline, failing `InvalidParam` on a stale handle
    pub fn expect(&self, id: PipelineId) -> Result<&Pipeline> {
        self.pipelines
            .get(id)
            .ok_or_else(|| GpuError::InvalidParam("stale pipeline handle".to_string()))
    }

    /// Number of live pipeline-state objects
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Whether the cache holds no objects
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Submission bookkeeping: one more in-flight reference
    pub(crate) fn mark_in_flight(&mut self, id: PipelineId) {
        if let Some(pipeline) = self.pipelines.get_mut(id) {
            pipeline.in_flight += 1;
        }
    }

    /// Completion bookkeeping: one in-flight reference drained.
    ///
    /// Performs the deferred teardown of objects whose last cache
    /// reference was dropped while in flight.
    pub(crate) fn release_in_flight(&mut self, backend: &mut dyn GpuDevice, id: PipelineId) {
        let Some(pipeline) = self.pipelines.get_mut(id) else {
            return;
        };
        pipeline.in_flight = pipeline.in_flight.saturating_sub(1);
        if pipeline.in_flight == 0 && pipeline.refs == 0 && pipeline.pending_destroy {
            if let Some(pipeline) = self.pipelines.remove(id) {
                let _ = backend.destroy_pipeline(pipeline.backing);
            }
        }
    }

    /// Tear down everything (device shutdown path)
    pub(crate) fn clear(&mut self, backend: &mut dyn GpuDevice) {
        self.lookup.clear();
        for (_, pipeline) in self.pipelines.drain() {
            let _ = backend.destroy_pipeline(pipeline.backing);
        }
    }

    fn expect_stage(shaders: &ShaderStore, id: ShaderId, stage: ShaderStage) -> Result<u64> {
        let shader = shaders.expect(id)?;
        if shader.stage != stage {
            return Err(GpuError::InvalidParam(format!(
                "expected a {:?} shader, got {:?}",
                stage, shader.stage
            )));
        }
        if !shader.is_compiled {
            return Err(GpuError::InvalidParam(
                "shader is not compiled".to_string(),
            ));
        }
        Ok(shader.backing)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

/// Command buffer - the recording state machine
///
/// Lifecycle: Initial -> (begin) Recording -> (end) Executable ->
/// (submit) Submitted -> (wait) Completed. A completed buffer may be
/// recorded into again. Every illegal call fails with DeviceError and
/// leaves both the state and the recorded content unchanged.

use slotmap::new_key_type;

use crate::command::{
    IndexType, RecordedCommand, RenderPassDesc, ScissorRect, Viewport,
};
use crate::error::{GpuError, Result};
use crate::pipeline::PipelineId;
use crate::resource::{BufferId, TextureId};

new_key_type! {
    /// Generation-checked handle to a command buffer owned by the Session
    pub struct CommandBufferId;
}

/// Nesting level of a command buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBufferLevel {
    /// Submittable top-level buffer
    Primary,
    /// Recorded for replay out of a primary buffer; cannot be submitted
    Secondary,
}

/// Lifecycle state of a command buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBufferState {
    Initial,
    Recording,
    Executable,
    Submitted,
    Completed,
}

/// Pipeline binding recorded while recording
#[derive(Debug, Clone, Copy)]
struct BoundPipeline {
    id: PipelineId,
    is_compute: bool,
}

/// A recorded, replayable sequence of device commands.
///
/// References (never owns) the pipelines, buffers and textures it binds;
/// those must stay alive until execution of this buffer completes.
#[derive(Debug)]
pub struct CommandBuffer {
    level: CommandBufferLevel,
    /// Created for the compute queue: render passes are rejected
    is_compute: bool,
    state: CommandBufferState,
    commands: Vec<RecordedCommand>,
    render_pass_open: bool,
    bound_pipeline: Option<BoundPipeline>,
    /// Fence value assigned at submission
    fence: Option<u64>,
    referenced_buffers: Vec<BufferId>,
    referenced_textures: Vec<TextureId>,
    referenced_pipelines: Vec<PipelineId>,
}

impl CommandBuffer {
    /// Create a command buffer in the Initial state
    ///
    /// # Arguments
    ///
    /// * `level` - Primary or secondary
    /// * `is_compute` - Created for the compute queue (no render passes)
    pub fn new(level: CommandBufferLevel, is_compute: bool) -> Self {
        Self {
            level,
            is_compute,
            state: CommandBufferState::Initial,
            commands: Vec::new(),
            render_pass_open: false,
            bound_pipeline: None,
            fence: None,
            referenced_buffers: Vec::new(),
            referenced_textures: Vec::new(),
            referenced_pipelines: Vec::new(),
        }
    }

    // ===== QUERIES =====

    /// Current lifecycle state
    pub fn state(&self) -> CommandBufferState {
        self.state
    }

    /// Nesting level
    pub fn level(&self) -> CommandBufferLevel {
        self.level
    }

    /// Whether this buffer targets the compute queue
    pub fn is_compute(&self) -> bool {
        self.is_compute
    }

    /// Whether recording is active
    pub fn is_recording(&self) -> bool {
        self.state == CommandBufferState::Recording
    }

    /// The recorded command stream
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Fence value assigned at submission, if any
    pub fn fence(&self) -> Option<u64> {
        self.fence
    }

    /// Pipeline currently bound at the recording point, if any
    pub fn bound_pipeline(&self) -> Option<PipelineId> {
        self.bound_pipeline.map(|bound| bound.id)
    }

    /// Buffers referenced by the recorded stream
    pub fn referenced_buffers(&self) -> &[BufferId] {
        &self.referenced_buffers
    }

    /// Textures referenced by the recorded stream
    pub fn referenced_textures(&self) -> &[TextureId] {
        &self.referenced_textures
    }

    /// Pipelines referenced by the recorded stream
    pub fn referenced_pipelines(&self) -> &[PipelineId] {
        &self.referenced_pipelines
    }

    // ===== LIFECYCLE TRANSITIONS =====

    /// Begin recording.
    ///
    /// Legal from Initial or Completed (reuse); resets the recorded
    /// content. Any other state fails DeviceError.
    pub fn begin_recording(&mut self) -> Result<()> {
        match self.state {
            CommandBufferState::Initial | CommandBufferState::Completed => {
                self.commands.clear();
                self.referenced_buffers.clear();
                self.referenced_textures.clear();
                self.referenced_pipelines.clear();
                self.render_pass_open = false;
                self.bound_pipeline = None;
                self.fence = None;
                self.state = CommandBufferState::Recording;
                Ok(())
            }
            state => Err(GpuError::DeviceError(format!(
                "begin_recording in state {:?}",
                state
            ))),
        }
    }

    /// End recording: Recording -> Executable.
    ///
    /// Fails if a render pass is still open.
    pub fn end_recording(&mut self) -> Result<()> {
        self.expect_recording("end_recording")?;
        if self.render_pass_open {
            return Err(GpuError::DeviceError(
                "end_recording with an open render pass".to_string(),
            ));
        }
        self.state = CommandBufferState::Executable;
        Ok(())
    }

    /// Submission bookkeeping: Executable -> Submitted.
    ///
    /// Only primary buffers submit; the fence value marks the point the
    /// Submission Engine will signal at completion.
    pub(crate) fn mark_submitted(&mut self, fence: u64) -> Result<()> {
        if self.level != CommandBufferLevel::Primary {
            return Err(GpuError::DeviceError(
                "secondary command buffers cannot be submitted".to_string(),
            ));
        }
        if self.state != CommandBufferState::Executable {
            return Err(GpuError::DeviceError(format!(
                "submit_command_buffer in state {:?}",
                self.state
            )));
        }
        self.fence = Some(fence);
        self.state = CommandBufferState::Submitted;
        Ok(())
    }

    /// Completion bookkeeping: Submitted -> Completed
    pub(crate) fn mark_completed(&mut self) {
        if self.state == CommandBufferState::Submitted {
            self.state = CommandBufferState::Completed;
        }
    }

    // ===== RECORDING =====

    /// Begin a render pass.
    ///
    /// The description must already be validated by the render pass
    /// controller. Nested passes are rejected, as is any pass on a
    /// compute command buffer.
    pub fn begin_render_pass(&mut self, desc: RenderPassDesc) -> Result<()> {
        self.expect_recording("begin_render_pass")?;
        if self.is_compute {
            return Err(GpuError::DeviceError(
                "render pass on a compute command buffer".to_string(),
            ));
        }
        if self.render_pass_open {
            return Err(GpuError::DeviceError(
                "render passes cannot nest".to_string(),
            ));
        }
        for &target in &desc.color_targets {
            self.reference_texture(target);
        }
        if let Some(depth) = desc.depth_target {
            self.reference_texture(depth);
        }
        self.commands.push(RecordedCommand::BeginRenderPass(desc));
        self.render_pass_open = true;
        Ok(())
    }

    /// End the current render pass
    pub fn end_render_pass(&mut self) -> Result<()> {
        self.expect_recording("end_render_pass")?;
        if !self.render_pass_open {
            return Err(GpuError::DeviceError(
                "end_render_pass without an open render pass".to_string(),
            ));
        }
        self.commands.push(RecordedCommand::EndRenderPass);
        self.render_pass_open = false;
        self.bound_pipeline = None;
        Ok(())
    }

    /// Bind a pipeline.
    ///
    /// Graphics pipelines bind only inside a render pass, compute
    /// pipelines only outside one.
    pub fn bind_pipeline(&mut self, pipeline: PipelineId, is_compute: bool) -> Result<()> {
        self.expect_recording("bind_pipeline")?;
        if !is_compute && !self.render_pass_open {
            return Err(GpuError::DeviceError(
                "graphics pipeline bound outside a render pass".to_string(),
            ));
        }
        if is_compute && self.render_pass_open {
            return Err(GpuError::DeviceError(
                "compute pipeline bound inside a render pass".to_string(),
            ));
        }
        self.reference_pipeline(pipeline);
        self.commands.push(RecordedCommand::BindPipeline(pipeline));
        self.bound_pipeline = Some(BoundPipeline { id: pipeline, is_compute });
        Ok(())
    }

    /// Bind vertex buffers starting at `first_binding`
    pub fn bind_vertex_buffers(&mut self, first_binding: u32, buffers: &[BufferId]) -> Result<()> {
        self.expect_in_pass("bind_vertex_buffers")?;
        for &buffer in buffers {
            self.reference_buffer(buffer);
        }
        self.commands.push(RecordedCommand::BindVertexBuffers {
            first_binding,
            buffers: buffers.to_vec(),
        });
        Ok(())
    }

    /// Bind an index buffer
    pub fn bind_index_buffer(
        &mut self,
        buffer: BufferId,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        self.expect_in_pass("bind_index_buffer")?;
        self.reference_buffer(buffer);
        self.commands.push(RecordedCommand::BindIndexBuffer {
            buffer,
            offset,
            index_type,
        });
        Ok(())
    }

    /// Set the viewport
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.expect_in_pass("set_viewport")?;
        self.commands.push(RecordedCommand::SetViewport(viewport));
        Ok(())
    }

    /// Set the scissor rectangle
    pub fn set_scissor(&mut self, scissor: ScissorRect) -> Result<()> {
        self.expect_in_pass("set_scissor")?;
        self.commands.push(RecordedCommand::SetScissor(scissor));
        Ok(())
    }

    /// Draw vertices
    pub fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<()> {
        self.expect_graphics_ready("draw")?;
        self.commands.push(RecordedCommand::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
        Ok(())
    }

    /// Draw indexed vertices
    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        self.expect_graphics_ready("draw_indexed")?;
        self.commands.push(RecordedCommand::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        });
        Ok(())
    }

    /// Dispatch compute work.
    ///
    /// Legal only with a bound compute pipeline and no active render pass.
    pub fn dispatch(
        &mut self,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) -> Result<()> {
        self.expect_recording("dispatch")?;
        if self.render_pass_open {
            return Err(GpuError::DeviceError(
                "dispatch inside a render pass".to_string(),
            ));
        }
        match self.bound_pipeline {
            Some(bound) if bound.is_compute => {}
            _ => {
                return Err(GpuError::DeviceError(
                    "dispatch without a bound compute pipeline".to_string(),
                ))
            }
        }
        self.commands.push(RecordedCommand::Dispatch {
            group_count_x,
            group_count_y,
            group_count_z,
        });
        Ok(())
    }

    /// Record a dependency point: prior writes in this buffer become
    /// visible to subsequent reads
    pub fn insert_barrier(&mut self) -> Result<()> {
        self.expect_recording("insert_barrier")?;
        self.commands.push(RecordedCommand::Barrier);
        Ok(())
    }

    // ===== INTERNAL =====

    fn expect_recording(&self, op: &str) -> Result<()> {
        if self.state != CommandBufferState::Recording {
            return Err(GpuError::DeviceError(format!(
                "{} in state {:?}",
                op, self.state
            )));
        }
        Ok(())
    }

    fn expect_in_pass(&self, op: &str) -> Result<()> {
        self.expect_recording(op)?;
        if !self.render_pass_open {
            return Err(GpuError::DeviceError(format!(
                "{} outside a render pass",
                op
            )));
        }
        Ok(())
    }

    fn expect_graphics_ready(&self, op: &str) -> Result<()> {
        self.expect_in_pass(op)?;
        match self.bound_pipeline {
            Some(bound) if !bound.is_compute => Ok(()),
            _ => Err(GpuError::DeviceError(format!(
                "{} without a bound graphics pipeline",
                op
            ))),
        }
    }

    fn reference_buffer(&mut self, id: BufferId) {
        if !self.referenced_buffers.contains(&id) {
            self.referenced_buffers.push(id);
        }
    }

    fn reference_texture(&mut self, id: TextureId) {
        if !self.referenced_textures.contains(&id) {
            self.referenced_textures.push(id);
        }
    }

    fn reference_pipeline(&mut self, id: PipelineId) {
        if !self.referenced_pipelines.contains(&id) {
            self.referenced_pipelines.push(id);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "command_buffer_tests.rs"]
mod tests;

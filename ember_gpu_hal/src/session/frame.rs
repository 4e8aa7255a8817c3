/// Session operations over command buffers: recording, submission and
/// the blocking wait points
///
/// Recording is single-threaded cooperative: exactly one execution
/// context records into a given command buffer at a time. Submission
/// returns immediately; `wait_for_completion` and `wait_idle` are the
/// only blocking suspension points, and they are where in-flight
/// resource references drain.

use rustc_hash::FxHashMap;

use crate::command::{
    validate_render_pass, CommandBuffer, CommandBufferId, CommandBufferLevel, CommandBufferState,
    IndexType, RenderPassDesc, ScissorRect, Viewport,
};
use crate::device::SubmitBatch;
use crate::error::{GpuError, Result};
use crate::pipeline::PipelineId;
use crate::resource::{BufferId, TextureFormat, TextureId};
use crate::session::{ActiveDevice, Session, SessionEvent};

/// Render-target readback produced by `capture_screenshot`.
///
/// The console collaborator consumes only `path`; the pixel data is for
/// whatever sink the caller wires up.
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Destination path the caller asked for
    pub path: String,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Pixel format of `data`
    pub format: TextureFormat,
    /// Tightly packed level-0 texel data
    pub data: Vec<u8>,
}

impl Session {
    // ===== COMMAND BUFFER LIFECYCLE =====

    /// Create a command buffer in the Initial state
    ///
    /// # Arguments
    ///
    /// * `level` - Primary (submittable) or secondary
    /// * `is_compute` - Created for the compute queue (no render passes)
    pub fn create_command_buffer(
        &mut self,
        level: CommandBufferLevel,
        is_compute: bool,
    ) -> Result<CommandBufferId> {
        let result = self.device_mut().map(|device| {
            device
                .command_buffers
                .insert(CommandBuffer::new(level, is_compute))
        });
        self.finish(result)
    }

    /// Destroy a command buffer.
    ///
    /// # Errors
    ///
    /// `DeviceError` while the buffer is submitted and not yet observed
    /// complete.
    pub fn destroy_command_buffer(&mut self, command_buffer: CommandBufferId) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            let cb = Self::expect_command_buffer(device, command_buffer)?;
            if cb.state() == CommandBufferState::Submitted {
                return Err(GpuError::DeviceError(
                    "command buffer is in flight; wait for completion first".to_string(),
                ));
            }
            device.command_buffers.remove(command_buffer);
            Ok(())
        });
        self.finish(result)
    }

    /// Look up a command buffer
    pub fn command_buffer(&self, command_buffer: CommandBufferId) -> Option<&CommandBuffer> {
        self.device.as_ref()?.command_buffers.get(command_buffer)
    }

    // ===== RECORDING =====

    /// Begin recording; legal from Initial or Completed, resets content
    pub fn begin_recording(&mut self, command_buffer: CommandBufferId) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            Self::expect_command_buffer_mut(device, command_buffer)?.begin_recording()
        });
        self.finish(result)
    }

    /// End recording: Recording -> Executable
    pub fn end_recording(&mut self, command_buffer: CommandBufferId) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            Self::expect_command_buffer_mut(device, command_buffer)?.end_recording()
        });
        self.finish(result)
    }

    /// Begin a render pass after validating every attachment.
    ///
    /// # Errors
    ///
    /// `InvalidParam` on dimension/role mismatches (render pass
    /// controller), `DeviceError` on state-machine violations.
    pub fn begin_render_pass(
        &mut self,
        command_buffer: CommandBufferId,
        desc: RenderPassDesc,
    ) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            validate_render_pass(&desc, |id| device.resources.texture(id))?;
            Self::expect_command_buffer_mut(device, command_buffer)?.begin_render_pass(desc)
        });
        self.finish(result)
    }

    /// End the current render pass
    pub fn end_render_pass(&mut self, command_buffer: CommandBufferId) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            Self::expect_command_buffer_mut(device, command_buffer)?.end_render_pass()
        });
        self.finish(result)
    }

    /// Bind a pipeline for subsequent draws or dispatches
    pub fn bind_pipeline(
        &mut self,
        command_buffer: CommandBufferId,
        pipeline: PipelineId,
    ) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            let is_compute = device.pipelines.expect(pipeline)?.is_compute;
            Self::expect_command_buffer_mut(device, command_buffer)?
                .bind_pipeline(pipeline, is_compute)
        });
        self.finish(result)
    }

    /// Bind vertex buffers starting at `first_binding`
    pub fn bind_vertex_buffers(
        &mut self,
        command_buffer: CommandBufferId,
        first_binding: u32,
        buffers: &[BufferId],
    ) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            for &buffer in buffers {
                device.resources.expect_buffer_ref(buffer)?;
            }
            Self::expect_command_buffer_mut(device, command_buffer)?
                .bind_vertex_buffers(first_binding, buffers)
        });
        self.finish(result)
    }

    /// Bind an index buffer
    pub fn bind_index_buffer(
        &mut self,
        command_buffer: CommandBufferId,
        buffer: BufferId,
        offset: u64,
        index_type: IndexType,
    ) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            device.resources.expect_buffer_ref(buffer)?;
            Self::expect_command_buffer_mut(device, command_buffer)?
                .bind_index_buffer(buffer, offset, index_type)
        });
        self.finish(result)
    }

    /// Set the viewport
    pub fn set_viewport(
        &mut self,
        command_buffer: CommandBufferId,
        viewport: Viewport,
    ) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            Self::expect_command_buffer_mut(device, command_buffer)?.set_viewport(viewport)
        });
        self.finish(result)
    }

    /// Set the scissor rectangle
    pub fn set_scissor(
        &mut self,
        command_buffer: CommandBufferId,
        scissor: ScissorRect,
    ) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            Self::expect_command_buffer_mut(device, command_buffer)?.set_scissor(scissor)
        });
        self.finish(result)
    }

    /// Draw vertices
    pub fn draw(
        &mut self,
        command_buffer: CommandBufferId,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            Self::expect_command_buffer_mut(device, command_buffer)?.draw(
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            )
        });
        self.finish(result)
    }

    /// Draw indexed vertices
    pub fn draw_indexed(
        &mut self,
        command_buffer: CommandBufferId,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            Self::expect_command_buffer_mut(device, command_buffer)?.draw_indexed(
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            )
        });
        self.finish(result)
    }

    /// Dispatch compute work
    pub fn dispatch(
        &mut self,
        command_buffer: CommandBufferId,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            Self::expect_command_buffer_mut(device, command_buffer)?.dispatch(
                group_count_x,
                group_count_y,
                group_count_z,
            )
        });
        self.finish(result)
    }

    /// Record a dependency point making prior writes visible to
    /// subsequent reads in the same command buffer
    pub fn insert_barrier(&mut self, command_buffer: CommandBufferId) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            Self::expect_command_buffer_mut(device, command_buffer)?.insert_barrier()
        });
        self.finish(result)
    }

    // ===== SUBMISSION =====

    /// Submit an executable command buffer to the device queue.
    ///
    /// Returns the fence value assigned to the submission; the call
    /// itself never blocks. A backend submission failure faults the
    /// device: only `shutdown_device` + `initialize_device` recover.
    ///
    /// # Errors
    ///
    /// `DeviceError` when the buffer is not executable, is secondary,
    /// references destroyed or still-mapped resources, or the device
    /// rejects the batch.
    pub fn submit_command_buffer(&mut self, command_buffer: CommandBufferId) -> Result<u64> {
        let result = self
            .device_mut()
            .and_then(|device| Self::submit_inner(device, command_buffer));
        self.finish(result)
    }

    /// Block until the given command buffer's work completes.
    ///
    /// Transitions it (and every earlier submission) to Completed and
    /// drains the in-flight references they held.
    pub fn wait_for_completion(&mut self, command_buffer: CommandBufferId) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            let cb = Self::expect_command_buffer(device, command_buffer)?;
            if cb.state() != CommandBufferState::Submitted {
                return Err(GpuError::DeviceError(format!(
                    "wait_for_completion in state {:?}",
                    cb.state()
                )));
            }
            let fence = cb.fence().ok_or_else(|| {
                GpuError::DeviceError("submitted command buffer has no fence".to_string())
            })?;
            device.backend.wait_fence(fence)?;
            let retired = device.submission.retire_up_to(fence);
            for retired_id in retired {
                Self::retire_command_buffer(device, retired_id);
            }
            Ok(fence)
        });
        match self.finish(result) {
            Ok(fence) => {
                self.push_event(SessionEvent::SubmissionRetired { fence });
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Block until every submitted command buffer completes.
    ///
    /// Used before destructive operations such as device shutdown or
    /// freeing possibly in-flight resources.
    pub fn wait_idle(&mut self) -> Result<()> {
        let result = self.device_mut().and_then(|device| {
            device.backend.wait_idle()?;
            let retired = device.submission.retire_all();
            for retired_id in retired {
                Self::retire_command_buffer(device, retired_id);
            }
            Ok(device.submission.completed())
        });
        match self.finish(result) {
            Ok(fence) => {
                self.push_event(SessionEvent::SubmissionRetired { fence });
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    // ===== READBACK =====

    /// Read back a texture for the console collaborator.
    ///
    /// The returned capture carries the destination path verbatim plus
    /// the tightly packed level-0 pixels.
    pub fn capture_screenshot(&mut self, texture: TextureId, path: &str) -> Result<Screenshot> {
        let result = self.device_mut().and_then(|device| {
            let texture = device.resources.expect_texture_ref(texture)?;
            let data = device.backend.read_texture(texture.backing)?;
            Ok(Screenshot {
                path: path.to_string(),
                width: texture.desc.width,
                height: texture.desc.height,
                format: texture.desc.format,
                data,
            })
        });
        self.finish(result)
    }

    // ===== INTERNAL =====

    fn submit_inner(device: &mut ActiveDevice, command_buffer: CommandBufferId) -> Result<u64> {
        let cb = Self::expect_command_buffer(device, command_buffer)?;
        if cb.level() != CommandBufferLevel::Primary {
            return Err(GpuError::DeviceError(
                "secondary command buffers cannot be submitted".to_string(),
            ));
        }
        if cb.state() != CommandBufferState::Executable {
            return Err(GpuError::DeviceError(format!(
                "submit_command_buffer in state {:?}",
                cb.state()
            )));
        }
        let buffers = cb.referenced_buffers().to_vec();
        let textures = cb.referenced_textures().to_vec();
        let pipelines = cb.referenced_pipelines().to_vec();

        // Resolve references; a destroyed or still-mapped resource makes
        // the batch unexecutable
        let mut buffer_table: FxHashMap<BufferId, u64> = FxHashMap::default();
        for &id in &buffers {
            let buffer = device.resources.buffer(id).ok_or_else(|| {
                GpuError::DeviceError(
                    "command buffer references a destroyed buffer".to_string(),
                )
            })?;
            if buffer.is_mapped {
                return Err(GpuError::DeviceError(
                    "referenced buffer must be unmapped before submission".to_string(),
                ));
            }
            buffer_table.insert(id, buffer.backing);
        }
        let mut texture_table: FxHashMap<TextureId, u64> = FxHashMap::default();
        for &id in &textures {
            let texture = device.resources.texture(id).ok_or_else(|| {
                GpuError::DeviceError(
                    "command buffer references a destroyed texture".to_string(),
                )
            })?;
            texture_table.insert(id, texture.backing);
        }
        let mut pipeline_table: FxHashMap<PipelineId, u64> = FxHashMap::default();
        for &id in &pipelines {
            let pipeline = device.pipelines.get(id).ok_or_else(|| {
                GpuError::DeviceError(
                    "command buffer references a destroyed pipeline".to_string(),
                )
            })?;
            pipeline_table.insert(id, pipeline.backing);
        }

        let fence = device.submission.reserve_fence();
        let cb = &device.command_buffers[command_buffer];
        let batch = SubmitBatch {
            fence,
            commands: cb.commands(),
            buffers: &buffer_table,
            textures: &texture_table,
            pipelines: &pipeline_table,
        };
        if let Err(err) = device.backend.submit(batch) {
            // Submission failure faults the device; partial recovery is
            // not supported
            device.faulted = true;
            return Err(GpuError::DeviceError(format!("submission failed: {}", err)));
        }

        device.command_buffers[command_buffer].mark_submitted(fence)?;
        for id in buffers {
            device.resources.mark_buffer_in_flight(id);
        }
        for id in textures {
            device.resources.mark_texture_in_flight(id);
        }
        for id in pipelines {
            device.pipelines.mark_in_flight(id);
        }
        device.submission.record_submission(fence, command_buffer);
        Ok(fence)
    }

    fn retire_command_buffer(device: &mut ActiveDevice, command_buffer: CommandBufferId) {
        let Some(cb) = device.command_buffers.get_mut(command_buffer) else {
            return;
        };
        cb.mark_completed();
        let buffers = cb.referenced_buffers().to_vec();
        let textures = cb.referenced_textures().to_vec();
        let pipelines = cb.referenced_pipelines().to_vec();
        for id in buffers {
            device.resources.release_buffer_in_flight(id);
        }
        for id in textures {
            device.resources.release_texture_in_flight(id);
        }
        for id in pipelines {
            device
                .pipelines
                .release_in_flight(device.backend.as_mut(), id);
        }
    }

    fn expect_command_buffer(
        device: &ActiveDevice,
        command_buffer: CommandBufferId,
    ) -> Result<&CommandBuffer> {
        device
            .command_buffers
            .get(command_buffer)
            .ok_or_else(|| GpuError::InvalidParam("stale command buffer handle".to_string()))
    }

    fn expect_command_buffer_mut(
        device: &mut ActiveDevice,
        command_buffer: CommandBufferId,
    ) -> Result<&mut CommandBuffer> {
        device
            .command_buffers
            .get_mut(command_buffer)
            .ok_or_else(|| GpuError::InvalidParam("stale command buffer handle".to_string()))
    }
}

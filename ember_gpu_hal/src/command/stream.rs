/// Recorded command stream and the small fixed-function value types

use crate::command::RenderPassDesc;
use crate::pipeline::PipelineId;
use crate::resource::BufferId;

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with the default depth range
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Scissor rectangle
#[derive(Debug, Clone, Copy)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScissorRect {
    /// Full-target scissor
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices (max ~4 billion vertices)
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// One recorded device command.
///
/// The stream is replayed by the backend at submission; resources are
/// referenced by their generation-checked handles, never owned.
#[derive(Debug, Clone)]
pub enum RecordedCommand {
    BeginRenderPass(RenderPassDesc),
    EndRenderPass,
    BindPipeline(PipelineId),
    BindVertexBuffers {
        first_binding: u32,
        buffers: Vec<BufferId>,
    },
    BindIndexBuffer {
        buffer: BufferId,
        offset: u64,
        index_type: IndexType,
    },
    SetViewport(Viewport),
    SetScissor(ScissorRect),
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    Dispatch {
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    },
    /// Dependency point: prior writes in this command buffer are visible
    /// to subsequent reads
    Barrier,
}

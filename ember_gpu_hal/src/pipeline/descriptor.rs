/// Pipeline description types
///
/// Descriptions are plain data with structural equality and hashing:
/// the pipeline cache uses the full description as its identity.

use slotmap::new_key_type;

use crate::resource::TextureFormat;
use crate::shader::ShaderId;

new_key_type! {
    /// Generation-checked handle to a pipeline owned by the PipelineCache
    pub struct PipelineId;
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Point list
    Points,
    /// Line list
    Lines,
    /// Line strip
    LineStrip,
    /// Triangle list
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Triangle fan
    TriangleFan,
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Attribute location in the vertex shader
    pub location: u32,
    /// Binding index the data streams from
    pub binding: u32,
    /// Component format
    pub format: TextureFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex binding description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBinding {
    /// Binding index
    pub binding: u32,
    /// Stride in bytes between consecutive elements
    pub stride: u32,
    /// Data advances per instance instead of per vertex
    pub per_instance: bool,
}

/// Vertex input layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Vertex bindings
    pub bindings: Vec<VertexBinding>,
    /// Vertex attributes
    pub attributes: Vec<VertexAttribute>,
}

/// Descriptor for creating a graphics pipeline.
///
/// The vertex shader slot is mandatory by construction; compute shaders
/// go through `PipelineCache::create_compute_pipeline` instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphicsPipelineDesc {
    /// Vertex shader (required)
    pub vertex_shader: ShaderId,
    /// Optional fragment shader
    pub fragment_shader: Option<ShaderId>,
    /// Optional geometry shader
    pub geometry_shader: Option<ShaderId>,
    /// Vertex input layout
    pub vertex_layout: VertexLayout,
    /// Primitive topology
    pub topology: PrimitiveTopology,
    /// Enable depth testing
    pub depth_test: bool,
    /// Enable depth writes
    pub depth_write: bool,
    /// Enable color blending
    pub blend_enable: bool,
    /// Formats of the color targets this pipeline renders to
    pub color_formats: Vec<TextureFormat>,
    /// Format of the depth/stencil target, if any
    pub depth_format: Option<TextureFormat>,
    /// Samples per texel (1 = no multisampling)
    pub sample_count: u32,
}

impl GraphicsPipelineDesc {
    /// Minimal description: one shader pair, one color target, opaque,
    /// no depth
    pub fn simple(
        vertex_shader: ShaderId,
        fragment_shader: ShaderId,
        topology: PrimitiveTopology,
        color_format: TextureFormat,
    ) -> Self {
        Self {
            vertex_shader,
            fragment_shader: Some(fragment_shader),
            geometry_shader: None,
            vertex_layout: VertexLayout::default(),
            topology,
            depth_test: false,
            depth_write: false,
            blend_enable: false,
            color_formats: vec![color_format],
            depth_format: None,
            sample_count: 1,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;

//! Convenience layer over the Session
//!
//! Shortcuts for the common resource shapes: typed vertex/index/uniform
//! buffers, canonical pipelines and render passes. Everything here is
//! sugar over the public Session API; nothing touches backend state
//! directly.

use bytemuck::Pod;

use crate::command::RenderPassDesc;
use crate::error::{GpuError, Result};
use crate::pipeline::{GraphicsPipelineDesc, PipelineId, PrimitiveTopology};
use crate::resource::{BufferId, BufferUsage, TextureFormat, TextureId};
use crate::session::Session;
use crate::shader::{ShaderId, ShaderStage};

/// Built-in vertex shader source: position/texcoord/color through an MVP
/// matrix. Compiles on any backend that accepts the HAL source dialect.
pub const BASIC_VERTEX_SHADER_SOURCE: &str = "\
cbuffer VertexBuffer : register(b0) {
    float4x4 mvp_matrix;
};

struct VS_INPUT {
    float3 position : POSITION;
    float2 texcoord : TEXCOORD0;
    float4 color : COLOR;
};

struct VS_OUTPUT {
    float4 position : SV_POSITION;
    float2 texcoord : TEXCOORD0;
    float4 color : COLOR;
};

VS_OUTPUT main(VS_INPUT input) {
    VS_OUTPUT output;
    output.position = mul(float4(input.position, 1.0), mvp_matrix);
    output.texcoord = input.texcoord;
    output.color = input.color;
    return output;
}
";

/// Built-in fragment shader source: textured, vertex-color modulated
pub const BASIC_FRAGMENT_SHADER_SOURCE: &str = "\
Texture2D diffuse_texture : register(t0);
SamplerState texture_sampler : register(s0);

struct PS_INPUT {
    float4 position : SV_POSITION;
    float2 texcoord : TEXCOORD0;
    float4 color : COLOR;
};

float4 main(PS_INPUT input) : SV_TARGET {
    float4 texture_color = diffuse_texture.Sample(texture_sampler, input.texcoord);
    return texture_color * input.color;
}
";

/// Built-in vertex shader covering the full target with one triangle
pub const FULLSCREEN_VERTEX_SHADER_SOURCE: &str = "\
struct VS_OUTPUT {
    float4 position : SV_POSITION;
    float2 texcoord : TEXCOORD0;
};

VS_OUTPUT main(uint vertex_id : SV_VertexID) {
    VS_OUTPUT output;
    float2 uv = float2((vertex_id << 1) & 2, vertex_id & 2);
    output.position = float4(uv * 2.0 - 1.0, 0.0, 1.0);
    output.texcoord = uv;
    return output;
}
";

// ===== BUFFER HELPERS =====

/// Create a vertex buffer and upload `vertices` into it
pub fn create_vertex_buffer<T: Pod>(session: &mut Session, vertices: &[T]) -> Result<BufferId> {
    let bytes: &[u8] = bytemuck::cast_slice(vertices);
    let buffer = session.allocate_buffer(bytes.len() as u64, BufferUsage::VERTEX)?;
    session.upload_buffer_data(buffer, bytes, 0)?;
    Ok(buffer)
}

/// Create a 16-bit index buffer and upload `indices` into it
pub fn create_index_buffer16(session: &mut Session, indices: &[u16]) -> Result<BufferId> {
    let bytes: &[u8] = bytemuck::cast_slice(indices);
    let buffer = session.allocate_buffer(bytes.len() as u64, BufferUsage::INDEX)?;
    session.upload_buffer_data(buffer, bytes, 0)?;
    Ok(buffer)
}

/// Create a 32-bit index buffer and upload `indices` into it
pub fn create_index_buffer32(session: &mut Session, indices: &[u32]) -> Result<BufferId> {
    let bytes: &[u8] = bytemuck::cast_slice(indices);
    let buffer = session.allocate_buffer(bytes.len() as u64, BufferUsage::INDEX)?;
    session.upload_buffer_data(buffer, bytes, 0)?;
    Ok(buffer)
}

/// Create an empty uniform buffer of `size` bytes
pub fn create_uniform_buffer(session: &mut Session, size: u64) -> Result<BufferId> {
    session.allocate_buffer(size, BufferUsage::UNIFORM | BufferUsage::DYNAMIC)
}

/// Overwrite a uniform buffer with one typed value
pub fn update_uniform_buffer<T: Pod>(
    session: &mut Session,
    buffer: BufferId,
    value: &T,
) -> Result<()> {
    session.upload_buffer_data(buffer, bytemuck::bytes_of(value), 0)
}

// ===== PIPELINE HELPERS =====

/// One shader pair, one color target, no depth, no blending
pub fn create_simple_pipeline(
    session: &mut Session,
    vertex_shader: ShaderId,
    fragment_shader: ShaderId,
    topology: PrimitiveTopology,
    color_format: TextureFormat,
) -> Result<PipelineId> {
    session.create_graphics_pipeline(GraphicsPipelineDesc::simple(
        vertex_shader,
        fragment_shader,
        topology,
        color_format,
    ))
}

/// Fragment shader over a built-in fullscreen-triangle vertex stage
pub fn create_fullscreen_pipeline(
    session: &mut Session,
    fragment_shader: ShaderId,
    color_format: TextureFormat,
) -> Result<PipelineId> {
    let vertex_shader = session.compile_shader(
        ShaderStage::Vertex,
        FULLSCREEN_VERTEX_SHADER_SOURCE,
        "main",
    )?;
    session.create_graphics_pipeline(GraphicsPipelineDesc::simple(
        vertex_shader,
        fragment_shader,
        PrimitiveTopology::Triangles,
        color_format,
    ))
}

// ===== RENDER PASS HELPERS =====

/// Pass over an existing color target and optional depth target.
///
/// Dimensions come from the color target; clears default to opaque
/// black and the far plane.
pub fn create_simple_render_pass(
    session: &Session,
    color_target: TextureId,
    depth_target: Option<TextureId>,
) -> Result<RenderPassDesc> {
    let texture = session
        .texture(color_target)
        .ok_or_else(|| GpuError::InvalidParam("stale texture handle".to_string()))?;
    Ok(RenderPassDesc {
        width: texture.desc.width,
        height: texture.desc.height,
        color_targets: vec![color_target],
        depth_target,
        clear_color: Some([0.0, 0.0, 0.0, 1.0]),
        clear_depth: depth_target.map(|_| 1.0),
        clear_stencil: 0,
    })
}

/// Fresh offscreen target plus a pass that clears it
pub fn create_offscreen_render_pass(
    session: &mut Session,
    width: u32,
    height: u32,
    format: TextureFormat,
) -> Result<(TextureId, RenderPassDesc)> {
    let target = session.create_render_target(width, height, format)?;
    let desc = RenderPassDesc::cleared_color(target, width, height, [0.0, 0.0, 0.0, 1.0]);
    Ok((target, desc))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "helpers_tests.rs"]
mod tests;

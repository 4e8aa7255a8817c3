/// Shader stage and module types

use slotmap::new_key_type;

new_key_type! {
    /// Generation-checked handle to a shader owned by the ShaderStore
    pub struct ShaderId;
}

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment/pixel shader
    Fragment,
    /// Geometry shader
    Geometry,
    /// Compute shader
    Compute,
    /// Tessellation control shader
    TessellationControl,
    /// Tessellation evaluation shader
    TessellationEvaluation,
}

/// A shader owned by the ShaderStore.
///
/// A shader handle is usable in pipeline creation only once
/// `is_compiled` is true, which the store sets after the backend has
/// accepted the bytecode.
#[derive(Debug)]
pub struct ShaderModule {
    /// Backend shader handle
    pub(crate) backing: u64,
    /// Pipeline stage this shader runs at
    pub stage: ShaderStage,
    /// Accepted bytecode
    pub bytecode: Vec<u8>,
    /// Entry point function name
    pub entry_point: String,
    /// Whether the backend accepted the bytecode
    pub is_compiled: bool,
}

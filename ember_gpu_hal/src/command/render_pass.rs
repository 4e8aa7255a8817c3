/// Render pass descriptor and attachment validation

use crate::error::{GpuError, Result};
use crate::resource::{Texture, TextureId};

/// Describes the targets and clear semantics of one render pass.
///
/// Clear values are optional: a present value makes the pass issue an
/// implicit clear before the first draw, an absent one preserves the
/// prior contents of the attachment.
#[derive(Debug, Clone)]
pub struct RenderPassDesc {
    /// Ordered color targets
    pub color_targets: Vec<TextureId>,
    /// Optional depth/stencil target
    pub depth_target: Option<TextureId>,
    /// Target width; every attachment must match
    pub width: u32,
    /// Target height; every attachment must match
    pub height: u32,
    /// Clear color applied before the first draw, if any
    pub clear_color: Option<[f32; 4]>,
    /// Clear depth applied before the first draw, if any
    pub clear_depth: Option<f32>,
    /// Clear stencil value, used together with `clear_depth`
    pub clear_stencil: u8,
}

impl RenderPassDesc {
    /// Single color target cleared to the given color
    pub fn cleared_color(target: TextureId, width: u32, height: u32, color: [f32; 4]) -> Self {
        Self {
            color_targets: vec![target],
            depth_target: None,
            width,
            height,
            clear_color: Some(color),
            clear_depth: None,
            clear_stencil: 0,
        }
    }
}

/// Validate a render pass description against its attachments.
///
/// Checks, in order: at least one attachment, every handle resolves,
/// role flags (color targets must be render targets, the depth target a
/// depth/stencil texture), and that every attachment matches the pass
/// width/height. Dimension or role mismatch fails `InvalidParam`.
///
/// # Arguments
///
/// * `desc` - The pass description to check
/// * `resolve` - Handle-to-texture lookup (generation-checked)
pub fn validate_render_pass<'a, F>(desc: &RenderPassDesc, resolve: F) -> Result<()>
where
    F: Fn(TextureId) -> Option<&'a Texture>,
{
    if desc.color_targets.is_empty() && desc.depth_target.is_none() {
        return Err(GpuError::InvalidParam(
            "render pass needs at least one attachment".to_string(),
        ));
    }

    for (index, &id) in desc.color_targets.iter().enumerate() {
        let texture = resolve(id).ok_or_else(|| {
            GpuError::InvalidParam(format!("color target {} is not a live texture", index))
        })?;
        if !texture.is_render_target {
            return Err(GpuError::InvalidParam(format!(
                "color target {} was not created as a render target",
                index
            )));
        }
        if texture.desc.width != desc.width || texture.desc.height != desc.height {
            return Err(GpuError::InvalidParam(format!(
                "color target {} is {}x{}, pass is {}x{}",
                index, texture.desc.width, texture.desc.height, desc.width, desc.height
            )));
        }
    }

    if let Some(id) = desc.depth_target {
        let texture = resolve(id).ok_or_else(|| {
            GpuError::InvalidParam("depth target is not a live texture".to_string())
        })?;
        if !texture.is_depth_stencil {
            return Err(GpuError::InvalidParam(
                "depth target was not created as a depth/stencil texture".to_string(),
            ));
        }
        if texture.desc.width != desc.width || texture.desc.height != desc.height {
            return Err(GpuError::InvalidParam(format!(
                "depth target is {}x{}, pass is {}x{}",
                texture.desc.width, texture.desc.height, desc.width, desc.height
            )));
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;

/// Texture resource type and descriptor

use slotmap::new_key_type;

use crate::resource::TextureFormat;

new_key_type! {
    /// Generation-checked handle to a texture owned by the ResourceManager
    pub struct TextureId;
}

/// Descriptor for creating a texture
///
/// Format and sample count are immutable after creation; resizing means
/// destroy-and-recreate.
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Depth in texels (1 = 2D texture)
    pub depth: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Number of mip levels (>= 1)
    pub mip_levels: u32,
    /// Number of array layers (>= 1)
    pub array_size: u32,
    /// Samples per texel (1 = no multisampling)
    pub sample_count: u32,
}

impl TextureDesc {
    /// Plain 2D texture with one mip and one layer
    pub fn simple_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            depth: 1,
            format,
            mip_levels: 1,
            array_size: 1,
            sample_count: 1,
        }
    }

    /// Total byte size over all mips and layers.
    ///
    /// Each successive mip halves width/height/depth (floored at 1);
    /// multisampling multiplies the base level only, matching how the
    /// device stores resolve-capable targets.
    pub fn total_size_bytes(&self) -> u64 {
        let mut total = 0u64;
        let mut w = self.width.max(1);
        let mut h = self.height.max(1);
        let mut d = self.depth.max(1);
        for level in 0..self.mip_levels.max(1) {
            let mut level_size = self.format.level_size_bytes(w, h, d);
            if level == 0 {
                level_size *= self.sample_count.max(1) as u64;
            }
            total += level_size;
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            d = (d / 2).max(1);
        }
        total * self.array_size.max(1) as u64
    }
}

/// A GPU texture owned by the ResourceManager
#[derive(Debug)]
pub struct Texture {
    /// Backend storage handle
    pub(crate) backing: u64,
    /// Creation descriptor (immutable after creation)
    pub desc: TextureDesc,
    /// Total byte size over all mips and layers
    pub size: u64,
    /// Index of the heap the allocation was served from
    pub heap_index: usize,
    /// GPU virtual address
    pub device_address: u64,
    /// Usable as a color render target
    pub is_render_target: bool,
    /// Usable as a depth/stencil target
    pub is_depth_stencil: bool,
    /// Number of submitted, not-yet-completed command buffers that
    /// reference this texture
    pub(crate) in_flight: u32,
}

impl Texture {
    /// Whether a submitted command buffer still references this texture
    pub fn is_in_flight(&self) -> bool {
        self.in_flight > 0
    }
}

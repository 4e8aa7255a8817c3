/// Texture formats and per-format size computation

use std::fmt;

/// Texture and attachment format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    Unknown,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R32G32B32A32_FLOAT,
    R16G16B16A16_FLOAT,
    R32G32_FLOAT,
    R32_FLOAT,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
    BC1_UNORM,
    BC2_UNORM,
    BC3_UNORM,
    BC4_UNORM,
    BC5_UNORM,
    BC6H_UF16,
    BC7_UNORM,
}

impl TextureFormat {
    /// Whether this format can back a depth/stencil attachment
    pub fn is_depth_stencil(self) -> bool {
        matches!(self, TextureFormat::D32_FLOAT | TextureFormat::D24_UNORM_S8_UINT)
    }

    /// Whether this is a block-compressed format (4x4 texel blocks)
    pub fn is_block_compressed(self) -> bool {
        matches!(
            self,
            TextureFormat::BC1_UNORM
                | TextureFormat::BC2_UNORM
                | TextureFormat::BC3_UNORM
                | TextureFormat::BC4_UNORM
                | TextureFormat::BC5_UNORM
                | TextureFormat::BC6H_UF16
                | TextureFormat::BC7_UNORM
        )
    }

    /// Bytes per texel for uncompressed formats, bytes per 4x4 block for
    /// block-compressed formats.
    pub fn unit_size_bytes(self) -> u64 {
        match self {
            TextureFormat::Unknown => 0,
            TextureFormat::R8G8B8A8_UNORM
            | TextureFormat::R8G8B8A8_SRGB
            | TextureFormat::B8G8R8A8_UNORM
            | TextureFormat::B8G8R8A8_SRGB => 4,
            TextureFormat::R32G32B32A32_FLOAT => 16,
            TextureFormat::R16G16B16A16_FLOAT => 8,
            TextureFormat::R32G32_FLOAT => 8,
            TextureFormat::R32_FLOAT => 4,
            TextureFormat::D32_FLOAT => 4,
            TextureFormat::D24_UNORM_S8_UINT => 4,
            TextureFormat::BC1_UNORM | TextureFormat::BC4_UNORM => 8,
            TextureFormat::BC2_UNORM
            | TextureFormat::BC3_UNORM
            | TextureFormat::BC5_UNORM
            | TextureFormat::BC6H_UF16
            | TextureFormat::BC7_UNORM => 16,
        }
    }

    /// Byte size of one mip level of the given dimensions.
    ///
    /// Block-compressed formats round each dimension up to whole 4x4
    /// blocks; depth is a plain multiplier in both cases.
    pub fn level_size_bytes(self, width: u32, height: u32, depth: u32) -> u64 {
        let depth = depth.max(1) as u64;
        if self.is_block_compressed() {
            let blocks_w = width.div_ceil(4) as u64;
            let blocks_h = height.div_ceil(4) as u64;
            blocks_w * blocks_h * depth * self.unit_size_bytes()
        } else {
            width as u64 * height as u64 * depth * self.unit_size_bytes()
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextureFormat::Unknown => "UNKNOWN",
            TextureFormat::R8G8B8A8_UNORM => "R8G8B8A8_UNORM",
            TextureFormat::R8G8B8A8_SRGB => "R8G8B8A8_SRGB",
            TextureFormat::B8G8R8A8_UNORM => "B8G8R8A8_UNORM",
            TextureFormat::B8G8R8A8_SRGB => "B8G8R8A8_SRGB",
            TextureFormat::R32G32B32A32_FLOAT => "R32G32B32A32_FLOAT",
            TextureFormat::R16G16B16A16_FLOAT => "R16G16B16A16_FLOAT",
            TextureFormat::R32G32_FLOAT => "R32G32_FLOAT",
            TextureFormat::R32_FLOAT => "R32_FLOAT",
            TextureFormat::D32_FLOAT => "D32_FLOAT",
            TextureFormat::D24_UNORM_S8_UINT => "D24_UNORM_S8_UINT",
            TextureFormat::BC1_UNORM => "BC1_UNORM",
            TextureFormat::BC2_UNORM => "BC2_UNORM",
            TextureFormat::BC3_UNORM => "BC3_UNORM",
            TextureFormat::BC4_UNORM => "BC4_UNORM",
            TextureFormat::BC5_UNORM => "BC5_UNORM",
            TextureFormat::BC6H_UF16 => "BC6H_UF16",
            TextureFormat::BC7_UNORM => "BC7_UNORM",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;

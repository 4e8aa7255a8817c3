//! Unit tests for texture formats

use crate::resource::TextureFormat;

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[test]
fn test_depth_stencil_classification() {
    assert!(TextureFormat::D32_FLOAT.is_depth_stencil());
    assert!(TextureFormat::D24_UNORM_S8_UINT.is_depth_stencil());

    assert!(!TextureFormat::R8G8B8A8_UNORM.is_depth_stencil());
    assert!(!TextureFormat::B8G8R8A8_SRGB.is_depth_stencil());
    assert!(!TextureFormat::BC7_UNORM.is_depth_stencil());
}

#[test]
fn test_block_compressed_classification() {
    assert!(TextureFormat::BC1_UNORM.is_block_compressed());
    assert!(TextureFormat::BC6H_UF16.is_block_compressed());
    assert!(!TextureFormat::R8G8B8A8_UNORM.is_block_compressed());
    assert!(!TextureFormat::D32_FLOAT.is_block_compressed());
}

// ============================================================================
// SIZE COMPUTATION
// ============================================================================

#[test]
fn test_uncompressed_level_sizes() {
    // 4 bytes per texel
    assert_eq!(TextureFormat::R8G8B8A8_UNORM.level_size_bytes(256, 128, 1), 256 * 128 * 4);
    // 16 bytes per texel
    assert_eq!(TextureFormat::R32G32B32A32_FLOAT.level_size_bytes(16, 16, 1), 16 * 16 * 16);
    // depth multiplies
    assert_eq!(TextureFormat::R32_FLOAT.level_size_bytes(8, 8, 4), 8 * 8 * 4 * 4);
}

#[test]
fn test_block_compressed_level_sizes() {
    // BC1: 8 bytes per 4x4 block
    assert_eq!(TextureFormat::BC1_UNORM.level_size_bytes(256, 256, 1), 64 * 64 * 8);
    // BC7: 16 bytes per 4x4 block
    assert_eq!(TextureFormat::BC7_UNORM.level_size_bytes(256, 256, 1), 64 * 64 * 16);
}

#[test]
fn test_block_compressed_rounds_up_to_whole_blocks() {
    // 5x5 needs 2x2 blocks
    assert_eq!(TextureFormat::BC1_UNORM.level_size_bytes(5, 5, 1), 2 * 2 * 8);
    // 1x1 still needs one block
    assert_eq!(TextureFormat::BC3_UNORM.level_size_bytes(1, 1, 1), 16);
}

#[test]
fn test_zero_depth_is_clamped_to_one() {
    assert_eq!(
        TextureFormat::R8G8B8A8_UNORM.level_size_bytes(4, 4, 0),
        TextureFormat::R8G8B8A8_UNORM.level_size_bytes(4, 4, 1)
    );
}

// ============================================================================
// DISPLAY
// ============================================================================

#[test]
fn test_format_display_names() {
    assert_eq!(format!("{}", TextureFormat::R8G8B8A8_UNORM), "R8G8B8A8_UNORM");
    assert_eq!(format!("{}", TextureFormat::D32_FLOAT), "D32_FLOAT");
    assert_eq!(format!("{}", TextureFormat::BC6H_UF16), "BC6H_UF16");
}

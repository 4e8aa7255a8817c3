/// Resource module - buffers, textures and their manager

// Module declarations
pub mod format;
pub mod buffer;
pub mod texture;
pub mod manager;

// Re-export everything
pub use format::*;
pub use buffer::*;
pub use texture::*;
pub use manager::*;

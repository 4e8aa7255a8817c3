/// Filesystem collaborator
///
/// The HAL core never walks a filesystem itself; shader and texture
/// loading helpers go through this seam. In a firmware environment the
/// implementation wraps the firmware file protocol; on a host it wraps
/// `std::fs`.

use crate::error::{GpuError, Result};

/// Loads whole files into memory for the shader/texture helpers
pub trait FileProvider: Send + Sync {
    /// Read the file at `path` into memory.
    ///
    /// # Errors
    ///
    /// `NotFound` when the path does not resolve, `AccessDenied` when
    /// the provider may not read it, `Filesystem` for everything else.
    fn load_file_to_memory(&self, path: &str) -> Result<Vec<u8>>;
}

/// Host-side provider over `std::fs`
pub struct StdFileProvider;

impl FileProvider for StdFileProvider {
    fn load_file_to_memory(&self, path: &str) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => GpuError::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => GpuError::AccessDenied(path.to_string()),
            _ => GpuError::Filesystem(format!("{}: {}", path, err)),
        })
    }
}

/// Provider for environments without any storage: every load fails
/// `NotFound`.
pub struct NullFileProvider;

impl FileProvider for NullFileProvider {
    fn load_file_to_memory(&self, path: &str) -> Result<Vec<u8>> {
        Err(GpuError::NotFound(path.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "filesystem_tests.rs"]
mod tests;

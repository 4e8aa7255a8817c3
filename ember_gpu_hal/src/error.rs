//! Error types for the Ember GPU HAL
//!
//! This module defines the error type used throughout the HAL together
//! with the raw 64-bit status words exchanged with firmware-level callers.

use std::fmt;

/// Result type for Ember GPU HAL operations
pub type Result<T> = std::result::Result<T, GpuError>;

/// Raw 64-bit status word.
///
/// Firmware-facing callers consume these instead of Rust error enums.
/// The high bit is set on every error code; `OK` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawStatus(pub u64);

impl RawStatus {
    pub const OK: RawStatus = RawStatus(0x0000_0000_0000_0000);
    pub const ERROR: RawStatus = RawStatus(0x8000_0000_0000_0001);
    pub const INVALID_PARAM: RawStatus = RawStatus(0x8000_0000_0000_0002);
    pub const NOT_SUPPORTED: RawStatus = RawStatus(0x8000_0000_0000_0003);
    pub const BUFFER_TOO_SMALL: RawStatus = RawStatus(0x8000_0000_0000_0005);
    pub const DEVICE_ERROR: RawStatus = RawStatus(0x8000_0000_0000_0007);
    pub const WRITE_PROTECTED: RawStatus = RawStatus(0x8000_0000_0000_0008);
    pub const OUT_OF_MEMORY: RawStatus = RawStatus(0x8000_0000_0000_0009);
    pub const ACCESS_DENIED: RawStatus = RawStatus(0x8000_0000_0000_000C);
    pub const NOT_FOUND: RawStatus = RawStatus(0x8000_0000_0000_000E);
    pub const TIMEOUT: RawStatus = RawStatus(0x8000_0000_0000_0012);
    pub const PROTOCOL_ERROR: RawStatus = RawStatus(0x8000_0000_0000_0024);
    pub const FILESYSTEM_ERROR: RawStatus = RawStatus(0x8000_0000_0000_0025);
    pub const BOOT_FAILURE: RawStatus = RawStatus(0x8000_0000_0000_0026);
    pub const GPU_NOT_FOUND: RawStatus = RawStatus(0x8000_0000_0000_0027);
    pub const GPU_INIT_FAILED: RawStatus = RawStatus(0x8000_0000_0000_0028);
    pub const SHADER_COMPILE_ERROR: RawStatus = RawStatus(0x8000_0000_0000_0029);
    pub const TEXTURE_ERROR: RawStatus = RawStatus(0x8000_0000_0000_002A);
    pub const BUFFER_OVERFLOW: RawStatus = RawStatus(0x8000_0000_0000_002B);

    /// Whether this status word denotes an error (high bit set)
    pub fn is_error(self) -> bool {
        self.0 & 0x8000_0000_0000_0000 != 0
    }
}

impl fmt::Display for RawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Ember GPU HAL errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    /// A parameter failed validation
    InvalidParam(String),

    /// The operation is not supported by the active device or heap
    NotSupported(String),

    /// No heap had enough available capacity for the allocation
    OutOfMemory,

    /// Illegal command-buffer transition, live-resource deletion, or
    /// other device state violation
    DeviceError(String),

    /// Device index out of range during initialization
    DeviceNotFound,

    /// Firmware/driver handshake failed while initializing a device
    DeviceInitFailed(String),

    /// Shader bytecode was rejected or source compilation failed; carries
    /// the backend diagnostic
    ShaderCompile(String),

    /// Texture creation or access failed
    TextureError(String),

    /// A write would exceed the bounds of the destination buffer
    BufferOverflow,

    /// A file or resource was not found by a collaborator
    NotFound(String),

    /// A collaborator denied access to a file or resource
    AccessDenied(String),

    /// Filesystem collaborator failure other than not-found/denied
    Filesystem(String),

    /// A blocking wait gave up
    Timeout,

    /// Backend-specific error that fits no other kind
    Backend(String),
}

impl GpuError {
    /// Map this error onto its raw 64-bit status word
    pub fn status(&self) -> RawStatus {
        match self {
            GpuError::InvalidParam(_) => RawStatus::INVALID_PARAM,
            GpuError::NotSupported(_) => RawStatus::NOT_SUPPORTED,
            GpuError::OutOfMemory => RawStatus::OUT_OF_MEMORY,
            GpuError::DeviceError(_) => RawStatus::DEVICE_ERROR,
            GpuError::DeviceNotFound => RawStatus::GPU_NOT_FOUND,
            GpuError::DeviceInitFailed(_) => RawStatus::GPU_INIT_FAILED,
            GpuError::ShaderCompile(_) => RawStatus::SHADER_COMPILE_ERROR,
            GpuError::TextureError(_) => RawStatus::TEXTURE_ERROR,
            GpuError::BufferOverflow => RawStatus::BUFFER_OVERFLOW,
            GpuError::NotFound(_) => RawStatus::NOT_FOUND,
            GpuError::AccessDenied(_) => RawStatus::ACCESS_DENIED,
            GpuError::Filesystem(_) => RawStatus::FILESYSTEM_ERROR,
            GpuError::Timeout => RawStatus::TIMEOUT,
            GpuError::Backend(_) => RawStatus::ERROR,
        }
    }
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::InvalidParam(msg) => write!(f, "Invalid parameter: {}", msg),
            GpuError::NotSupported(msg) => write!(f, "Not supported: {}", msg),
            GpuError::OutOfMemory => write!(f, "Out of GPU memory"),
            GpuError::DeviceError(msg) => write!(f, "Device error: {}", msg),
            GpuError::DeviceNotFound => write!(f, "GPU device not found"),
            GpuError::DeviceInitFailed(msg) => write!(f, "GPU initialization failed: {}", msg),
            GpuError::ShaderCompile(msg) => write!(f, "Shader compilation failed: {}", msg),
            GpuError::TextureError(msg) => write!(f, "Texture error: {}", msg),
            GpuError::BufferOverflow => write!(f, "Buffer overflow"),
            GpuError::NotFound(msg) => write!(f, "Not found: {}", msg),
            GpuError::AccessDenied(msg) => write!(f, "Access denied: {}", msg),
            GpuError::Filesystem(msg) => write!(f, "Filesystem error: {}", msg),
            GpuError::Timeout => write!(f, "Operation timed out"),
            GpuError::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

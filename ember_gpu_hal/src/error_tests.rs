//! Unit tests for error.rs
//!
//! Tests the GpuError variants, their Display output and the bit-exact
//! mapping onto the raw 64-bit status words.

use crate::error::{GpuError, RawStatus};

// ============================================================================
// RAW STATUS WORDS
// ============================================================================

#[test]
fn test_status_words_are_bit_exact() {
    assert_eq!(RawStatus::OK.0, 0x0000_0000_0000_0000);
    assert_eq!(RawStatus::ERROR.0, 0x8000_0000_0000_0001);
    assert_eq!(RawStatus::INVALID_PARAM.0, 0x8000_0000_0000_0002);
    assert_eq!(RawStatus::NOT_SUPPORTED.0, 0x8000_0000_0000_0003);
    assert_eq!(RawStatus::BUFFER_TOO_SMALL.0, 0x8000_0000_0000_0005);
    assert_eq!(RawStatus::DEVICE_ERROR.0, 0x8000_0000_0000_0007);
    assert_eq!(RawStatus::WRITE_PROTECTED.0, 0x8000_0000_0000_0008);
    assert_eq!(RawStatus::OUT_OF_MEMORY.0, 0x8000_0000_0000_0009);
    assert_eq!(RawStatus::ACCESS_DENIED.0, 0x8000_0000_0000_000C);
    assert_eq!(RawStatus::NOT_FOUND.0, 0x8000_0000_0000_000E);
    assert_eq!(RawStatus::TIMEOUT.0, 0x8000_0000_0000_0012);
    assert_eq!(RawStatus::PROTOCOL_ERROR.0, 0x8000_0000_0000_0024);
    assert_eq!(RawStatus::FILESYSTEM_ERROR.0, 0x8000_0000_0000_0025);
    assert_eq!(RawStatus::BOOT_FAILURE.0, 0x8000_0000_0000_0026);
    assert_eq!(RawStatus::GPU_NOT_FOUND.0, 0x8000_0000_0000_0027);
    assert_eq!(RawStatus::GPU_INIT_FAILED.0, 0x8000_0000_0000_0028);
    assert_eq!(RawStatus::SHADER_COMPILE_ERROR.0, 0x8000_0000_0000_0029);
    assert_eq!(RawStatus::TEXTURE_ERROR.0, 0x8000_0000_0000_002A);
    assert_eq!(RawStatus::BUFFER_OVERFLOW.0, 0x8000_0000_0000_002B);
}

#[test]
fn test_status_error_bit() {
    assert!(!RawStatus::OK.is_error());
    assert!(RawStatus::ERROR.is_error());
    assert!(RawStatus::BUFFER_OVERFLOW.is_error());
}

#[test]
fn test_status_display_is_hex() {
    let display = format!("{}", RawStatus::OUT_OF_MEMORY);
    assert_eq!(display, "0x8000000000000009");
}

// ============================================================================
// ERROR -> STATUS MAPPING
// ============================================================================

#[test]
fn test_error_status_mapping() {
    assert_eq!(
        GpuError::InvalidParam("x".to_string()).status(),
        RawStatus::INVALID_PARAM
    );
    assert_eq!(GpuError::OutOfMemory.status(), RawStatus::OUT_OF_MEMORY);
    assert_eq!(GpuError::DeviceNotFound.status(), RawStatus::GPU_NOT_FOUND);
    assert_eq!(
        GpuError::DeviceInitFailed("handshake".to_string()).status(),
        RawStatus::GPU_INIT_FAILED
    );
    assert_eq!(
        GpuError::ShaderCompile("syntax".to_string()).status(),
        RawStatus::SHADER_COMPILE_ERROR
    );
    assert_eq!(GpuError::BufferOverflow.status(), RawStatus::BUFFER_OVERFLOW);
    assert_eq!(
        GpuError::NotFound("file".to_string()).status(),
        RawStatus::NOT_FOUND
    );
    assert_eq!(
        GpuError::Backend("misc".to_string()).status(),
        RawStatus::ERROR
    );
}

#[test]
fn test_every_error_status_has_high_bit() {
    let errors = [
        GpuError::InvalidParam(String::new()),
        GpuError::NotSupported(String::new()),
        GpuError::OutOfMemory,
        GpuError::DeviceError(String::new()),
        GpuError::DeviceNotFound,
        GpuError::DeviceInitFailed(String::new()),
        GpuError::ShaderCompile(String::new()),
        GpuError::TextureError(String::new()),
        GpuError::BufferOverflow,
        GpuError::NotFound(String::new()),
        GpuError::AccessDenied(String::new()),
        GpuError::Filesystem(String::new()),
        GpuError::Timeout,
        GpuError::Backend(String::new()),
    ];
    for err in errors {
        assert!(err.status().is_error(), "no high bit for {:?}", err);
    }
}

// ============================================================================
// DISPLAY
// ============================================================================

#[test]
fn test_out_of_memory_display() {
    let err = GpuError::OutOfMemory;
    let display = format!("{}", err);
    assert_eq!(display, "Out of GPU memory");
}

#[test]
fn test_device_error_display() {
    let err = GpuError::DeviceError("begin_recording outside Initial".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Device error"));
    assert!(display.contains("begin_recording outside Initial"));
}

#[test]
fn test_shader_compile_display_carries_diagnostic() {
    let err = GpuError::ShaderCompile("entry point 'main' not found".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Shader compilation failed"));
    assert!(display.contains("entry point 'main' not found"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = GpuError::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_is_cloneable_and_comparable() {
    let err = GpuError::ShaderCompile("diag".to_string());
    let clone = err.clone();
    assert_eq!(err, clone);
}

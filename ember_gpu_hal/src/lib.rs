/*!
# Ember GPU HAL

Core traits and types for the Ember GPU hardware-abstraction layer.

This crate provides a uniform GPU API for pre-operating-system code
(bootloaders, firmware utilities) over heterogeneous vendor devices.
The core owns device selection, heap-backed resource lifetimes, shader
and pipeline-state management and the command-buffer state machine;
vendor backends only move bytes and execute recorded command streams.

## Architecture

- **Session**: owns the driver, the active device and every subsystem
- **GpuDriver / GpuDevice**: the backend traits vendor drivers implement
- **HeapAllocator**: capacity accounting over the device heaps
- **ResourceManager**: buffer/texture lifetimes and CPU mapping
- **ShaderStore / PipelineCache**: shader modules and cached PSOs
- **CommandBuffer / SubmissionEngine**: recording and fence tracking

Backend implementations provide concrete types behind the traits and
are selected at device-initialization time.
*/

// Internal modules
mod error;
mod helpers;
pub mod log;
pub mod command;
pub mod device;
pub mod external;
pub mod memory;
pub mod pipeline;
pub mod resource;
pub mod session;
pub mod shader;
pub mod submit;

// Main ember namespace module
pub mod ember {
    // Error types and raw status words
    pub use crate::error::{GpuError, RawStatus, Result};

    // Session and its configuration/diagnostics
    pub use crate::session::{Screenshot, Session, SessionConfig, SessionEvent};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
        pub use crate::log::{reset_logger, set_logger};
    }

    // Device sub-module: info types and the backend traits
    pub mod device {
        pub use crate::device::*;
    }

    // Memory sub-module
    pub mod memory {
        pub use crate::memory::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Shader sub-module
    pub mod shader {
        pub use crate::shader::*;
    }

    // Pipeline sub-module
    pub mod pipeline {
        pub use crate::pipeline::*;
    }

    // Command sub-module
    pub mod command {
        pub use crate::command::*;
    }

    // Submission sub-module
    pub mod submit {
        pub use crate::submit::*;
    }

    // Convenience helpers
    pub mod helpers {
        pub use crate::helpers::*;
    }

    // External collaborator seams
    pub mod external {
        pub use crate::external::*;
    }
}

// Re-export math library at crate root
pub use glam;

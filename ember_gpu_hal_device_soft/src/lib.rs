/*!
# Ember GPU HAL - Soft Device Backend

CPU-executed reference backend for the Ember GPU HAL.

This crate provides a virtual GPU that implements the ember_gpu_hal
backend traits entirely in host memory: byte-vector storage behind the
buffer/texture handles, a miniature deterministic shader translator,
and a command-stream executor that applies render-pass clears and
buffer copies and accounts draw/dispatch work.

It exists for pre-OS bring-up on machines without a supported adapter,
for firmware CI, and as the deterministic device under test for the
HAL's integration suites. Fences follow the pre-OS polling model:
completion is observed at the blocking wait points.
*/

// Soft device implementation modules
mod driver;
mod device;
mod executor;
mod stats;

pub use driver::SoftDriver;
pub use device::SoftDevice;
pub use executor::ExecStats;

// Re-export stats utilities
pub use stats::{exec_totals, print_exec_report, reset_exec_totals, ExecTotals};

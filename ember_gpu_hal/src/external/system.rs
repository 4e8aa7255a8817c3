/// System services collaborator
///
/// Frame pacing is the only system dependency of the GPU core; no GPU
/// operation depends on wall-clock time internally.

/// Minimal system services the HAL consumes
pub trait SystemServices: Send + Sync {
    /// Busy-wait or sleep for the given number of microseconds
    fn delay(&self, microseconds: u64);
}

/// Host-side implementation over `std::thread::sleep`
pub struct StdSystemServices;

impl SystemServices for StdSystemServices {
    fn delay(&self, microseconds: u64) {
        std::thread::sleep(std::time::Duration::from_micros(microseconds));
    }
}

/// No-op implementation for tests and batch tools
pub struct NullSystemServices;

impl SystemServices for NullSystemServices {
    fn delay(&self, _microseconds: u64) {}
}

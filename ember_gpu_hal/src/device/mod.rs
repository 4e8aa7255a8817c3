/// Device module - physical device description and backend traits

// Module declarations
pub mod info;
pub mod backend;

// Re-export everything
pub use info::*;
pub use backend::*;

// Mock backend for unit tests (no device required)
#[cfg(test)]
pub mod mock;

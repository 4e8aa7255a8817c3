/// Command module - command recording and the command-buffer state machine

// Module declarations
pub mod stream;
pub mod render_pass;
pub mod command_buffer;

// Re-export everything
pub use stream::*;
pub use render_pass::*;
pub use command_buffer::*;

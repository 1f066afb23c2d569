//! Record emission and output sinks.

pub mod emitter;
pub mod sink;

pub use emitter::Emitter;
pub use sink::open_output;

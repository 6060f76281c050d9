//! Plugin traits and interfaces

pub mod module;
pub mod processor;

// Re-export main types for convenience
pub use module::*;
pub use processor::*;

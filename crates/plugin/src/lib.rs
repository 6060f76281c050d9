//! Plugin capability interface for contentpipe
//!
//! A plugin module exposes importer and processor *types*. The registry never
//! introspects a module; it only calls the traits defined here.

pub mod traits;
pub mod value;

pub use traits::*;
pub use value::{Color, PropertyValue, ValueError, ValueKind};

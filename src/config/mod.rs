//! Manifest model: global build settings plus ordered content entries

pub mod content;
pub mod manifest;
pub mod settings;


// Re-export main types for convenience
pub use content::{BuildAction, ContentEntry, ContentList, MoveDirection};
pub use manifest::{Manifest, ManifestFormat};
pub use settings::{GraphicsProfile, ManifestSettings, TargetPlatform};

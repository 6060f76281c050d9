//! Plugin discovery for importers and processors

pub mod descriptor;
pub mod library;
pub mod loader;
pub mod registry;
pub mod testing;

pub use descriptor::*;
pub use library::PipelineLibrary;
pub use loader::{expand_references, DeclaredModule, ManifestModuleLoader, ModuleLoader};
pub use registry::*;
pub use testing::MemoryModuleLoader;

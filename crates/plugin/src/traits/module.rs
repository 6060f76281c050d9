//! Plugin module traits

use anyhow::{anyhow, Result};
use std::sync::Arc;

use super::processor::{ImporterMetadata, ProcessorInstance};

/// A loadable unit contributing importer and processor types
pub trait PluginModule: Send + Sync {
    /// Module name, used in diagnostics
    fn name(&self) -> &str;

    /// Every type the module exposes, in declaration order
    fn types(&self) -> Vec<Arc<dyn PluginType>>;
}

/// A single type exposed by a plugin module.
///
/// A type may advertise the importer capability, the processor capability,
/// both, or neither. Abstract types are skipped by discovery.
pub trait PluginType: Send + Sync {
    /// Unique type identifier
    fn type_name(&self) -> &str;

    /// Abstract types cannot be bound to content
    fn is_abstract(&self) -> bool {
        false
    }

    /// Whether this type advertises the importer capability
    fn describes_importer(&self) -> bool {
        false
    }

    /// Whether this type advertises the processor capability
    fn describes_processor(&self) -> bool {
        false
    }

    /// Declared importer metadata, if any.
    ///
    /// Returning `None` from an importer type makes discovery synthesize a
    /// descriptor that accepts any extension and has no default processor.
    fn importer_metadata(&self) -> Option<ImporterMetadata> {
        None
    }

    /// Declared processor display name, falls back to the type name
    fn processor_display_name(&self) -> Option<String> {
        None
    }

    /// Create a transient instance of the processor
    fn instantiate_processor(&self) -> Result<Box<dyn ProcessorInstance>> {
        Err(anyhow!("{} is not a processor", self.type_name()))
    }
}
